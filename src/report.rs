//! Console report of an analysis run, in Spanish.
//!
//! Sections, in order:
//!
//! 0. data loading, 1. hypotheses, 2. assumption checks, 3. charts,
//! 4. ANOVA table, 5. Tukey HSD, 6. monthly intervals for the reference
//! store, 7. highest vs lowest store.

use std::io::{self, Write};

use comfy_table::{presets::ASCII_MARKDOWN, Cell, CellAlignment, ContentArrangement, Row, Table};

use crate::extremes::{ExtremesComparison, ExtremesVerdict};
use crate::interval::{MonthlyEstimate, MonthlyInterval};
use crate::pipeline::{AnalysisOutcome, MonthlyReport, PlotStatus};
use crate::testing::SW_MAX_EXACT_N;

const FACTOR_ROW: &str = "C(Supermercado)";
const PREVIEW_ROWS: usize = 5;

/// Writes the full report for `outcome`.
pub fn render<W: Write>(outcome: &AnalysisOutcome, out: &mut W) -> io::Result<()> {
    loading(outcome, out)?;
    hypotheses(outcome.alpha, out)?;
    assumptions(outcome, out)?;
    charts(&outcome.plots, out)?;
    anova(outcome, out)?;
    post_hoc(outcome, out)?;
    monthly(&outcome.monthly, out)?;
    if let Some(ext) = &outcome.extremes {
        extremes(ext, outcome.alpha, out)?;
    }
    Ok(())
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// `1234567.891` → `$1,234,567.89`.
pub fn money(value: f64) -> String {
    if !value.is_finite() {
        return format!("${value}");
    }
    let text = format!("{:.2}", value.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

/// `0.95` → `95`, `0.999` → `99.9`.
fn percent(fraction: f64) -> String {
    let p = (fraction * 100.0 * 1e6).round() / 1e6;
    format!("{p}")
}

fn loading<W: Write>(o: &AnalysisOutcome, out: &mut W) -> io::Result<()> {
    writeln!(out, "--- 0. CARGANDO Y PREPARANDO DATOS ---")?;
    writeln!(out, "Datos cargados correctamente.")?;
    if o.table.dropped_missing() > 0 {
        writeln!(
            out,
            "Advertencia: se eliminaron {} fila(s) con ventas nulas.",
            o.table.dropped_missing()
        )?;
    }
    writeln!(out, "Datos combinados de ventas de {} supermercados.", o.store_count())?;
    writeln!(out, "Primeras filas de datos combinados:")?;
    let mut table = new_table(&["Fecha", "Ventas", "Supermercado"]);
    for r in o.table.head(PREVIEW_ROWS) {
        let date = r.date.map_or_else(|| "NaT".to_string(), |d| d.to_string());
        table.add_row(vec![Cell::new(date), right(format!("{:.2}", r.sales)), Cell::new(&r.store)]);
    }
    writeln!(out, "{table}")?;

    writeln!(out, "\nResumen por supermercado:")?;
    let mut table = new_table(&["Supermercado", "N", "Media", "Desviación estándar"]);
    for (store, s) in &o.store_stats {
        let sd = s.std_dev.map_or_else(|| "NaN".to_string(), money);
        table.add_row(vec![
            Cell::new(store),
            right(s.count.to_string()),
            right(money(s.mean)),
            right(sd),
        ]);
    }
    writeln!(out, "{table}\n")
}

fn hypotheses<W: Write>(alpha: f64, out: &mut W) -> io::Result<()> {
    writeln!(out, "--- 1. PLANTEAMIENTO DEL ANÁLISIS ANOVA ---")?;
    writeln!(out, "H_0: Las medias de ventas de todos los supermercados son iguales.")?;
    writeln!(out, "H_1: Al menos una media de ventas es diferente.")?;
    writeln!(out, "Nivel de significancia alpha = {alpha}\n")
}

fn assumptions<W: Write>(o: &AnalysisOutcome, out: &mut W) -> io::Result<()> {
    writeln!(out, "--- 2. VERIFICACIÓN DE REQUISITOS DEL ANOVA ---")?;
    writeln!(
        out,
        "a) Independencia: Se asume que las observaciones son independientes por el diseño del estudio."
    )?;

    writeln!(out, "\nb) Prueba de Homogeneidad de Varianzas (Levene):")?;
    match &o.levene {
        Some(t) => {
            writeln!(out, "   Estadístico = {:.4}", t.statistic)?;
            writeln!(out, "   p-valor = {:.4}", t.p_value)?;
            if t.p_value > o.alpha {
                writeln!(out, "   Conclusión: Se cumple el requisito de homogeneidad de varianzas.")?;
            } else {
                writeln!(out, "   Conclusión: NO se cumple el requisito de homogeneidad de varianzas.")?;
            }
        }
        None => writeln!(
            out,
            "   No se puede calcular (se necesitan al menos dos supermercados con dos observaciones cada uno)."
        )?,
    }

    writeln!(out, "\nc) Prueba de Normalidad de los Residuos (Shapiro-Wilk):")?;
    match &o.shapiro {
        Some(t) => {
            writeln!(out, "   W = {:.4}", t.w)?;
            writeln!(out, "   p-valor = {:.4}", t.p_value)?;
            if t.approximate_p {
                writeln!(
                    out,
                    "   Advertencia: con más de {SW_MAX_EXACT_N} residuos el p-valor puede no ser exacto."
                )?;
            }
            if t.p_value > o.alpha {
                writeln!(out, "   Conclusión: Se cumple el requisito de normalidad.")?;
            } else {
                writeln!(out, "   Conclusión: NO se cumple el requisito de normalidad.")?;
            }
        }
        None => writeln!(
            out,
            "   No se puede calcular (residuos constantes o menos de tres observaciones)."
        )?,
    }
    writeln!(out)
}

fn charts<W: Write>(plots: &PlotStatus, out: &mut W) -> io::Result<()> {
    writeln!(out, "--- 3. GENERANDO GRÁFICOS DE LAS DISTRIBUCIONES ---")?;
    match plots {
        PlotStatus::Written(files) => {
            writeln!(
                out,
                "Gráficos '{}' y '{}' guardados.",
                files.density.display(),
                files.boxplot.display()
            )?;
            writeln!(out, "Estos gráficos ayudan a visualizar las diferencias y la forma de los datos,")?;
            writeln!(out, "especialmente útil si no se cumplió el supuesto de normalidad.\n")
        }
        PlotStatus::Failed(reason) => {
            writeln!(out, "Advertencia: no se pudieron generar los gráficos ({reason}).\n")
        }
        PlotStatus::Disabled => writeln!(out, "Gráficos desactivados.\n"),
    }
}

fn anova<W: Write>(o: &AnalysisOutcome, out: &mut W) -> io::Result<()> {
    writeln!(out, "--- 4. TABLA ANOVA Y RESULTADO DEL CONTRASTE ---")?;
    if o.store_count() < 2 {
        return writeln!(out, "Se necesitan al menos dos supermercados para realizar ANOVA.\n");
    }
    let Some(a) = &o.anova else {
        return writeln!(
            out,
            "No se puede calcular la tabla ANOVA: no quedan grados de libertad residuales.\n"
        );
    };

    let mut table = new_table(&["", "sum_sq", "df", "F", "PR(>F)"]);
    table.add_row(vec![
        Cell::new(FACTOR_ROW),
        right(format!("{:.6e}", a.ss_between)),
        right(format!("{:.1}", a.df_between as f64)),
        right(format!("{:.6}", a.f_statistic)),
        right(format!("{:.6e}", a.p_value)),
    ]);
    table.add_row(vec![
        Cell::new("Residual"),
        right(format!("{:.6e}", a.ss_within)),
        right(format!("{:.1}", a.df_within as f64)),
        right("NaN".to_string()),
        right("NaN".to_string()),
    ]);
    writeln!(out, "{table}")?;

    writeln!(out, "\nConclusión del Contraste ANOVA:")?;
    if a.rejects_null(o.alpha) {
        writeln!(out, "   El p-valor ({:.4e}) es menor que alpha. SE RECHAZA H_0.", a.p_value)?;
        writeln!(
            out,
            "   Existen diferencias estadísticamente significativas en las ventas medias de al menos un supermercado."
        )?;
    } else {
        writeln!(out, "   El p-valor ({:.4e}) es mayor que alpha. NO se rechaza H_0.", a.p_value)?;
        writeln!(out, "   No hay evidencia de diferencias significativas en las ventas medias.")?;
    }
    writeln!(out)
}

fn post_hoc<W: Write>(o: &AnalysisOutcome, out: &mut W) -> io::Result<()> {
    if !o.significant() {
        return writeln!(out, "--- 5. NO SE REQUIERE ANÁLISIS POST-HOC ---\n");
    }
    writeln!(out, "--- 5. CONTRASTE A POSTERIORI (TUKEY HSD) ---")?;
    writeln!(out, "Buscando qué grupos específicos son diferentes entre sí...")?;
    let Some(hsd) = &o.tukey else {
        return writeln!(
            out,
            "No se puede calcular Tukey HSD: se necesitan al menos dos grados de libertad residuales.\n"
        );
    };

    writeln!(out, "Multiple Comparison of Means - Tukey HSD, FWER={}", hsd.alpha)?;
    let mut table = new_table(&["group1", "group2", "meandiff", "p-adj", "lower", "upper", "reject"]);
    for p in &hsd.pairs {
        let mut row = Row::new();
        row.add_cell(Cell::new(&p.group1))
            .add_cell(Cell::new(&p.group2))
            .add_cell(right(format!("{:.4}", p.mean_diff)))
            .add_cell(right(format!("{:.4}", p.p_adj)))
            .add_cell(right(format!("{:.4}", p.lower)))
            .add_cell(right(format!("{:.4}", p.upper)))
            .add_cell(Cell::new(if p.reject { "True" } else { "False" }));
        table.add_row(row);
    }
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "\nLa tabla de Tukey HSD muestra los pares de supermercados con diferencias significativas ('reject'=True)."
    )?;
    writeln!(
        out,
        "Esto permite identificar qué tiendas tienen un rendimiento de ventas significativamente distinto a otras.\n"
    )
}

fn monthly<W: Write>(report: &MonthlyReport, out: &mut W) -> io::Result<()> {
    match report {
        MonthlyReport::NotRequested => {
            writeln!(out, "--- 6. INTERVALOS DE CONFIANZA EMPÍRICOS ---")?;
            writeln!(out, "No se indicó una tienda de referencia; se omiten los intervalos.\n")
        }
        MonthlyReport::StoreMissing(store) => {
            writeln!(out, "--- 6. INTERVALOS DE CONFIANZA EMPÍRICOS PARA '{store}' ---")?;
            writeln!(out, "La hoja '{store}' no se encontró en el archivo.\n")
        }
        MonthlyReport::Computed {
            store,
            months,
            undated,
        } => {
            writeln!(out, "--- 6. INTERVALOS DE CONFIANZA EMPÍRICOS PARA '{store}' ---")?;
            if *undated > 0 {
                writeln!(
                    out,
                    "Advertencia: {undated} registro(s) sin fecha válida se excluyen de los intervalos."
                )?;
            }
            writeln!(out, "\nEstadísticas mensuales de ventas (agrupadas por mes):")?;
            let mut table =
                new_table(&["AñoMes", "Media_Ventas", "Desviacion_Estandar", "N_Observaciones"]);
            for m in months {
                let sd = m.stats.std_dev.map_or_else(|| "NaN".to_string(), |s| format!("{s:.6}"));
                table.add_row(vec![
                    Cell::new(m.period.to_string()),
                    right(format!("{:.6}", m.stats.mean)),
                    right(sd),
                    right(m.stats.count.to_string()),
                ]);
            }
            writeln!(out, "{table}")?;
            writeln!(out, "{}", "-".repeat(50))?;
            for m in months {
                month_block(m, out)?;
            }
            writeln!(out)
        }
    }
}

fn month_block<W: Write>(m: &MonthlyInterval, out: &mut W) -> io::Result<()> {
    match &m.estimate {
        MonthlyEstimate::Intervals { intervals, .. } => {
            writeln!(out, "Mes: {}", m.period)?;
            writeln!(out, "  Ventas Promedio: {}", money(m.stats.mean))?;
            writeln!(out, "  Nº de Días de Venta: {}", m.stats.count)?;
            if let Some(sd) = m.stats.std_dev {
                writeln!(out, "  Desviación Estándar (Ventas Diarias): {}", money(sd))?;
            }
            for ci in intervals {
                writeln!(
                    out,
                    "  IC {}%: [{}, {}]",
                    percent(ci.level),
                    money(ci.lower),
                    money(ci.upper)
                )?;
            }
        }
        MonthlyEstimate::InsufficientData => {
            writeln!(
                out,
                "Mes: {} - No hay suficientes datos ({} observaciones) o la desviación estándar es nula para calcular el IC. Se necesitan al menos 2 días de venta por mes.",
                m.period, m.stats.count
            )?;
        }
    }
    writeln!(out, "{}", "-".repeat(30))
}

fn extremes<W: Write>(e: &ExtremesComparison, alpha: f64, out: &mut W) -> io::Result<()> {
    writeln!(out, "--- 7. COMPARACIÓN DE LA TIENDA CON MAYOR Y MENOR PROMEDIO DE VENTAS ---")?;
    writeln!(out, "Promedio de ventas por supermercado:")?;
    let mut table = new_table(&["Supermercado", "Ventas"]);
    for m in &e.ranking {
        table.add_row(vec![Cell::new(&m.store), right(format!("{:.6}", m.mean))]);
    }
    writeln!(out, "{table}")?;

    let (top, bottom) = (&e.top.store, &e.bottom.store);
    writeln!(out, "\nTienda con mayor promedio de ventas: '{top}' ({})", money(e.top.mean))?;
    writeln!(out, "Tienda con menor promedio de ventas: '{bottom}' ({})", money(e.bottom.mean))?;

    match &e.verdict {
        ExtremesVerdict::NotPerformed => writeln!(
            out,
            "\nEl ANOVA no encontró diferencias significativas, por lo que una prueba post-hoc directa entre las tiendas con mayor y menor promedio no es estadísticamente necesaria para confirmar una diferencia global. Las diferencias observadas son probablemente debidas al azar."
        )?,
        ExtremesVerdict::NotFound => {
            writeln!(
                out,
                "\nNo se encontró una comparación directa entre '{top}' y '{bottom}' en los resultados de Tukey HSD."
            )?;
            writeln!(out, "Esto es inusual si ambas tiendas están en el dataset. Verifique los nombres.")?;
        }
        ExtremesVerdict::Compared {
            mean_diff,
            p_adj,
            significant,
        } => {
            writeln!(out, "\nComparación específica entre '{top}' y '{bottom}':")?;
            writeln!(out, "  Diferencia de medias: {}", money(*mean_diff))?;
            writeln!(out, "  P-value (Tukey HSD): {p_adj:.4}")?;
            if *significant {
                writeln!(
                    out,
                    "La diferencia entre las ventas de la tienda con mayor y menor promedio es estadísticamente significativa."
                )?;
                writeln!(
                    out,
                    "Esto sugiere que '{bottom}' realmente tiene ventas peores y podría necesitar más atención."
                )?;
            } else {
                writeln!(
                    out,
                    "La diferencia entre las ventas de la tienda con mayor y menor promedio NO es estadísticamente significativa (alpha = {alpha})."
                )?;
                writeln!(out, "Las diferencias observadas podrían ser debidas al azar.")?;
            }
        }
    }
    writeln!(out)
}
