//! The analysis run: load, check assumptions, plot, test, compare, report.
//!
//! [`analyze`] does the statistics on an already loaded table and has no
//! side effects. [`run_analysis`] adds loading, the plot files and the
//! written report; [`run_workbook`] opens the configured workbook file.

use std::io::Write;

use log::{debug, info, warn};

use crate::anova::{anova_type2, AnovaResult};
use crate::config::AnalysisConfig;
use crate::data::{load_sales, ExcelWorkbook, GroupStatistics, SalesTable, WorkbookSource};
use crate::error::{AnalysisError, Result};
use crate::extremes::{compare_extremes, rank_stores, ExtremesComparison};
use crate::interval::{monthly_intervals, MonthlyInterval};
use crate::plots::{write_plots, PlotFiles};
use crate::posthoc::{tukey_hsd, TukeyHsd};
use crate::regression::{fit_one_factor, FactorFit};
use crate::report;
use crate::testing::{levene_test, shapiro_wilk_test, ShapiroWilkResult, TestResult};

/// Residuals whose range is below this fraction of the largest |sales| are
/// rounding noise of an exact fit.
const RESIDUAL_NOISE_REL: f64 = 1e-9;

/// What happened to the two chart files.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotStatus {
    Disabled,
    Written(PlotFiles),
    /// Rendering failed; the analysis went on without the charts.
    Failed(String),
}

/// Monthly intervals for the reference store.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthlyReport {
    /// No reference store configured.
    NotRequested,
    /// The workbook has no sheet with the reference store's name.
    StoreMissing(String),
    Computed {
        store: String,
        months: Vec<MonthlyInterval>,
        /// Records left out because their date could not be read.
        undated: usize,
    },
}

/// Everything one run computed, in report order.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub table: SalesTable,
    pub alpha: f64,
    pub confidence_levels: Vec<f64>,
    /// Per-store summary, sorted by store label.
    pub store_stats: Vec<(String, GroupStatistics)>,
    /// Brown-Forsythe test; `None` when not computable.
    pub levene: Option<TestResult>,
    /// Shapiro-Wilk on the model residuals; `None` when not computable.
    pub shapiro: Option<ShapiroWilkResult>,
    pub plots: PlotStatus,
    /// `None` with fewer than 2 stores or no residual degrees of freedom.
    pub anova: Option<AnovaResult>,
    /// Present only when the ANOVA rejected equal means.
    pub tukey: Option<TukeyHsd>,
    pub monthly: MonthlyReport,
    pub extremes: Option<ExtremesComparison>,
}

impl AnalysisOutcome {
    pub fn store_count(&self) -> usize {
        self.store_stats.len()
    }

    /// `true` iff the ANOVA p-value is strictly below alpha.
    pub fn significant(&self) -> bool {
        self.anova.is_some_and(|a| a.rejects_null(self.alpha))
    }
}

/// Runs every statistical step on a loaded table.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] if the table has no records.
pub fn analyze(table: SalesTable, config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    if table.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "No quedan datos después de eliminar los nulos. No se puede realizar ANOVA.".to_string(),
        ));
    }
    let alpha = config.alpha;

    let groups = table.groups();
    let store_stats: Vec<(String, GroupStatistics)> = groups
        .iter()
        .filter_map(|g| GroupStatistics::from_values(&g.values).map(|s| (g.store.clone(), s)))
        .collect();
    if store_stats.len() < 2 {
        warn!("only {} store(s) with data; ANOVA needs two", store_stats.len());
    }

    let slices: Vec<&[f64]> = groups.iter().map(|g| g.values.as_slice()).collect();
    let levene = levene_test(&slices);
    if levene.is_none() {
        debug!("Levene test not computable");
    }

    let fit = {
        let (y, labels) = table.columns();
        fit_one_factor(&y, &labels)
    };
    let shapiro = fit.as_ref().and_then(residual_normality);
    let anova = fit.as_ref().and_then(anova_type2);

    let significant = anova.is_some_and(|a| a.rejects_null(alpha));
    let tukey = if significant {
        let labelled: Vec<(&str, &[f64])> = groups
            .iter()
            .map(|g| (g.store.as_str(), g.values.as_slice()))
            .collect();
        let hsd = tukey_hsd(&labelled, alpha);
        if hsd.is_none() {
            warn!("Tukey HSD not computable");
        }
        hsd
    } else {
        None
    };

    let monthly = monthly_report(&table, config);
    let extremes = compare_extremes(rank_stores(&groups), significant, tukey.as_ref(), alpha);

    if let Some(a) = &anova {
        info!("ANOVA F = {:.4}, p = {:.4e}", a.f_statistic, a.p_value);
    }

    Ok(AnalysisOutcome {
        table,
        alpha,
        confidence_levels: config.confidence_levels.clone(),
        store_stats,
        levene,
        shapiro,
        plots: PlotStatus::Disabled,
        anova,
        tukey,
        monthly,
        extremes,
    })
}

/// Shapiro-Wilk on the residuals, unless they are only rounding noise.
fn residual_normality(fit: &FactorFit) -> Option<ShapiroWilkResult> {
    let (lo, hi) = fit
        .residuals
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| (lo.min(r), hi.max(r)));
    let scale = fit
        .fitted
        .iter()
        .zip(&fit.residuals)
        .map(|(f, r)| (f + r).abs())
        .fold(0.0, f64::max);
    if hi - lo <= RESIDUAL_NOISE_REL * scale {
        debug!("residuals are constant; normality test skipped");
        return None;
    }
    let result = shapiro_wilk_test(&fit.residuals)?;
    if result.approximate_p {
        warn!(
            "{} residuals exceed the calibrated range of the normality test; p-value is approximate",
            fit.residuals.len()
        );
    }
    Some(result)
}

fn monthly_report(table: &SalesTable, config: &AnalysisConfig) -> MonthlyReport {
    let Some(store) = config.reference_store.as_deref() else {
        return MonthlyReport::NotRequested;
    };
    if !table.sheets().iter().any(|s| s == store) {
        warn!("reference store '{store}' not found");
        return MonthlyReport::StoreMissing(store.to_string());
    }
    let months = monthly_intervals(&table.monthly(store), &config.confidence_levels);
    MonthlyReport::Computed {
        store: store.to_string(),
        months,
        undated: table.undated(store),
    }
}

/// Loads `source`, analyses it, writes the charts and the report.
///
/// A chart that cannot be rendered is logged and recorded in
/// [`AnalysisOutcome::plots`]; it does not stop the run.
///
/// # Errors
///
/// - [`AnalysisError::Config`] for an invalid configuration
/// - load errors from [`load_sales`]
/// - [`AnalysisError::InsufficientData`] when no sales remain
/// - [`AnalysisError::Io`] when the report cannot be written
pub fn run_analysis<S: WorkbookSource, W: Write>(
    source: &mut S,
    config: &AnalysisConfig,
    out: &mut W,
) -> Result<AnalysisOutcome> {
    config.validate()?;
    let table = load_sales(source, config.has_header)?;
    info!("{} record(s) loaded", table.len());

    let mut outcome = analyze(table, config)?;

    if config.plots.enabled {
        outcome.plots = match write_plots(&outcome.table.groups(), &config.plots) {
            Ok(files) => PlotStatus::Written(files),
            Err(e) => {
                warn!("plots not written: {e}");
                PlotStatus::Failed(e.to_string())
            }
        };
    }

    report::render(&outcome, out)?;
    Ok(outcome)
}

/// Opens the configured workbook and runs [`run_analysis`] on it.
pub fn run_workbook<W: Write>(config: &AnalysisConfig, out: &mut W) -> Result<AnalysisOutcome> {
    config.validate()?;
    let mut workbook = ExcelWorkbook::open(&config.workbook)?;
    run_analysis(&mut workbook, config, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SalesRecord;
    use chrono::NaiveDate;

    fn config() -> AnalysisConfig {
        let mut c = AnalysisConfig::default();
        c.plots.enabled = false;
        c
    }

    fn table(rows: &[(&str, u32, f64)]) -> SalesTable {
        let records = rows
            .iter()
            .map(|&(store, day, sales)| SalesRecord {
                date: NaiveDate::from_ymd_opt(2024, 1 + (day - 1) / 28, 1 + (day - 1) % 28),
                sales,
                store: store.to_string(),
            })
            .collect();
        let mut sheets: Vec<String> = rows.iter().map(|r| r.0.to_string()).collect();
        sheets.dedup();
        SalesTable::new(records, sheets, 0)
    }

    #[test]
    fn empty_table_is_insufficient() {
        let err = analyze(SalesTable::default(), &config()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn identical_stores_skip_posthoc() {
        let rows: Vec<(&str, u32, f64)> = ["A", "B", "C"]
            .iter()
            .flat_map(|&s| (1..=5).map(move |d| (s, d, 100.0)))
            .collect();
        let out = analyze(table(&rows), &config()).expect("analyze");
        let a = out.anova.expect("anova");
        assert_eq!(a.f_statistic, 0.0);
        assert_eq!(a.p_value, 1.0);
        assert!(!out.significant());
        assert!(out.tukey.is_none());
        assert!(out.shapiro.is_none());
        assert!(out.levene.is_some());
    }

    #[test]
    fn single_store_has_no_anova() {
        let rows: Vec<(&str, u32, f64)> = (1..=6).map(|d| ("Solo", d, d as f64)).collect();
        let out = analyze(table(&rows), &config()).expect("analyze");
        assert_eq!(out.store_count(), 1);
        assert!(out.anova.is_none());
        assert!(out.levene.is_none());
        assert!(!out.significant());
    }

    #[test]
    fn significant_difference_runs_tukey() {
        let mut rows = Vec::new();
        for d in 1..=8 {
            let noise = (d % 3) as f64;
            rows.push(("Alto", d, 500.0 + noise));
            rows.push(("Bajo", d, 100.0 + noise));
            rows.push(("Medio", d, 300.0 + noise * 2.0));
        }
        let out = analyze(table(&rows), &config()).expect("analyze");
        assert!(out.significant());
        let hsd = out.tukey.as_ref().expect("tukey");
        assert_eq!(hsd.pairs.len(), 3);
        let ext = out.extremes.expect("extremes");
        assert_eq!(ext.top.store, "Alto");
        assert_eq!(ext.bottom.store, "Bajo");
    }

    #[test]
    fn missing_reference_store_is_reported() {
        let rows = [("A", 1, 1.0), ("A", 2, 2.0), ("B", 1, 3.0), ("B", 2, 5.0)];
        let out = analyze(table(&rows), &config()).expect("analyze");
        assert_eq!(out.monthly, MonthlyReport::StoreMissing("Santa Ana".to_string()));

        let mut c = config();
        c.reference_store = None;
        let out = analyze(table(&rows), &c).expect("analyze");
        assert_eq!(out.monthly, MonthlyReport::NotRequested);
    }

    #[test]
    fn reference_store_months() {
        let rows = [
            ("Santa Ana", 1, 10.0),
            ("Santa Ana", 2, 12.0),
            ("Santa Ana", 29, 20.0),
            ("Otra", 1, 5.0),
            ("Otra", 2, 6.0),
        ];
        let out = analyze(table(&rows), &config()).expect("analyze");
        match out.monthly {
            MonthlyReport::Computed { store, months, undated } => {
                assert_eq!(store, "Santa Ana");
                assert_eq!(undated, 0);
                assert_eq!(months.len(), 2);
                assert!(months[0].has_interval());
                assert!(!months[1].has_interval());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
