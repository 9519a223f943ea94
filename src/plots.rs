//! Density and box plots of sales by store.
//!
//! Both charts are rendered with [`plotters`] on the bitmap backend and saved
//! as PNG. Each store gets one colour from the 99-colour palette, in label
//! order, so the two charts agree.

use std::path::{Path, PathBuf};

use log::{debug, info};
use plotters::prelude::*;
use thiserror::Error;

use crate::config::PlotConfig;
use crate::data::StoreGroup;
use crate::distribution::{kde, BoxStats};

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

/// Grid points per density curve.
const KDE_POINTS: usize = 256;

/// Paths of the images written by [`write_plots`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFiles {
    pub density: PathBuf,
    pub boxplot: PathBuf,
}

/// Writes the density plot and the box plot described by `config`.
pub fn write_plots(groups: &[StoreGroup], config: &PlotConfig) -> Result<PlotFiles> {
    let size = (config.width, config.height);
    density_plot(groups, &config.density_path, size)?;
    box_plot(groups, &config.boxplot_path, size)?;
    info!(
        "plots written to {} and {}",
        config.density_path.display(),
        config.boxplot_path.display()
    );
    Ok(PlotFiles {
        density: config.density_path.clone(),
        boxplot: config.boxplot_path.clone(),
    })
}

/// Expands `[lo, hi]` by `fraction` of its width on each side; a degenerate
/// range becomes `[lo − 1, hi + 1]`.
fn padded_range(lo: f64, hi: f64, fraction: f64) -> (f64, f64) {
    let width = hi - lo;
    if width > 0.0 {
        (lo - fraction * width, hi + fraction * width)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

fn sales_range(groups: &[StoreGroup]) -> Option<(f64, f64)> {
    let values = groups.iter().flat_map(|g| g.values.iter().copied());
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (lo <= hi).then_some((lo, hi))
}

/// Per-store KDE curves over a shared grid, each normalised on its own.
///
/// Stores with fewer than 2 observations or no spread have no curve.
fn density_curves(groups: &[StoreGroup], lo: f64, hi: f64) -> Vec<(usize, Vec<(f64, f64)>)> {
    groups
        .iter()
        .enumerate()
        .filter_map(|(i, g)| match kde(&g.values, lo, hi, KDE_POINTS) {
            Some(r) => Some((i, r.x.into_iter().zip(r.density).collect())),
            None => {
                debug!("no density curve for '{}'", g.store);
                None
            }
        })
        .collect()
}

fn prepare_output(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(std::fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

fn store_colour(index: usize) -> RGBAColor {
    Palette99::pick(index).to_rgba()
}

/// Filled kernel density curve of sales for every store.
pub fn density_plot(groups: &[StoreGroup], output_path: &Path, size: (u32, u32)) -> Result<()> {
    let (lo, hi) = sales_range(groups)
        .ok_or_else(|| PlotError::InvalidData("no sales to plot".to_string()))?;
    let (x_lo, x_hi) = padded_range(lo, hi, 0.15);
    let curves = density_curves(groups, x_lo, x_hi);
    if curves.is_empty() {
        return Err(PlotError::InvalidData(
            "no store has enough spread for a density estimate".to_string(),
        ));
    }
    let y_max = curves
        .iter()
        .flat_map(|(_, c)| c.iter().map(|&(_, y)| y))
        .fold(0.0, f64::max);

    prepare_output(output_path)?;
    let drawing_area = BitMapBackend::new(output_path, size).into_drawing_area();
    drawing_area
        .fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&drawing_area)
        .caption(
            "Distribución de Ventas por Supermercado (Gráfico de Densidad)",
            ("sans-serif", 32),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_max * 1.1)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Ventas")
        .y_desc("Densidad")
        .label_style(("sans-serif", 20))
        .y_label_formatter(&|y| format!("{y:.2e}"))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for (index, curve) in curves {
        let colour = store_colour(index);
        chart
            .draw_series(
                AreaSeries::new(curve, 0.0, colour.mix(0.3)).border_style(colour.stroke_width(2)),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(groups[index].store.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 18, y + 6)], colour.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 20))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    drawing_area
        .present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Box-and-whisker plot of sales per store, stores along the x axis.
///
/// Whiskers reach the furthest observation within 1.5·IQR; observations
/// beyond are drawn as points.
pub fn box_plot(groups: &[StoreGroup], output_path: &Path, size: (u32, u32)) -> Result<()> {
    let boxes: Vec<(usize, BoxStats)> = groups
        .iter()
        .enumerate()
        .filter_map(|(i, g)| BoxStats::from_values(&g.values).map(|b| (i, b)))
        .collect();
    if boxes.is_empty() {
        return Err(PlotError::InvalidData("no sales to plot".to_string()));
    }
    let (lo, hi) = sales_range(groups)
        .ok_or_else(|| PlotError::InvalidData("no sales to plot".to_string()))?;
    let (y_lo, y_hi) = padded_range(lo, hi, 0.05);
    let k = groups.len();

    prepare_output(output_path)?;
    let drawing_area = BitMapBackend::new(output_path, size).into_drawing_area();
    drawing_area
        .fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&drawing_area)
        .caption(
            "Comparación de Ventas por Supermercado (Gráfico de Cajas)",
            ("sans-serif", 32),
        )
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(85)
        .build_cartesian_2d(-0.5..(k as f64 - 0.5), y_lo..y_hi)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let store_label = |x: &f64| store_at(groups, *x).unwrap_or_default();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2 * k + 1)
        .x_label_formatter(&store_label)
        .x_desc("Supermercado")
        .y_desc("Ventas")
        .label_style(("sans-serif", 20))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    const HALF_WIDTH: f64 = 0.3;
    for (index, b) in &boxes {
        let x = *index as f64;
        let colour = store_colour(*index);

        chart
            .draw_series([
                Rectangle::new([(x - HALF_WIDTH, b.q1), (x + HALF_WIDTH, b.q3)], colour.mix(0.6).filled()),
                Rectangle::new([(x - HALF_WIDTH, b.q1), (x + HALF_WIDTH, b.q3)], BLACK.stroke_width(1)),
            ])
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        let cap = HALF_WIDTH / 2.0;
        chart
            .draw_series(
                [
                    vec![(x - HALF_WIDTH, b.median), (x + HALF_WIDTH, b.median)],
                    vec![(x, b.q3), (x, b.upper_whisker)],
                    vec![(x, b.q1), (x, b.lower_whisker)],
                    vec![(x - cap, b.upper_whisker), (x + cap, b.upper_whisker)],
                    vec![(x - cap, b.lower_whisker), (x + cap, b.lower_whisker)],
                ]
                .into_iter()
                .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        chart
            .draw_series(
                b.outliers
                    .iter()
                    .map(|&v| Circle::new((x, v), 4, BLACK.stroke_width(1))),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    drawing_area
        .present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Store label for an x-axis position that falls on a store's slot.
fn store_at(groups: &[StoreGroup], x: f64) -> Option<String> {
    let slot = x.round();
    if (x - slot).abs() > 1e-6 || slot < 0.0 {
        return None;
    }
    groups.get(slot as usize).map(|g| g.store.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(store: &str, values: &[f64]) -> StoreGroup {
        StoreGroup {
            store: store.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn padded_range_handles_degenerate_input() {
        assert_eq!(padded_range(10.0, 20.0, 0.1), (9.0, 21.0));
        assert_eq!(padded_range(5.0, 5.0, 0.1), (4.0, 6.0));
    }

    #[test]
    fn sales_range_spans_all_groups() {
        let groups = vec![group("a", &[3.0, 7.0]), group("b", &[-1.0, 4.0])];
        assert_eq!(sales_range(&groups), Some((-1.0, 7.0)));
        assert_eq!(sales_range(&[group("a", &[])]), None);
    }

    #[test]
    fn density_curves_skip_flat_stores() {
        let groups = vec![
            group("a", &[1.0, 2.0, 3.0, 2.5]),
            group("b", &[5.0, 5.0, 5.0]),
            group("c", &[4.0, 6.0, 5.0]),
        ];
        let curves = density_curves(&groups, 0.0, 8.0);
        let indices: Vec<usize> = curves.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(curves[0].1.len(), KDE_POINTS);
        assert!(curves[0].1.iter().all(|&(_, y)| y >= 0.0));
    }

    #[test]
    fn axis_labels_only_on_store_slots() {
        let groups = vec![group("Norte", &[1.0]), group("Sur", &[2.0])];
        assert_eq!(store_at(&groups, 0.0).as_deref(), Some("Norte"));
        assert_eq!(store_at(&groups, 1.0).as_deref(), Some("Sur"));
        assert_eq!(store_at(&groups, 0.5), None);
        assert_eq!(store_at(&groups, -0.5), None);
        assert_eq!(store_at(&groups, 2.0), None);
    }

    #[test]
    fn empty_input_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = density_plot(&[], &dir.path().join("d.png"), (400, 300)).unwrap_err();
        assert!(matches!(err, PlotError::InvalidData(_)));
        let err = box_plot(&[], &dir.path().join("b.png"), (400, 300)).unwrap_err();
        assert!(matches!(err, PlotError::InvalidData(_)));
    }

    #[test]
    fn density_needs_spread() {
        let dir = tempfile::tempdir().expect("tempdir");
        let groups = vec![group("a", &[1.0, 1.0]), group("b", &[2.0])];
        let err = density_plot(&groups, &dir.path().join("d.png"), (400, 300)).unwrap_err();
        assert!(matches!(err, PlotError::InvalidData(_)));
    }
}
