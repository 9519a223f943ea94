//! Run configuration.
//!
//! Every constant of an analysis run (workbook path, significance level,
//! reference store, interval levels, plot files) lives here instead of in
//! the pipeline. Defaults reproduce the classic single-workbook setup, so an
//! empty TOML file is a valid configuration.
//!
//! # Examples
//!
//! ```
//! use u_anova::AnalysisConfig;
//!
//! let cfg = AnalysisConfig::from_toml_str("alpha = 0.01\nreference_store = \"Norte\"").unwrap();
//! assert_eq!(cfg.alpha, 0.01);
//! assert_eq!(cfg.reference_store.as_deref(), Some("Norte"));
//! assert_eq!(cfg.confidence_levels, vec![0.95, 0.99]);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

pub const DEFAULT_WORKBOOK: &str = "Datos_examen_final_21Co20258_a2119.xlsx";
pub const DEFAULT_REFERENCE_STORE: &str = "Santa Ana";
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Workbook with one sheet per store.
    pub workbook: PathBuf,
    /// Significance level for every test of the run.
    pub alpha: f64,
    /// Store whose monthly confidence intervals are reported. `None` skips
    /// the interval section.
    pub reference_store: Option<String>,
    /// Two-sided confidence levels for the monthly intervals.
    pub confidence_levels: Vec<f64>,
    /// Whether the first row of every sheet is a header row.
    pub has_header: bool,
    pub plots: PlotConfig,
}

/// Output settings for the two distribution plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    pub density_path: PathBuf,
    pub boxplot_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            alpha: DEFAULT_ALPHA,
            reference_store: Some(DEFAULT_REFERENCE_STORE.to_string()),
            confidence_levels: vec![0.95, 0.99],
            has_header: true,
            plots: PlotConfig::default(),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            density_path: PathBuf::from("grafico_densidad_ventas.png"),
            boxplot_path: PathBuf::from("boxplot_ventas.png"),
            width: 1200,
            height: 700,
        }
    }
}

impl AnalysisConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AnalysisError::Config(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        for &level in &self.confidence_levels {
            if !(level > 0.0 && level < 1.0) {
                return Err(AnalysisError::Config(format!(
                    "confidence level must lie in (0, 1), got {level}"
                )));
            }
        }
        if self.plots.enabled && (self.plots.width == 0 || self.plots.height == 0) {
            return Err(AnalysisError::Config(
                "plot width and height must be positive".to_string(),
            ));
        }
        if let Some(store) = &self.reference_store {
            if store.trim().is_empty() {
                return Err(AnalysisError::Config(
                    "reference_store must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_run() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.workbook, PathBuf::from(DEFAULT_WORKBOOK));
        assert_eq!(cfg.alpha, 0.05);
        assert_eq!(cfg.reference_store.as_deref(), Some("Santa Ana"));
        assert_eq!(cfg.plots.density_path, PathBuf::from("grafico_densidad_ventas.png"));
        assert_eq!(cfg.plots.boxplot_path, PathBuf::from("boxplot_ventas.png"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = AnalysisConfig::from_toml_str("").expect("empty config");
        assert_eq!(cfg, AnalysisConfig::default());
    }

    #[test]
    fn nested_plot_table() {
        let text = r#"
            workbook = "ventas.xlsx"
            confidence_levels = [0.9]

            [plots]
            enabled = false
            width = 800
        "#;
        let cfg = AnalysisConfig::from_toml_str(text).expect("valid config");
        assert_eq!(cfg.workbook, PathBuf::from("ventas.xlsx"));
        assert_eq!(cfg.confidence_levels, vec![0.9]);
        assert!(!cfg.plots.enabled);
        assert_eq!(cfg.plots.width, 800);
        assert_eq!(cfg.plots.height, 700);
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(AnalysisConfig::from_toml_str("alpha = 0.0").is_err());
        assert!(AnalysisConfig::from_toml_str("alpha = 1.5").is_err());
        assert!(AnalysisConfig::from_toml_str("confidence_levels = [0.95, 1.0]").is_err());
        assert!(AnalysisConfig::from_toml_str("reference_store = \"  \"").is_err());
        assert!(AnalysisConfig::from_toml_str("[plots]\nheight = 0").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = AnalysisConfig::from_toml_str("alpha = ").unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
