//! # u-anova
//!
//! One-factor analysis of variance over sales figures collected from a
//! multi-sheet workbook (one sheet per store), together with the ancillary
//! statistics that usually accompany it.
//!
//! The numeric modules are domain-agnostic and operate on raw `f64` slices;
//! only [`data`], [`pipeline`] and [`report`] know about stores and sales.
//!
//! ## Modules
//!
//! - [`data`] — Workbook access, sales records, grouping by store and month
//! - [`testing`] — Levene (Brown-Forsythe) and Shapiro-Wilk tests
//! - [`regression`] — OLS fit of a response on one categorical factor
//! - [`anova`] — Type II ANOVA table for the store factor
//! - [`posthoc`] — Tukey HSD all-pairs comparisons
//! - [`distribution`] — t and studentized-range quantiles, KDE, box statistics
//! - [`interval`] — Monthly t confidence intervals
//! - [`extremes`] — Highest vs lowest average store comparison
//! - [`plots`] — Density and box plots (PNG)
//! - [`report`] — Console narrative
//! - [`pipeline`] — End-to-end analysis run
//!
//! ## Design Philosophy
//!
//! - **Degenerate input is not an error**: numeric routines return `None`
//! - **Numerical stability**: Leverages `u-numflow` for stable statistics
//! - **Research-backed**: All algorithms reference academic literature

pub mod anova;
pub mod config;
pub mod data;
pub mod distribution;
pub mod error;
pub mod extremes;
pub mod interval;
pub mod pipeline;
pub mod plots;
pub mod posthoc;
pub mod regression;
pub mod report;
pub mod testing;

pub use config::{AnalysisConfig, PlotConfig};
pub use error::{AnalysisError, Result};
pub use pipeline::{analyze, run_analysis, run_workbook, AnalysisOutcome};
