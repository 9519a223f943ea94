//! Error types for the analysis pipeline.
//!
//! Numeric routines never fail with an error; they return `None` for
//! degenerate input. Errors are reserved for I/O, workbook decoding,
//! configuration and the insufficient-data conditions that end a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can terminate an analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("workbook not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet '{sheet}', row {row}: {message}")]
    Parse {
        sheet: String,
        row: usize,
        message: String,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Whether the error happened while loading the workbook.
    ///
    /// Load failures end the run quietly after a diagnostic; everything
    /// else is reported as a hard failure by the binary.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::Workbook { .. } | Self::Parse { .. }
        )
    }
}

pub type Result<T> = core::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failures_are_classified() {
        let nf = AnalysisError::FileNotFound {
            path: PathBuf::from("missing.xlsx"),
        };
        assert!(nf.is_load_failure());
        assert!(nf.to_string().contains("missing.xlsx"));

        let parse = AnalysisError::Parse {
            sheet: "Centro".into(),
            row: 4,
            message: "not a number".into(),
        };
        assert!(parse.is_load_failure());
        assert_eq!(parse.to_string(), "sheet 'Centro', row 4: not a number");

        assert!(!AnalysisError::InsufficientData("x".into()).is_load_failure());
        assert!(!AnalysisError::Config("x".into()).is_load_failure());
    }
}
