use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use u_anova::pipeline::run_workbook;
use u_anova::{AnalysisConfig, AnalysisError};

/// One-factor ANOVA of sales across the stores (sheets) of a workbook.
#[derive(Parser, Debug)]
#[command(name = "u-anova", version, about)]
struct Cli {
    /// Workbook with one sheet per store; overrides the configuration file
    workbook: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Significance level for every test
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Store whose monthly confidence intervals are reported
    #[arg(short, long)]
    reference_store: Option<String>,

    /// Skip the density and box plot files
    #[arg(long)]
    no_plots: bool,
}

impl Cli {
    fn into_config(self) -> Result<AnalysisConfig, AnalysisError> {
        let mut cfg = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(path) = self.workbook {
            cfg.workbook = path;
        }
        if let Some(alpha) = self.alpha {
            cfg.alpha = alpha;
        }
        if let Some(store) = self.reference_store {
            cfg.reference_store = Some(store);
        }
        if self.no_plots {
            cfg.plots.enabled = false;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Spanish diagnostic for a run that ends before any analysis.
fn diagnostic(err: &AnalysisError) -> Option<String> {
    match err {
        AnalysisError::FileNotFound { path } => Some(format!(
            "ERROR: No se encontró el archivo en la ruta '{}'.\n\
             Por favor, asegúrate de que el archivo ha sido subido y la ruta es correcta.",
            path.display()
        )),
        AnalysisError::Workbook { .. } | AnalysisError::Parse { .. } => Some(format!(
            "Ocurrió un error inesperado al cargar los datos: {err}"
        )),
        AnalysisError::InsufficientData(message) => Some(message.clone()),
        _ => None,
    }
}

/// Writes a diagnostic to the report stream, falling back to stderr.
fn print_diagnostic<W: Write>(out: &mut W, message: &str) -> ExitCode {
    match writeln!(out, "{message}") {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("diagnostic not written: {e}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cfg = match Cli::parse().into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run_workbook(&cfg, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => match diagnostic(&e) {
            Some(message) => print_diagnostic(&mut out, &message),
            None => {
                error!("{e}");
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn diagnostic_write_failure_is_not_success() {
        assert_eq!(print_diagnostic(&mut ClosedPipe, "sin datos"), ExitCode::FAILURE);

        let mut buf = Vec::new();
        assert_eq!(print_diagnostic(&mut buf, "sin datos"), ExitCode::SUCCESS);
        assert_eq!(buf, b"sin datos\n");
    }

    #[test]
    fn diagnostics_cover_load_failures_only() {
        let missing = AnalysisError::FileNotFound {
            path: PathBuf::from("ventas.xlsx"),
        };
        let text = diagnostic(&missing).expect("diagnostic");
        assert!(text.contains("No se encontró el archivo en la ruta 'ventas.xlsx'"));
        assert!(diagnostic(&AnalysisError::Config("alpha".into())).is_none());
    }
}
