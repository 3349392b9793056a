use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a single analyzer run.
///
/// Lines that fail to parse are not represented here: they are counted by the
/// aggregator and only turn into [`AnalyzerError::ErrorBudgetExceeded`] when
/// there are too many of them.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("log directory does not exist: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read log file {}: {source}", path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "error threshold exceeded: {unparsed} of {total} lines unparsed \
         (ratio {ratio:.4}, threshold {threshold})"
    )]
    ErrorBudgetExceeded {
        unparsed: u64,
        total: u64,
        ratio: f64,
        threshold: f64,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to write report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalyzerError {
    pub fn log_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogRead {
            path: path.into(),
            source,
        }
    }

    pub fn report_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReportWrite {
            path: path.into(),
            source,
        }
    }
}
