use crate::aggregator::DEFAULT_ERROR_THRESHOLD;
use crate::error::AnalyzerError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one analyzer run, built once at startup and passed down.
///
/// Config files use the upper-case keys (`REPORT_SIZE`, `LOG_DIR`, ...).
/// Keys missing from the file keep their default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct Config {
    /// Maximum number of URLs in the report
    pub report_size: usize,
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    pub error_threshold: f64,
    /// Diagnostic log destination, stderr when unset
    pub log_file: Option<PathBuf>,
    pub report_template: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_size: 1000,
            report_dir: PathBuf::from("./reports"),
            log_dir: PathBuf::from("./log"),
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            log_file: None,
            report_template: None,
        }
    }
}

impl Config {
    /// Defaults, overridden by the TOML file at `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self, AnalyzerError> {
        let config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    AnalyzerError::Config(format!("cannot read config file {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw).map_err(|e| match e {
                    AnalyzerError::Config(msg) => {
                        AnalyzerError::Config(format!("{}: {}", path.display(), msg))
                    }
                    other => other,
                })?
            }
            None => Self::default(),
        };

        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, AnalyzerError> {
        let config: Config = toml::from_str(raw).map_err(|e| AnalyzerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if !(0.0..=1.0).contains(&self.error_threshold) {
            return Err(AnalyzerError::Config(format!(
                "ERROR_THRESHOLD must be between 0 and 1, got {}",
                self.error_threshold
            )));
        }

        if self.report_size == 0 {
            return Err(AnalyzerError::Config("REPORT_SIZE must be positive".to_string()));
        }

        Ok(())
    }
}
