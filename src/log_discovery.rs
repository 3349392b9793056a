use crate::error::AnalyzerError;
use crate::models::LogFormat;
use chrono::NaiveDate;
use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Represents a discovered UI access log with the date embedded in its name
#[derive(Debug, Clone)]
pub struct LogFile {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub format: LogFormat,
}

impl LogFile {
    fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }
}

impl PartialEq for LogFile {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LogFile {}

impl PartialOrd for LogFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogFile {
    /// Newer date sorts greater.
    /// On the same date the lexically smaller file name sorts greater, so
    /// `...-20170630.gz` is preferred over `...-20170630.log`.
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| other.file_name().cmp(self.file_name()))
    }
}

/// Matches `nginx-access-ui.log-YYYYMMDD.gz` and `nginx-access-ui.log-YYYYMMDD.log`
pub struct LogNamePattern {
    regex: Regex,
}

impl LogNamePattern {
    pub fn new() -> Self {
        let regex = Regex::new(r"^nginx-access-ui\.log-(?P<date>\d{8})\.(?P<ext>gz|log)$").unwrap();
        Self { regex }
    }

    /// Returns `None` for names that don't follow the convention or whose
    /// embedded date is not a real calendar date
    pub fn match_path(&self, path: &Path) -> Option<LogFile> {
        let file_name = path.file_name()?.to_str()?;
        let captures = self.regex.captures(file_name)?;

        let date_str = captures.name("date")?.as_str();
        let format = LogFormat::from_extension(captures.name("ext")?.as_str())?;

        let date = match NaiveDate::parse_from_str(date_str, "%Y%m%d") {
            Ok(date) => date,
            Err(e) => {
                warn!("Skipping {}: invalid date '{}' ({})", file_name, date_str, e);
                return None;
            }
        };

        Some(LogFile {
            path: path.to_path_buf(),
            date,
            format,
        })
    }
}

impl Default for LogNamePattern {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the most recent UI access log in `log_directory`.
///
/// Returns `Ok(None)` when the directory exists but holds no matching log.
pub fn find_latest_log<P: AsRef<Path>>(log_directory: P) -> Result<Option<LogFile>, AnalyzerError> {
    let log_dir = log_directory.as_ref();

    if !log_dir.is_dir() {
        return Err(AnalyzerError::DirectoryNotFound {
            path: log_dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(log_dir).map_err(|e| AnalyzerError::log_read(log_dir, e))?;
    let pattern = LogNamePattern::new();
    let mut latest: Option<LogFile> = None;

    for entry in entries {
        let entry = entry.map_err(|e| AnalyzerError::log_read(log_dir, e))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(candidate) = pattern.match_path(&path) else {
            continue;
        };

        debug!("Candidate log: {} ({})", candidate.path.display(), candidate.date);

        if latest.as_ref().map_or(true, |current| candidate > *current) {
            latest = Some(candidate);
        }
    }

    // Absolute path so diagnostics and the report name don't depend on cwd
    Ok(latest.map(|mut log| {
        if let Ok(abs) = std::path::absolute(&log.path) {
            log.path = abs;
        }
        log
    }))
}
