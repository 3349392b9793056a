use serde::Serialize;

/// How a log file is stored on disk, taken from its file name extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Gzip,
}

impl LogFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "log" => Some(LogFormat::Plain),
            "gz" => Some(LogFormat::Gzip),
            _ => None,
        }
    }
}

/// A single request extracted from an access log line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogLine {
    pub(crate) url: String,
    pub(crate) request_time: f64,
}

/// Per-URL request time statistics for one report.
///
/// Serialized field names are the ones the report page reads from `table_json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct UrlStat {
    pub(crate) url: String,
    pub(crate) count: usize,
    #[serde(rename = "count_perc")]
    pub(crate) count_percent: f64,
    pub(crate) time_sum: f64,
    #[serde(rename = "time_perc")]
    pub(crate) time_percent: f64,
    pub(crate) time_avg: f64,
    pub(crate) time_max: f64,
    #[serde(rename = "time_med")]
    pub(crate) time_median: f64,
}
