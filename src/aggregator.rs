use crate::error::AnalyzerError;
use crate::parser::LogParser;
use std::collections::HashMap;
use tracing::{debug, info};

/// Default fraction of unparsed lines a log may contain
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.2;

/// Line counters and the global request time sum for one log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningTotals {
    pub parsed: u64,
    pub unparsed: u64,
    pub total_time: f64,
}

impl RunningTotals {
    pub fn lines_seen(&self) -> u64 {
        self.parsed + self.unparsed
    }

    /// Fraction of unparsed lines; 0 for an empty log
    pub fn error_ratio(&self) -> f64 {
        let total = self.lines_seen();
        if total == 0 {
            0.0
        } else {
            self.unparsed as f64 / total as f64
        }
    }
}

/// Request times grouped by URL, in order of first appearance
#[derive(Debug, Default)]
pub struct UrlAggregate {
    index: HashMap<String, usize>,
    entries: Vec<(String, Vec<f64>)>,
}

impl UrlAggregate {
    pub fn record(&mut self, url: &str, request_time: f64) {
        match self.index.get(url) {
            Some(&slot) => self.entries[slot].1.push(request_time),
            None => {
                self.index.insert(url.to_string(), self.entries.len());
                self.entries.push((url.to_string(), vec![request_time]));
            }
        }
    }

    /// Number of distinct URLs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, url: &str) -> Option<&[f64]> {
        self.index.get(url).map(|&slot| self.entries[slot].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.entries
            .iter()
            .map(|(url, times)| (url.as_str(), times.as_slice()))
    }
}

/// Result of a fully consumed log that stayed within the error budget
#[derive(Debug)]
pub struct Aggregate {
    pub urls: UrlAggregate,
    pub totals: RunningTotals,
}

/// Parse every line of `lines` and group request times by URL.
///
/// Unparsable lines are counted and skipped. A read error ends the run
/// immediately, and once the stream is exhausted an unparsed ratio above
/// `error_threshold` discards everything with
/// [`AnalyzerError::ErrorBudgetExceeded`].
pub fn aggregate<I>(lines: I, parser: &LogParser, error_threshold: f64) -> Result<Aggregate, AnalyzerError>
where
    I: IntoIterator<Item = Result<String, AnalyzerError>>,
{
    let mut urls = UrlAggregate::default();
    let mut totals = RunningTotals::default();

    for line in lines {
        let line = line?;

        match parser.parse_line(&line) {
            Some(entry) => {
                totals.parsed += 1;
                totals.total_time += entry.request_time;
                urls.record(&entry.url, entry.request_time);
            }
            None => {
                totals.unparsed += 1;
                debug!("Unparsed line: {}", line);
            }
        }
    }

    let ratio = totals.error_ratio();
    info!(
        "Read {} lines: {} parsed, {} unparsed ({:.2}%), {} distinct URLs",
        totals.lines_seen(),
        totals.parsed,
        totals.unparsed,
        ratio * 100.0,
        urls.len()
    );

    if ratio > error_threshold {
        return Err(AnalyzerError::ErrorBudgetExceeded {
            unparsed: totals.unparsed,
            total: totals.lines_seen(),
            ratio,
            threshold: error_threshold,
        });
    }

    Ok(Aggregate { urls, totals })
}
