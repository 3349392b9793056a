use crate::error::AnalyzerError;
use crate::log_discovery::LogFile;
use crate::models::LogFormat;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

// 512KB is large enough for good I/O throughput on multi-GB logs
const BUFFER_SIZE: usize = 512 * 1024;

/// Unified log file reader over plain and gzip-compressed logs.
/// Both variants implement BufRead through dynamic dispatch.
pub struct LogFileReader {
    path: PathBuf,
    inner: Box<dyn BufRead>,
}

impl LogFileReader {
    /// Opens a log using the format taken from its file name, not its contents
    pub fn open(log: &LogFile) -> Result<Self, AnalyzerError> {
        let file = File::open(&log.path).map_err(|e| AnalyzerError::log_read(&log.path, e))?;

        let inner: Box<dyn BufRead> = match log.format {
            LogFormat::Gzip => {
                let decoder = GzDecoder::new(file);
                Box::new(BufReader::with_capacity(BUFFER_SIZE, decoder))
            }
            LogFormat::Plain => Box::new(BufReader::with_capacity(BUFFER_SIZE, file)),
        };

        Ok(LogFileReader {
            path: log.path.clone(),
            inner,
        })
    }

    /// Lazily yields decoded lines without their line terminator.
    ///
    /// The first I/O, decompression or UTF-8 error is yielded as
    /// [`AnalyzerError::LogRead`] and ends the sequence.
    pub fn lines(self) -> LogLines {
        LogLines {
            path: self.path,
            inner: self.inner,
            buf: String::with_capacity(2048),
            failed: false,
        }
    }
}

pub struct LogLines {
    path: PathBuf,
    inner: Box<dyn BufRead>,
    buf: String,
    failed: bool,
}

impl Iterator for LogLines {
    type Item = Result<String, AnalyzerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        self.buf.clear();
        match self.inner.read_line(&mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = self.buf.trim_end_matches(['\n', '\r']);
                Some(Ok(line.to_string()))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(AnalyzerError::log_read(&self.path, e)))
            }
        }
    }
}
