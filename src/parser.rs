use crate::models::LogLine;
use regex::Regex;

pub struct LogParser {
    main_regex: Regex,
}

impl LogParser {
    pub fn new() -> Self {
        // nginx "ui_short" format:
        // remote_addr remote_user http_x_real_ip [time_local] "request" status body_bytes_sent
        // "http_referer" "http_user_agent" "http_x_forwarded_for" "http_X_REQUEST_ID" "http_X_RB_USER"
        // request_time
        // The request time is the last decimal number on the line.
        let main_regex = Regex::new(
            r#"^.+\[.+\] "(?P<request>[^"]*)" \d{3}.+ (?P<request_time>\d+\.\d+)"#,
        )
        .unwrap();

        Self { main_regex }
    }

    /// Extract the URL and request time, or `None` when the line doesn't
    /// have the expected shape
    pub fn parse_line(&self, line: &str) -> Option<LogLine> {
        let captures = self.main_regex.captures(line)?;

        let request = captures.name("request")?.as_str();
        let mut parts = request.split_whitespace();
        let (_method, url, _protocol) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let request_time = captures.name("request_time")?.as_str().parse::<f64>().ok()?;

        Some(LogLine {
            url: url.to_string(),
            request_time,
        })
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}
