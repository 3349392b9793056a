use crate::aggregator::aggregate;
use crate::config::Config;
use crate::error::AnalyzerError;
use crate::log_discovery::find_latest_log;
use crate::log_reader::LogFileReader;
use crate::parser::LogParser;
use crate::report::{load_template, render_report, report_path, write_report};
use crate::stats::compute_url_stats;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Non-error ways a run can finish
#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    /// The log directory holds no log matching the naming convention
    NoLogFound,
    /// A report for the newest log was written earlier; nothing was done
    ReportAlreadyExists(PathBuf),
    Generated {
        path: PathBuf,
        lines: u64,
        urls: usize,
    },
}

/// Build the report for the newest log in `config.log_dir`.
///
/// No report file is created when this returns an error.
pub fn run(config: &Config) -> Result<RunOutcome, AnalyzerError> {
    let start_time = Instant::now();

    let Some(log) = find_latest_log(&config.log_dir)? else {
        info!("No logs to parse in {}", config.log_dir.display());
        return Ok(RunOutcome::NoLogFound);
    };
    info!("Latest log: {} ({})", log.path.display(), log.date);

    let report = report_path(&config.report_dir, log.date);
    if report.exists() {
        info!("Report {} already exists, nothing to do", report.display());
        return Ok(RunOutcome::ReportAlreadyExists(report));
    }

    // Read the template up front so a bad template path fails before parsing a large log
    let template = load_template(config.report_template.as_deref())?;

    let parser = LogParser::new();
    let lines = LogFileReader::open(&log)?.lines();
    let aggregate = aggregate(lines, &parser, config.error_threshold)?;

    let mut stats = compute_url_stats(&aggregate);
    let urls = stats.len();
    stats.truncate(config.report_size);

    let rendered = render_report(&template, &stats)?;
    write_report(&report, &rendered)?;

    info!(
        "Report written to {} ({} of {} URLs) in {:.2}s",
        report.display(),
        stats.len(),
        urls,
        start_time.elapsed().as_secs_f64()
    );

    Ok(RunOutcome::Generated {
        path: report,
        lines: aggregate.totals.lines_seen(),
        urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn line(url: &str, time: &str) -> String {
        format!(
            r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "GET {} HTTP/1.1" 200 927 "-" "Lynx/2.8.8dev.9" "-" "1498697422-2190034393-4708-9752759" "dc7161be3" {}"#,
            url, time
        )
    }

    fn sample_log() -> String {
        let mut lines = vec![
            line("/api/v2/banner/1", "0.390"),
            line("/api/v2/banner/1", "0.610"),
            line("/api/v2/slot/4", "2.000"),
            line("/api/v2/internal/html5/phantomjs/queue/?wait=1m0s", "60.004"),
            line("/api/v2/slot/4", "1.000"),
        ];
        lines.push("malformed line".to_string());
        lines.join("\n") + "\n"
    }

    struct Fixture {
        _root: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempdir().unwrap();
            let log_dir = root.path().join("log");
            fs::create_dir(&log_dir).unwrap();

            let config = Config {
                log_dir,
                report_dir: root.path().join("reports"),
                ..Config::default()
            };

            Self { _root: root, config }
        }

        fn add_plain(&self, name: &str, contents: &str) {
            fs::write(self.config.log_dir.join(name), contents).unwrap();
        }

        fn add_gzip(&self, name: &str, contents: &str) {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(contents.as_bytes()).unwrap();
            fs::write(self.config.log_dir.join(name), encoder.finish().unwrap()).unwrap();
        }

        fn report_files(&self) -> usize {
            match fs::read_dir(&self.config.report_dir) {
                Ok(entries) => entries.count(),
                Err(_) => 0,
            }
        }
    }

    fn table_json(report: &Path) -> serde_json::Value {
        let html = fs::read_to_string(report).unwrap();
        let start = html.find("var table = ").unwrap() + "var table = ".len();
        let end = start + html[start..].find(";\n").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_generates_report_for_latest_log() {
        let fx = Fixture::new();
        fx.add_plain("nginx-access-ui.log-20170629.log", &line("/old", "1.0"));
        fx.add_plain("nginx-access-ui.log-20170630.log", &sample_log());

        let outcome = run(&fx.config).unwrap();

        let expected = fx.config.report_dir.join("report-2017.06.30.html");
        assert_eq!(
            outcome,
            RunOutcome::Generated {
                path: expected.clone(),
                lines: 6,
                urls: 3
            }
        );

        let table = table_json(&expected);
        let rows = table.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["url"], "/api/v2/internal/html5/phantomjs/queue/?wait=1m0s");
        assert_eq!(rows[1]["url"], "/api/v2/slot/4");
        assert_eq!(rows[1]["count"], 2);
        assert_eq!(rows[1]["time_sum"], 3.0);
        assert_eq!(rows[2]["url"], "/api/v2/banner/1");
        assert_eq!(rows[2]["time_avg"], 0.5);
    }

    #[test]
    fn test_second_run_skips_existing_report() {
        let fx = Fixture::new();
        fx.add_plain("nginx-access-ui.log-20170630.log", &sample_log());

        let path = match run(&fx.config).unwrap() {
            RunOutcome::Generated { path, .. } => path,
            other => panic!("expected a generated report, got {other:?}"),
        };
        let contents = fs::read_to_string(&path).unwrap();

        let second = run(&fx.config).unwrap();

        assert_eq!(second, RunOutcome::ReportAlreadyExists(path.clone()));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
        assert_eq!(fx.report_files(), 1);
    }

    #[test]
    fn test_truncates_to_report_size() {
        let mut fx = Fixture::new();
        fx.config.report_size = 2;
        fx.add_plain("nginx-access-ui.log-20170630.log", &sample_log());

        let outcome = run(&fx.config).unwrap();
        let RunOutcome::Generated { path, urls, .. } = outcome else {
            panic!("expected a generated report");
        };

        assert_eq!(urls, 3);
        assert_eq!(table_json(&path).as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_error_budget_boundary() {
        let good: Vec<String> = (0..8).map(|i| line(&format!("/u/{i}"), "0.100")).collect();

        // 2 of 10 lines malformed: exactly at the 0.2 threshold
        let fx = Fixture::new();
        let mut lines = good.clone();
        lines.extend(["bad".to_string(), "bad".to_string()]);
        fx.add_plain("nginx-access-ui.log-20170630.log", &lines.join("\n"));
        assert!(matches!(run(&fx.config), Ok(RunOutcome::Generated { .. })));

        // 3 of 11 lines malformed: above the threshold, nothing written
        let fx = Fixture::new();
        let mut lines = good;
        lines.extend(["bad".to_string(), "bad".to_string(), "bad".to_string()]);
        fx.add_plain("nginx-access-ui.log-20170630.log", &lines.join("\n"));

        let err = run(&fx.config).unwrap_err();
        assert!(matches!(err, AnalyzerError::ErrorBudgetExceeded { .. }));
        assert_eq!(fx.report_files(), 0);
    }

    #[test]
    fn test_missing_log_directory() {
        let mut fx = Fixture::new();
        fx.config.log_dir = fx.config.log_dir.join("missing");

        let err = run(&fx.config).unwrap_err();
        assert!(matches!(err, AnalyzerError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_no_matching_log() {
        let fx = Fixture::new();
        fx.add_plain("access.log", &sample_log());

        assert_eq!(run(&fx.config).unwrap(), RunOutcome::NoLogFound);
        assert_eq!(fx.report_files(), 0);
    }

    #[test]
    fn test_gzip_and_plain_give_same_report() {
        let plain = Fixture::new();
        plain.add_plain("nginx-access-ui.log-20170630.log", &sample_log());
        let gzip = Fixture::new();
        gzip.add_gzip("nginx-access-ui.log-20170630.gz", &sample_log());

        let RunOutcome::Generated { path: plain_path, .. } = run(&plain.config).unwrap() else {
            panic!("plain log should produce a report");
        };
        let RunOutcome::Generated { path: gzip_path, .. } = run(&gzip.config).unwrap() else {
            panic!("gzip log should produce a report");
        };

        assert_eq!(table_json(&plain_path), table_json(&gzip_path));
    }

    #[test]
    fn test_corrupt_gzip_writes_no_report() {
        let fx = Fixture::new();
        fx.add_plain("nginx-access-ui.log-20170630.gz", "plain text pretending to be gzip");

        let err = run(&fx.config).unwrap_err();
        assert!(matches!(err, AnalyzerError::LogRead { .. }));
        assert_eq!(fx.report_files(), 0);
    }

    #[test]
    fn test_empty_log_gives_empty_report() {
        let fx = Fixture::new();
        fx.add_plain("nginx-access-ui.log-20170630.log", "");

        let RunOutcome::Generated { path, lines, urls } = run(&fx.config).unwrap() else {
            panic!("empty log should still produce a report");
        };

        assert_eq!(lines, 0);
        assert_eq!(urls, 0);
        assert_eq!(table_json(&path), serde_json::json!([]));
    }

    #[test]
    fn test_custom_template() {
        let mut fx = Fixture::new();
        let template = fx.config.log_dir.parent().unwrap().join("custom.html");
        fs::write(&template, "<pre>\nvar table = $table_json;\n</pre>").unwrap();
        fx.config.report_template = Some(template);
        fx.add_plain("nginx-access-ui.log-20170630.log", &line("/only", "1.5"));

        let RunOutcome::Generated { path, .. } = run(&fx.config).unwrap() else {
            panic!("expected a generated report");
        };

        assert!(fs::read_to_string(&path).unwrap().starts_with("<pre>"));
        assert_eq!(table_json(&path)[0]["time_max"], 1.5);
    }
}
