use crate::error::AnalyzerError;
use crate::models::UrlStat;
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Report page compiled into the binary, used unless a template file is configured
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/report.html");

/// `report-YYYY.MM.DD.html` inside `report_dir`, dated by the log date
pub fn report_path(report_dir: &Path, log_date: NaiveDate) -> PathBuf {
    report_dir.join(log_date.format("report-%Y.%m.%d.html").to_string())
}

pub fn load_template(template_path: Option<&Path>) -> Result<String, AnalyzerError> {
    match template_path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("cannot read report template {}: {}", path.display(), e))
        }),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

/// Substitute the JSON encoded rows for `$table_json` (or `${table_json}`).
///
/// Placeholder names follow the ASCII identifier rule `[_A-Za-z][_A-Za-z0-9]*`.
/// `$$` collapses to a literal `$`; any other `$` token is left untouched.
pub(crate) fn render_report(template: &str, stats: &[UrlStat]) -> Result<String, AnalyzerError> {
    let table_json = script_safe_json(&serde_json::to_string(stats)?);
    let placeholder = Regex::new(
        r"\$(?:(?P<escaped>\$)|(?P<named>[_A-Za-z][_A-Za-z0-9]*)|\{(?P<braced>[_A-Za-z][_A-Za-z0-9]*)\})",
    )
    .unwrap();

    let rendered = placeholder.replace_all(template, |caps: &Captures| {
        if caps.name("escaped").is_some() {
            return "$".to_string();
        }

        let name = caps.name("named").or_else(|| caps.name("braced")).map(|m| m.as_str());
        match name {
            Some("table_json") => table_json.clone(),
            _ => caps[0].to_string(),
        }
    });

    Ok(rendered.into_owned())
}

/// Escape `<`, `>` and `&` so URLs from the log can't close the `<script>`
/// block the rows are embedded in. Those characters only occur inside JSON
/// strings, where the `\u` escapes decode to the same text.
fn script_safe_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Write the report with an atomic write-and-rename so a reader never sees a
/// truncated document at `report_path`
pub fn write_report(report_path: &Path, contents: &str) -> Result<(), AnalyzerError> {
    let parent_dir = report_path.parent().unwrap_or(Path::new("."));
    let to_err = |e: std::io::Error| AnalyzerError::report_write(report_path, e);

    fs::create_dir_all(parent_dir).map_err(to_err)?;

    // Temp file in the destination directory so the rename stays on one filesystem
    let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(to_err)?;
    temp_file.write_all(contents.as_bytes()).map_err(to_err)?;
    temp_file.flush().map_err(to_err)?;
    temp_file.as_file().sync_all().map_err(to_err)?;

    // Close the handle before persisting, required on Windows
    let temp_path = temp_file.into_temp_path();
    temp_path.persist(report_path).map_err(|e| to_err(e.error))?;

    Ok(())
}
