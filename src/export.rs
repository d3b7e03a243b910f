//! One-way export of the document as JSON or CSV.

use crate::error::{Error, Result};
use crate::models::Document;
use chrono::{NaiveDate, SecondsFormat};
use std::path::{Path, PathBuf};

/// CSV column headings, in order.
pub const CSV_HEADER: &str = "Title,Description,Due Date,Project,Tags,Done,Created";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// The full document, pretty-printed.
    Json,
    /// One row per task.
    Csv,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::Validation(format!("unknown export format: {other}"))),
        }
    }
}

/// The whole document as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Quote a CSV field, doubling embedded quotes.
#[must_use]
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Tasks as CSV. Every field is quoted; the project column holds the
/// project's name, empty if the task has none or it no longer exists.
#[must_use]
pub fn to_csv(doc: &Document) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for task in &doc.tasks {
        let project = task
            .project_id
            .as_deref()
            .and_then(|id| doc.project(id))
            .map(|p| p.name.as_str())
            .unwrap_or_default();
        let due = task.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let created = task
            .created_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        let row = [
            quote(&task.title),
            quote(&task.description),
            quote(&due),
            quote(project),
            quote(&task.tags.join(";")),
            quote(if task.is_complete() { "Yes" } else { "No" }),
            quote(&created),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// File name for an export made on `today`.
#[must_use]
pub fn file_name(format: ExportFormat, today: NaiveDate) -> String {
    format!("taskdeck-export-{}.{}", today.format("%Y-%m-%d"), format.extension())
}

/// Write an export into `dir` and return its path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn export_to_dir(
    doc: &Document,
    dir: &Path,
    format: ExportFormat,
    today: NaiveDate,
) -> Result<PathBuf> {
    let content = match format {
        ExportFormat::Json => to_json(doc)?,
        ExportFormat::Csv => to_csv(doc),
    };
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(format, today));
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), tasks = doc.tasks.len(), "export written");
    Ok(path)
}
