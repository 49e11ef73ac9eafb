use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A client-side validation failure, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, "is required")
    }
}

/// Acknowledgement returned by mutation endpoints: `{"message": ..., "id": ...}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Optional inclusive date range, sent as `from_date`/`to_date` (YYYY-MM-DD).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from_date: Option<NaiveDate>, to_date: Option<NaiveDate>) -> Self {
        Self { from_date, to_date }
    }
}

/// Result of a CSV import upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvImportResult {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub imported: u64,
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub valid_rows: Option<u64>,
    #[serde(default)]
    pub error_rows: Option<u64>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CsvImportResult {
    pub fn summary(&self) -> String {
        let mode = if self.dry_run { "dry run" } else { "committed" };
        let mut out = format!(
            "{} ({}): {} imported, {} errors",
            self.filename.as_deref().unwrap_or("upload"),
            mode,
            self.imported,
            self.errors.len()
        );
        if let Some(total) = self.total_rows {
            out.push_str(&format!(", {} rows", total));
        }
        out
    }
}

/// Backend health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
