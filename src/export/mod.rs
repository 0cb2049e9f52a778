//! CSV export of request rows and of the aggregate summary
//!
//! Files are UTF-8 with a byte order mark so spreadsheet tools pick the right
//! encoding, and are named `{prefix}_{YYYY-MM-DD_HH-MM}.csv`.

use crate::analytics::format::{format_cost, group_thousands};
use crate::api::{AggregatedMetrics, ApiError, RequestEvent, RequestQuery, RequestSource};
use chrono::{DateTime, Local, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name prefix of the requests export
pub const REQUESTS_PREFIX: &str = "analytics_requests";

/// File name prefix of the summary export
pub const SUMMARY_PREFIX: &str = "analytics_summary";

const BOM: &str = "\u{FEFF}";

const REQUEST_HEADERS: [&str; 12] = [
    "Request ID",
    "Date Time",
    "Chat ID",
    "Message ID",
    "Model",
    "Duration (s)",
    "Input Tokens",
    "Output Tokens",
    "Cost (USD)",
    "Status",
    "Extracted Numbers",
    "Created",
];

#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing matched the current filters
    #[error("No data to export")]
    Empty,

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Sampled request rows
    Requests,
    /// Aggregate metrics of the filtered set
    Summary,
}

impl ExportKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ExportKind::Requests => REQUESTS_PREFIX,
            ExportKind::Summary => SUMMARY_PREFIX,
        }
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let body = String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(body)
}

/// One row per request event
pub fn requests_csv(items: &[RequestEvent]) -> Result<String, ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut wtr = writer();
    wtr.write_record(REQUEST_HEADERS)?;
    for item in items {
        wtr.write_record([
            item.request_id.clone(),
            timestamp(&item.originated_at),
            item.chat_id.clone().unwrap_or_default(),
            item.message_id.map(|id| id.to_string()).unwrap_or_default(),
            item.model.clone(),
            format!("{:.2}", item.duration_seconds),
            item.input_tokens.to_string(),
            item.output_tokens.to_string(),
            format!("{:.4}", item.cost_usd),
            item.status.to_string(),
            item.numbers().join(", "),
            timestamp(&item.created_at),
        ])?;
    }
    finish(wtr)
}

/// `Metric,Value` rows describing the filtered set
pub fn summary_csv(metrics: &AggregatedMetrics, exported_at: DateTime<Utc>) -> Result<String, ExportError> {
    let latency = metrics
        .average_latency
        .filter(|l| *l > 0.0)
        .map(|l| format!("{:.2}", l))
        .unwrap_or_else(|| "N/A".to_string());

    let rows = [
        ("Total requests", metrics.total_requests.to_string()),
        ("Total cost (USD)", format_cost(metrics.total_cost_usd)),
        ("Total input tokens", group_thousands(metrics.total_input_tokens)),
        ("Total output tokens", group_thousands(metrics.total_output_tokens)),
        ("Average latency (s)", latency),
        ("Export date", timestamp(&exported_at)),
    ];

    let mut wtr = writer();
    wtr.write_record(["Metric", "Value"])?;
    for (metric, value) in rows {
        wtr.write_record([metric, value.as_str()])?;
    }
    finish(wtr)
}

/// `analytics_requests_2025-09-30_14-05.csv`
pub fn export_file_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.csv", prefix, at.format("%Y-%m-%d_%H-%M"))
}

/// Write `contents` (with BOM) into `dir`, creating it if needed
pub fn write_export(dir: &Path, prefix: &str, contents: &str) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(prefix, Local::now()));
    std::fs::write(&path, format!("{BOM}{contents}"))?;
    tracing::info!(path = %path.display(), "Export written");
    Ok(path)
}

/// Fetch what `kind` needs for `query` and write it into `dir`
pub async fn export_to_dir(
    source: &dyn RequestSource,
    kind: ExportKind,
    query: &RequestQuery,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let contents = match kind {
        ExportKind::Requests => {
            let sample = source.fetch_sample(query).await?;
            requests_csv(&sample.items)?
        }
        ExportKind::Summary => {
            let metrics = source.fetch_aggregates(query).await?;
            summary_csv(&metrics, Utc::now())?
        }
    };
    write_export(dir, kind.prefix(), &contents)
}
