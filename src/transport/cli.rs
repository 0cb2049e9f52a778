//! CLI command runners: `dash`, `stats` and `export`

use crate::analytics::charts::model_distribution;
use crate::analytics::format::{format_cost, format_latency, group_thousands};
use crate::analytics::{AnalyticsFilters, ModelShare};
use crate::api::{AnalyticsClient, RequestEventListResponse, RequestSource, RequestStatus, SAMPLE_LIMIT};
use crate::config::Config;
use crate::dashboard::DashboardController;
use crate::export::{export_to_dir, ExportKind};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

/// Filter flags shared by `stats` and `export`
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only include this model (repeatable)
    #[arg(long = "model", value_name = "MODEL")]
    pub models: Vec<String>,

    /// Only include requests with this status (success, error, partial)
    #[arg(long, value_parser = parse_status)]
    pub status: Option<RequestStatus>,

    /// Chat id search text
    #[arg(long)]
    pub search: Option<String>,

    /// Number of days back from now
    #[arg(long, default_value_t = 30)]
    pub days: i64,
}

fn parse_status(value: &str) -> Result<RequestStatus, String> {
    RequestStatus::parse(value)
        .ok_or_else(|| format!("unknown status '{}', expected success, error or partial", value))
}

impl FilterArgs {
    pub fn to_filters(&self) -> AnalyticsFilters {
        let mut filters = AnalyticsFilters::last_days(self.days.max(1), Utc::now());
        filters.models = self
            .models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        filters.status = self.status;
        filters.search = self.search.clone().unwrap_or_default();
        filters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn client(config: &Config) -> Result<AnalyticsClient> {
    AnalyticsClient::new(&config.api.base_url, config.api.timeout())
        .with_context(|| format!("Invalid analytics API URL: {}", config.api.base_url))
}

/// Run the interactive dashboard
pub async fn run_dashboard(config: Config) -> Result<()> {
    let source = Arc::new(client(&config)?);
    tracing::info!(api = %config.api.base_url, "Starting dashboard");
    DashboardController::new(config, source).run().await
}

/// Print aggregate metrics and the model distribution
pub async fn run_stats(config: &Config, filters: &FilterArgs, format: OutputFormat) -> Result<()> {
    let client = client(config)?;
    let query = filters.to_filters().to_query(SAMPLE_LIMIT, 0);
    let response = client
        .fetch_sample(&query)
        .await
        .context("Failed to fetch analytics")?;

    println!("{}", render_stats(&response, format)?);
    Ok(())
}

/// Stats output for a sampled response
pub fn render_stats(response: &RequestEventListResponse, format: OutputFormat) -> Result<String> {
    let models = model_distribution(&response.items);
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "aggregates": response.aggregates,
                "by_model": models,
                "sampled": response.items.len(),
                "total": response.total,
            });
            Ok(serde_json::to_string_pretty(&output)?)
        }
        OutputFormat::Table => Ok(stats_table(response, &models)),
    }
}

fn stats_table(response: &RequestEventListResponse, models: &[ModelShare]) -> String {
    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Metric")]
        metric: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    #[derive(Tabled)]
    struct ModelRow {
        #[tabled(rename = "Model")]
        model: String,
        #[tabled(rename = "Requests")]
        requests: u64,
    }

    let metrics = &response.aggregates;
    let summary = vec![
        SummaryRow {
            metric: "Total requests",
            value: group_thousands(metrics.total_requests),
        },
        SummaryRow {
            metric: "Total cost",
            value: format_cost(metrics.total_cost_usd),
        },
        SummaryRow {
            metric: "Input tokens",
            value: group_thousands(metrics.total_input_tokens),
        },
        SummaryRow {
            metric: "Output tokens",
            value: group_thousands(metrics.total_output_tokens),
        },
        SummaryRow {
            metric: "Average latency",
            value: format_latency(metrics.average_latency),
        },
    ];

    let mut out = String::new();
    out.push_str(&format!("{}\n\n", "=== REQUEST ANALYTICS ===".bold().cyan()));
    let mut table = Table::new(summary);
    table.with(Style::rounded());
    out.push_str(&format!("{}\n", table));

    if models.is_empty() {
        out.push_str(&format!("\n{}", "No requests match the filters".yellow()));
        return out;
    }

    out.push_str(&format!(
        "\n{} {}\n\n",
        "=== BY MODEL ===".bold().cyan(),
        format!("(latest {} requests)", response.items.len()).dimmed()
    ));
    let rows: Vec<ModelRow> = models
        .iter()
        .map(|share| ModelRow {
            model: share.name.clone(),
            requests: share.count,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    out.push_str(&table.to_string());
    out
}

/// Write a CSV export and return its path
pub async fn run_export(
    config: &Config,
    kind: ExportKind,
    filters: &FilterArgs,
    out_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    let client = client(config)?;
    let dir = out_dir.unwrap_or_else(|| config.dashboard.export_dir.clone());
    let query = filters.to_filters().to_query(SAMPLE_LIMIT, 0);

    let path = export_to_dir(&client, kind, &query, &dir)
        .await
        .with_context(|| format!("Failed to export {}", kind.prefix()))?;
    println!("{} Exported {}", "✓".green(), path.display());
    Ok(path)
}
