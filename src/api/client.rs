//! HTTP client for the analytics API

use super::error::ApiError;
use super::types::{AggregatedMetrics, RequestEventListResponse, RequestStatus};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use url::Url;

/// Page size used when sampling requests for charts and exports
pub const SAMPLE_LIMIT: u32 = 100;

/// Query parameters of `GET /requests`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQuery {
    pub limit: u32,
    pub offset: u32,
    /// Comma-joined model names, `None` for all models
    pub model: Option<String>,
    pub status: Option<RequestStatus>,
    pub chat_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl RequestQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }

    /// Same filters with a different page window
    pub fn with_page(&self, limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..self.clone()
        }
    }

    /// Query pairs in wire form; empty values are left out
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];

        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            pairs.push(("model", model.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status_filter", status.to_string()));
        }
        if let Some(chat_id) = self.chat_id.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("chat_id", chat_id.to_string()));
        }
        if let Some(from) = self.date_from {
            pairs.push(("date_from", iso_timestamp(from)));
        }
        if let Some(to) = self.date_to {
            pairs.push(("date_to", iso_timestamp(to)));
        }

        pairs
    }
}

/// `2025-09-25T10:15:00.000Z`
pub fn iso_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Anything that can list request events
///
/// Implemented by [`AnalyticsClient`]; tests and offline tools can provide
/// their own source.
#[async_trait]
pub trait RequestSource: Send + Sync {
    async fn list_requests(&self, query: &RequestQuery) -> Result<RequestEventListResponse, ApiError>;

    /// Aggregates over the filtered set (fetches a single row)
    async fn fetch_aggregates(&self, query: &RequestQuery) -> Result<AggregatedMetrics, ApiError> {
        let response = self.list_requests(&query.with_page(1, 0)).await?;
        Ok(response.aggregates)
    }

    /// First [`SAMPLE_LIMIT`] rows, used by charts and CSV export
    async fn fetch_sample(&self, query: &RequestQuery) -> Result<RequestEventListResponse, ApiError> {
        self.list_requests(&query.with_page(SAMPLE_LIMIT, 0)).await
    }
}

/// reqwest-backed client for the analytics service
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    http: reqwest::Client,
    requests_url: Url,
}

impl AnalyticsClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api/v1`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let requests_url = requests_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("reqdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { http, requests_url })
    }

    /// Full URL that `query` would be sent to
    pub fn url_for(&self, query: &RequestQuery) -> Url {
        let mut url = self.requests_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }
}

fn requests_url(base_url: &str) -> Result<Url, ApiError> {
    let joined = format!("{}/requests", base_url.trim().trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| ApiError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl RequestSource for AnalyticsClient {
    async fn list_requests(&self, query: &RequestQuery) -> Result<RequestEventListResponse, ApiError> {
        let url = self.url_for(query);
        tracing::debug!(%url, "Fetching requests");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
