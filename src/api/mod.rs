//! Analytics API client
//!
//! The upstream service exposes a single listing endpoint, `GET /requests`,
//! that accepts filter and pagination parameters and returns a page of
//! request events together with aggregates over the whole filtered set.

mod client;
mod error;
mod types;

pub use client::{iso_timestamp, AnalyticsClient, RequestQuery, RequestSource, SAMPLE_LIMIT};
pub use error::ApiError;
pub use types::{AggregatedMetrics, RequestEvent, RequestEventListResponse, RequestStatus};
