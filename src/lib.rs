//! reqdash: terminal analytics dashboard for logged model requests
//!
//! This library provides:
//! - A refresh coordinator that schedules the dashboard panels
//! - A client for the analytics API
//! - Filters, chart series and CSV export over request events
//! - The terminal dashboard and the CLI command runners

pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod refresh;
pub mod transport;

pub use config::Config;
pub use refresh::{RefreshChannel, RefreshCoordinator};
