//! Filters, chart series and formatting for the dashboard panels

pub mod charts;
pub mod filters;
pub mod format;

pub use charts::{CostPoint, ModelShare, TokensPoint};
pub use filters::{AnalyticsFilters, DEFAULT_RANGE_DAYS, RANGE_PRESETS};
