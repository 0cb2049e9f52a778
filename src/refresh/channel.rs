//! Refresh channels and their per-channel configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Shortest interval accepted for automatic refresh
pub const MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Longest interval accepted for automatic refresh
pub const MAX_INTERVAL: Duration = Duration::from_secs(300);

/// Step used by the settings controls when nudging an interval
pub const INTERVAL_STEP: Duration = Duration::from_secs(5);

/// One of the independently scheduled refresh domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshChannel {
    /// Aggregate statistics cards
    Overview,
    /// Cost, token and model charts
    Charts,
    /// Paginated requests table
    Table,
}

impl RefreshChannel {
    /// All channels, in forced-refresh order
    pub const ALL: [RefreshChannel; 3] = [
        RefreshChannel::Overview,
        RefreshChannel::Charts,
        RefreshChannel::Table,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            RefreshChannel::Overview => 0,
            RefreshChannel::Charts => 1,
            RefreshChannel::Table => 2,
        }
    }

    /// Human readable label for the controls panel
    pub fn label(self) -> &'static str {
        match self {
            RefreshChannel::Overview => "Overview",
            RefreshChannel::Charts => "Charts",
            RefreshChannel::Table => "Table",
        }
    }

    /// Cycle to the next channel
    pub fn next(self) -> Self {
        match self {
            RefreshChannel::Overview => RefreshChannel::Charts,
            RefreshChannel::Charts => RefreshChannel::Table,
            RefreshChannel::Table => RefreshChannel::Overview,
        }
    }

    /// Built-in interval used when nothing else is configured
    pub fn default_interval(self) -> Duration {
        match self {
            RefreshChannel::Overview => Duration::from_secs(30),
            RefreshChannel::Charts => Duration::from_secs(60),
            RefreshChannel::Table => Duration::from_secs(45),
        }
    }
}

impl fmt::Display for RefreshChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshChannel::Overview => "overview",
            RefreshChannel::Charts => "charts",
            RefreshChannel::Table => "table",
        };
        f.write_str(name)
    }
}

/// Clamp an interval into the accepted `[MIN_INTERVAL, MAX_INTERVAL]` range
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

/// Snapshot of a channel's schedule and health
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshConfig {
    /// Whether periodic firing is active
    pub enabled: bool,
    /// Period between automatic firings
    pub interval: Duration,
    /// Set whenever the channel fires, automatically or forced
    pub last_refresh: Option<DateTime<Utc>>,
    /// Errors reported since the last clear
    pub error_count: u32,
    /// Most recent reported error text
    pub last_error: Option<String>,
}

impl RefreshConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            enabled: true,
            interval: clamp_interval(interval),
            last_refresh: None,
            error_count: 0,
            last_error: None,
        }
    }

    /// Interval in whole seconds, as shown in the settings panel
    pub fn interval_secs(&self) -> u64 {
        self.interval.as_secs()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Partial update merged into a channel's configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshUpdate {
    pub enabled: Option<bool>,
    pub interval: Option<Duration>,
}

impl RefreshUpdate {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn interval(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            ..Self::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}
