//! Auto-refresh scheduling for the dashboard panels
//!
//! Three channels (overview, charts, table) are scheduled independently.
//! Panels subscribe a callback per channel and report the outcome of their
//! own fetches back so the controls panel can show per-channel health.

mod channel;
mod coordinator;

pub use channel::{
    clamp_interval, RefreshChannel, RefreshConfig, RefreshUpdate, INTERVAL_STEP, MAX_INTERVAL,
    MIN_INTERVAL,
};
pub use coordinator::{
    refresh_callback, RefreshCallback, RefreshCoordinator, RefreshDefaults, Subscription,
};
