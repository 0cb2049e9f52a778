//! Refresh coordinator
//!
//! Owns one repeating timer per [`RefreshChannel`] and a registry of callbacks
//! subscribed to each channel. A channel "fires" either when its timer ticks
//! (only while the channel is enabled and the coordinator is not paused) or
//! when a caller forces it. Firing invokes every subscribed callback once and
//! spawns the returned future without awaiting it.
//!
//! The coordinator keeps per-channel health (last refresh, consecutive error
//! count, last error message) purely for display. Consumers report failures
//! of their own fetches through [`RefreshCoordinator::report_error`].

use super::channel::{clamp_interval, RefreshChannel, RefreshConfig, RefreshUpdate};
use chrono::Utc;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Callback invoked when a channel fires
///
/// The closure itself runs synchronously inside the firing call; the future
/// it returns is spawned and left to complete on its own.
pub type RefreshCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure into a [`RefreshCallback`]
pub fn refresh_callback<F, Fut>(f: F) -> RefreshCallback
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as BoxFuture<'static, ()>)
}

fn same_callback(a: &RefreshCallback, b: &RefreshCallback) -> bool {
    // Compare data pointers only; vtable pointers are not unique
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Intervals each channel starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshDefaults {
    pub overview: Duration,
    pub charts: Duration,
    pub table: Duration,
}

impl Default for RefreshDefaults {
    fn default() -> Self {
        Self {
            overview: RefreshChannel::Overview.default_interval(),
            charts: RefreshChannel::Charts.default_interval(),
            table: RefreshChannel::Table.default_interval(),
        }
    }
}

impl RefreshDefaults {
    pub fn interval(&self, channel: RefreshChannel) -> Duration {
        match channel {
            RefreshChannel::Overview => self.overview,
            RefreshChannel::Charts => self.charts,
            RefreshChannel::Table => self.table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// Tick of the timer armed at this slot generation
    Scheduled(u64),
    Forced,
}

struct ChannelSlot {
    config: RefreshConfig,
    subscribers: Vec<RefreshCallback>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every re-arm; ticks of older timers are ignored
    generation: u64,
}

impl ChannelSlot {
    fn new(interval: Duration) -> Self {
        Self {
            config: RefreshConfig::new(interval),
            subscribers: Vec::new(),
            timer: None,
            generation: 0,
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct CoordinatorState {
    channels: [ChannelSlot; 3],
    paused: bool,
    shut_down: bool,
}

impl CoordinatorState {
    fn slot(&self, channel: RefreshChannel) -> &ChannelSlot {
        &self.channels[channel.index()]
    }

    fn slot_mut(&mut self, channel: RefreshChannel) -> &mut ChannelSlot {
        &mut self.channels[channel.index()]
    }

    fn cancel_all(&mut self) {
        for slot in &mut self.channels {
            slot.cancel_timer();
        }
    }
}

impl Drop for CoordinatorState {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn lock(state: &Mutex<CoordinatorState>) -> MutexGuard<'_, CoordinatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle to the refresh scheduler
///
/// Cloning is cheap; all clones drive the same channels. Timers are cancelled
/// by [`RefreshCoordinator::shutdown`] or when the last clone is dropped.
#[derive(Clone)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    runtime: Handle,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("RefreshCoordinator")
            .field("paused", &state.paused)
            .field("overview", &state.slot(RefreshChannel::Overview).config)
            .field("charts", &state.slot(RefreshChannel::Charts).config)
            .field("table", &state.slot(RefreshChannel::Table).config)
            .finish()
    }
}

impl RefreshCoordinator {
    /// Create a coordinator on the current tokio runtime and arm every channel
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn new(defaults: RefreshDefaults) -> Self {
        Self::with_runtime(defaults, Handle::current())
    }

    /// Create a coordinator whose timers and callbacks run on `runtime`
    pub fn with_runtime(defaults: RefreshDefaults, runtime: Handle) -> Self {
        let state = CoordinatorState {
            channels: RefreshChannel::ALL.map(|channel| ChannelSlot::new(defaults.interval(channel))),
            paused: false,
            shut_down: false,
        };
        let coordinator = Self {
            state: Arc::new(Mutex::new(state)),
            runtime,
        };

        {
            let mut state = lock(&coordinator.state);
            for channel in RefreshChannel::ALL {
                coordinator.rearm(&mut state, channel);
            }
        }

        tracing::debug!(?defaults, "Refresh coordinator started");
        coordinator
    }

    /// Current configuration and health of a channel
    pub fn config(&self, channel: RefreshChannel) -> RefreshConfig {
        lock(&self.state).slot(channel).config.clone()
    }

    /// Whether automatic refresh is globally paused
    pub fn is_paused(&self) -> bool {
        lock(&self.state).paused
    }

    /// Whether at least one channel has automatic refresh enabled
    pub fn is_any_enabled(&self) -> bool {
        let state = lock(&self.state);
        state.channels.iter().any(|slot| slot.config.enabled)
    }

    /// Number of callbacks currently subscribed to a channel
    pub fn subscriber_count(&self, channel: RefreshChannel) -> usize {
        lock(&self.state).slot(channel).subscribers.len()
    }

    /// Merge `update` into the channel configuration
    ///
    /// Intervals are clamped to the accepted range. The channel timer is
    /// cancelled and re-armed only when `enabled` or the interval actually
    /// changed, so the next automatic fire is one full new interval away.
    pub fn set_channel_config(&self, channel: RefreshChannel, update: RefreshUpdate) {
        let mut state = lock(&self.state);
        let slot = state.slot_mut(channel);
        let before = (slot.config.enabled, slot.config.interval);

        if let Some(enabled) = update.enabled {
            slot.config.enabled = enabled;
        }
        if let Some(interval) = update.interval {
            slot.config.interval = clamp_interval(interval);
        }

        let after = (slot.config.enabled, slot.config.interval);
        if before != after {
            tracing::debug!(
                %channel,
                enabled = after.0,
                interval_secs = after.1.as_secs(),
                "Refresh channel reconfigured"
            );
            self.rearm(&mut state, channel);
        }
    }

    /// Register `callback` on a channel
    ///
    /// Registering the same callback (same `Arc`) twice is a no-op. The
    /// callback stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe(&self, channel: RefreshChannel, callback: RefreshCallback) -> Subscription {
        {
            let mut state = lock(&self.state);
            let slot = state.slot_mut(channel);
            if !slot.subscribers.iter().any(|c| same_callback(c, &callback)) {
                slot.subscribers.push(callback.clone());
            }
        }

        Subscription {
            state: Arc::downgrade(&self.state),
            channel,
            callback: Some(callback),
        }
    }

    /// Invoke every callback of `channel` now, ignoring enabled and pause state
    pub fn force_refresh(&self, channel: RefreshChannel) {
        self.fire(channel, Trigger::Forced);
    }

    /// Force refresh overview, charts and table, in that order
    pub fn force_refresh_all(&self) {
        for channel in RefreshChannel::ALL {
            self.force_refresh(channel);
        }
    }

    /// Stop all automatic refresh without touching per-channel `enabled`
    pub fn pause_all(&self) {
        let mut state = lock(&self.state);
        if state.paused {
            return;
        }
        state.paused = true;
        state.cancel_all();
        tracing::info!("Auto-refresh paused");
    }

    /// Resume automatic refresh on every channel that is still enabled
    pub fn resume_all(&self) {
        let mut state = lock(&self.state);
        if !state.paused {
            return;
        }
        state.paused = false;
        for channel in RefreshChannel::ALL {
            self.rearm(&mut state, channel);
        }
        tracing::info!("Auto-refresh resumed");
    }

    /// Record a failed refresh for display
    pub fn report_error(&self, channel: RefreshChannel, message: impl Into<String>) {
        let message = message.into();
        let mut state = lock(&self.state);
        let config = &mut state.slot_mut(channel).config;
        config.error_count = config.error_count.saturating_add(1);
        tracing::warn!(
            %channel,
            error_count = config.error_count,
            "Refresh failed: {}",
            message
        );
        config.last_error = Some(message);
    }

    /// Reset a channel's error count and last error
    pub fn clear_errors(&self, channel: RefreshChannel) {
        let mut state = lock(&self.state);
        let config = &mut state.slot_mut(channel).config;
        config.error_count = 0;
        config.last_error = None;
    }

    /// Cancel every timer; forced refresh keeps working afterwards
    pub fn shutdown(&self) {
        let mut state = lock(&self.state);
        state.shut_down = true;
        state.cancel_all();
        tracing::debug!("Refresh coordinator shut down");
    }

    fn fire(&self, channel: RefreshChannel, trigger: Trigger) {
        let callbacks = {
            let mut state = lock(&self.state);
            let paused = state.paused;
            let slot = state.slot_mut(channel);
            if let Trigger::Scheduled(generation) = trigger {
                // An aborted timer may already be past its tick and waiting on the lock
                if paused || !slot.config.enabled || generation != slot.generation {
                    return;
                }
            }
            slot.config.last_refresh = Some(Utc::now());
            slot.subscribers.clone()
        };

        tracing::debug!(%channel, ?trigger, subscribers = callbacks.len(), "Refresh fired");
        for callback in callbacks {
            self.runtime.spawn(callback());
        }
    }

    fn rearm(&self, state: &mut CoordinatorState, channel: RefreshChannel) {
        let paused = state.paused;
        let shut_down = state.shut_down;
        let slot = state.slot_mut(channel);
        slot.cancel_timer();
        slot.generation += 1;

        if paused || shut_down || !slot.config.enabled {
            return;
        }

        let generation = slot.generation;
        let period = slot.config.interval;
        let start = Instant::now() + period;
        let weak = Arc::downgrade(&self.state);
        let runtime = self.runtime.clone();

        slot.timer = Some(self.runtime.spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(state) = weak.upgrade() else {
                    break;
                };
                let coordinator = RefreshCoordinator {
                    state,
                    runtime: runtime.clone(),
                };
                coordinator.fire(channel, Trigger::Scheduled(generation));
            }
        }));
    }
}

/// Registration of one callback on one channel
///
/// Dropping the subscription unregisters the callback, so a component can
/// hold it for exactly as long as it is mounted.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    state: Weak<Mutex<CoordinatorState>>,
    channel: RefreshChannel,
    callback: Option<RefreshCallback>,
}

impl Subscription {
    pub fn channel(&self) -> RefreshChannel {
        self.channel
    }

    /// Remove the callback from its channel
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        if let Some(state) = self.state.upgrade() {
            let mut state = lock(&state);
            state
                .slot_mut(self.channel)
                .subscribers
                .retain(|c| !same_callback(c, &callback));
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("active", &self.callback.is_some())
            .finish()
    }
}
