//! Refresh coordinator scheduling tests
//!
//! All tests run on a paused tokio clock, so `sleep` advances virtual time
//! and lets the channel timers fire deterministically.
//!
//! Run: cargo test --test refresh_coordinator

use reqdash::refresh::{
    refresh_callback, RefreshCallback, RefreshChannel, RefreshCoordinator, RefreshDefaults,
    RefreshUpdate,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Callback that counts its invocations
fn counter() -> (Arc<AtomicUsize>, RefreshCallback) {
    let count = Arc::new(AtomicUsize::new(0));
    let counted = count.clone();
    let callback = refresh_callback(move || {
        counted.fetch_add(1, Ordering::SeqCst);
        async {}
    });
    (count, callback)
}

fn calls(count: &AtomicUsize) -> usize {
    count.load(Ordering::SeqCst)
}

fn coordinator() -> RefreshCoordinator {
    RefreshCoordinator::new(RefreshDefaults::default())
}

// Let spawned callback futures run
async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

// ============================================================================
// AUTOMATIC FIRING
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_enabled_channel_fires_every_interval() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    sleep(Duration::from_secs(29)).await;
    assert_eq!(calls(&count), 0);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(calls(&count), 1);
    assert!(coordinator.config(RefreshChannel::Overview).last_refresh.is_some());

    sleep(Duration::from_secs(60)).await;
    assert_eq!(calls(&count), 3);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_channel_never_fires_automatically() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    coordinator.set_channel_config(RefreshChannel::Overview, RefreshUpdate::enabled(false));
    sleep(Duration::from_secs(301)).await;

    assert_eq!(calls(&count), 0);
    assert!(coordinator.config(RefreshChannel::Overview).last_refresh.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_channels_are_independent() {
    let coordinator = coordinator();
    let (overview, overview_cb) = counter();
    let (table, table_cb) = counter();
    let _a = coordinator.subscribe(RefreshChannel::Overview, overview_cb);
    let _b = coordinator.subscribe(RefreshChannel::Table, table_cb);

    coordinator.set_channel_config(RefreshChannel::Table, RefreshUpdate::enabled(false));
    sleep(Duration::from_secs(91)).await;

    assert_eq!(calls(&overview), 3);
    assert_eq!(calls(&table), 0);
}

// ============================================================================
// PAUSE / RESUME
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_stops_firing_and_resume_restarts_full_interval() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    coordinator.pause_all();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(calls(&count), 0);
    assert!(coordinator.config(RefreshChannel::Overview).enabled);

    coordinator.resume_all();
    sleep(Duration::from_secs(29)).await;
    assert_eq!(calls(&count), 0);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(calls(&count), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_are_idempotent() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    sleep(Duration::from_secs(20)).await;
    // Not paused: resuming must not re-arm the timer
    coordinator.resume_all();
    sleep(Duration::from_secs(11)).await;
    assert_eq!(calls(&count), 1);

    coordinator.pause_all();
    coordinator.pause_all();
    assert!(coordinator.is_paused());
    coordinator.resume_all();
    assert!(!coordinator.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_resume_skips_disabled_channels() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Charts, callback);

    coordinator.pause_all();
    coordinator.set_channel_config(RefreshChannel::Charts, RefreshUpdate::enabled(false));
    coordinator.resume_all();

    sleep(Duration::from_secs(300)).await;
    assert_eq!(calls(&count), 0);
}

// ============================================================================
// FORCED REFRESH
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_force_refresh_ignores_pause_and_enabled() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    coordinator.pause_all();
    coordinator.set_channel_config(RefreshChannel::Overview, RefreshUpdate::enabled(false));
    coordinator.force_refresh(RefreshChannel::Overview);

    assert_eq!(calls(&count), 1);
    assert!(coordinator.config(RefreshChannel::Overview).last_refresh.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_all_fires_disabled_table_once() {
    let coordinator = coordinator();
    let (overview, overview_cb) = counter();
    let (charts, charts_cb) = counter();
    let (table, table_cb) = counter();
    let _a = coordinator.subscribe(RefreshChannel::Overview, overview_cb);
    let _b = coordinator.subscribe(RefreshChannel::Charts, charts_cb);
    let _c = coordinator.subscribe(RefreshChannel::Table, table_cb);

    coordinator.set_channel_config(RefreshChannel::Table, RefreshUpdate::enabled(false));
    coordinator.force_refresh_all();
    assert_eq!((calls(&overview), calls(&charts), calls(&table)), (1, 1, 1));

    sleep(Duration::from_secs(200)).await;
    assert_eq!(calls(&table), 1);
    assert!(calls(&overview) > 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_without_subscribers_still_stamps() {
    let coordinator = coordinator();
    coordinator.force_refresh(RefreshChannel::Table);
    assert!(coordinator.config(RefreshChannel::Table).last_refresh.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_callback_futures_are_not_awaited() {
    let coordinator = coordinator();
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let (s, f) = (started.clone(), finished.clone());
    let callback = refresh_callback(move || {
        s.fetch_add(1, Ordering::SeqCst);
        let f = f.clone();
        async move {
            sleep(Duration::from_secs(1000)).await;
            f.fetch_add(1, Ordering::SeqCst);
        }
    });
    let _sub = coordinator.subscribe(RefreshChannel::Charts, callback);

    coordinator.force_refresh(RefreshChannel::Charts);
    coordinator.force_refresh(RefreshChannel::Charts);
    settle().await;

    assert_eq!(calls(&started), 2);
    assert_eq!(calls(&finished), 0);
}

// ============================================================================
// SUBSCRIPTIONS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_callback_is_never_invoked() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let sub = coordinator.subscribe(RefreshChannel::Overview, callback);
    sub.unsubscribe();

    coordinator.force_refresh(RefreshChannel::Overview);
    sleep(Duration::from_secs(31)).await;
    assert_eq!(calls(&count), 0);
}

#[tokio::test(start_paused = true)]
async fn test_every_subscriber_is_invoked_once() {
    let coordinator = coordinator();
    let (a, a_cb) = counter();
    let (b, b_cb) = counter();
    let _a = coordinator.subscribe(RefreshChannel::Charts, a_cb.clone());
    let _a_again = coordinator.subscribe(RefreshChannel::Charts, a_cb);
    let _b = coordinator.subscribe(RefreshChannel::Charts, b_cb);

    coordinator.force_refresh(RefreshChannel::Charts);
    assert_eq!((calls(&a), calls(&b)), (1, 1));
    assert_eq!(coordinator.subscriber_count(RefreshChannel::Charts), 2);
}

// ============================================================================
// ERRORS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_errors_accumulate_and_clear() {
    let coordinator = coordinator();
    coordinator.report_error(RefreshChannel::Overview, "first");
    coordinator.report_error(RefreshChannel::Overview, "second");

    let overview = coordinator.config(RefreshChannel::Overview);
    assert_eq!(overview.error_count, 2);
    assert_eq!(overview.last_error.as_deref(), Some("second"));

    coordinator.clear_errors(RefreshChannel::Overview);
    let overview = coordinator.config(RefreshChannel::Overview);
    assert_eq!(overview.error_count, 0);
    assert!(overview.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failing_charts_callback_reports_on_its_channel_only() {
    let coordinator = coordinator();
    let reporter = coordinator.clone();
    let callback = refresh_callback(move || {
        let reporter = reporter.clone();
        async move {
            reporter.report_error(
                RefreshChannel::Charts,
                "Request failed with status 500: Internal Server Error",
            );
        }
    });
    let _sub = coordinator.subscribe(RefreshChannel::Charts, callback);

    coordinator.force_refresh(RefreshChannel::Charts);
    settle().await;

    let charts = coordinator.config(RefreshChannel::Charts);
    assert_eq!(charts.error_count, 1);
    assert_eq!(
        charts.last_error.as_deref(),
        Some("Request failed with status 500: Internal Server Error")
    );
    assert_eq!(coordinator.config(RefreshChannel::Overview).error_count, 0);
    assert_eq!(coordinator.config(RefreshChannel::Table).error_count, 0);

    // Errors do not stop the schedule
    sleep(Duration::from_secs(61)).await;
    assert_eq!(coordinator.config(RefreshChannel::Charts).error_count, 2);
}

// ============================================================================
// RECONFIGURATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_interval_change_restarts_timer() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    sleep(Duration::from_secs(20)).await;
    coordinator.set_channel_config(
        RefreshChannel::Overview,
        RefreshUpdate::interval(Duration::from_secs(50)),
    );

    sleep(Duration::from_secs(49)).await;
    assert_eq!(calls(&count), 0);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(calls(&count), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_config_keeps_timer_phase() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    sleep(Duration::from_secs(20)).await;
    coordinator.set_channel_config(
        RefreshChannel::Overview,
        RefreshUpdate::enabled(true).with_interval(Duration::from_secs(30)),
    );

    sleep(Duration::from_secs(11)).await;
    assert_eq!(calls(&count), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reenabling_waits_a_full_interval() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Table, callback);

    coordinator.set_channel_config(RefreshChannel::Table, RefreshUpdate::enabled(false));
    sleep(Duration::from_secs(100)).await;
    coordinator.set_channel_config(RefreshChannel::Table, RefreshUpdate::enabled(true));

    sleep(Duration::from_secs(44)).await;
    assert_eq!(calls(&count), 0);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(calls(&count), 1);
}

// ============================================================================
// TEARDOWN
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_dropping_coordinator_stops_timers() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    drop(coordinator);
    sleep(Duration::from_secs(120)).await;
    assert_eq!(calls(&count), 0);

    // Unsubscribing after the coordinator is gone is harmless
    sub.unsubscribe();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_keeps_forced_refresh() {
    let coordinator = coordinator();
    let (count, callback) = counter();
    let _sub = coordinator.subscribe(RefreshChannel::Overview, callback);

    coordinator.shutdown();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(calls(&count), 0);

    // Re-enabling after shutdown does not bring timers back
    coordinator.resume_all();
    coordinator.set_channel_config(
        RefreshChannel::Overview,
        RefreshUpdate::interval(Duration::from_secs(10)),
    );
    sleep(Duration::from_secs(60)).await;
    assert_eq!(calls(&count), 0);

    coordinator.force_refresh(RefreshChannel::Overview);
    assert_eq!(calls(&count), 1);
}
