//! Panel subscriptions for one login session
//!
//! A session owns the refresh coordinator and one subscription per panel
//! fetch. Callbacks read the shared query state when they fire, so filter
//! and page changes apply to the next refresh without re-subscribing.

use super::app::PanelUpdate;
use crate::analytics::charts::{cost_by_day, model_distribution, tokens_by_day};
use crate::analytics::AnalyticsFilters;
use crate::api::{ApiError, RequestQuery, RequestSource};
use crate::refresh::{
    refresh_callback, RefreshCallback, RefreshChannel, RefreshCoordinator, RefreshDefaults,
    Subscription,
};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc::UnboundedSender;

/// Revision counters of the query state
///
/// `filters` moves whenever the filters change or a new session starts;
/// `page` moves on every change, including page changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryGeneration {
    pub filters: u64,
    pub page: u64,
}

/// Filters and page the panels fetch with
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub filters: AnalyticsFilters,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub generation: QueryGeneration,
}

impl QueryState {
    /// Query shared by overview and charts
    pub fn base_query(&self) -> RequestQuery {
        self.filters.to_query(self.page_size, 0)
    }

    /// Query of the current table page
    pub fn table_query(&self) -> RequestQuery {
        let offset = self.page.saturating_sub(1).saturating_mul(self.page_size);
        self.filters.to_query(self.page_size, offset)
    }
}

pub type SharedQuery = Arc<RwLock<QueryState>>;

/// A [`PanelUpdate`] plus the query generation it was fetched under
///
/// Exports carry no generation and are never stale.
#[derive(Debug, Clone)]
pub struct PanelMessage {
    pub generation: Option<QueryGeneration>,
    pub update: PanelUpdate,
}

impl PanelMessage {
    pub fn fetched(generation: QueryGeneration, update: PanelUpdate) -> Self {
        Self {
            generation: Some(generation),
            update,
        }
    }

    pub fn unscoped(update: PanelUpdate) -> Self {
        Self {
            generation: None,
            update,
        }
    }

    /// Whether the query this result answers has since been replaced
    ///
    /// The table depends on filters and page; every other panel only on
    /// the filters.
    pub fn is_stale(&self, current: QueryGeneration) -> bool {
        match (self.generation, &self.update) {
            (None, _) => false,
            (Some(generation), PanelUpdate::Table(_)) => generation != current,
            (Some(generation), _) => generation.filters != current.filters,
        }
    }
}

/// Read the query state at fire time
fn snapshot(query: &SharedQuery) -> QueryState {
    query.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Coordinator plus the subscriptions of every panel
pub struct DashboardSession {
    coordinator: RefreshCoordinator,
    subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("coordinator", &self.coordinator)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl DashboardSession {
    /// Create the coordinator, subscribe every panel and load them once
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        defaults: RefreshDefaults,
        source: Arc<dyn RequestSource>,
        query: SharedQuery,
        updates: UnboundedSender<PanelMessage>,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(defaults);
        let panels = PanelFetcher {
            coordinator: coordinator.clone(),
            source,
            query,
            updates,
        };

        let subscriptions = vec![
            coordinator.subscribe(RefreshChannel::Overview, panels.overview()),
            coordinator.subscribe(RefreshChannel::Charts, panels.cost_chart()),
            coordinator.subscribe(RefreshChannel::Charts, panels.tokens_chart()),
            coordinator.subscribe(RefreshChannel::Charts, panels.models_chart()),
            coordinator.subscribe(RefreshChannel::Table, panels.table()),
        ];
        tracing::info!(subscriptions = subscriptions.len(), "Dashboard session started");

        coordinator.force_refresh_all();
        Self {
            coordinator,
            subscriptions,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Unsubscribe every panel and stop the timers
    pub fn end(self) {
        drop(self);
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        // Callbacks hold a coordinator handle; releasing them breaks the cycle
        self.subscriptions.clear();
        self.coordinator.shutdown();
        tracing::info!("Dashboard session ended");
    }
}

/// Builds the panel callbacks
#[derive(Clone)]
struct PanelFetcher {
    coordinator: RefreshCoordinator,
    source: Arc<dyn RequestSource>,
    query: SharedQuery,
    updates: UnboundedSender<PanelMessage>,
}

impl PanelFetcher {
    /// Wrap a fetch so its outcome is recorded on `channel` and delivered
    fn callback<F, Fut, T>(
        &self,
        channel: RefreshChannel,
        fetch: F,
        deliver: fn(Result<T, String>) -> PanelUpdate,
    ) -> RefreshCallback
    where
        F: Fn(Arc<dyn RequestSource>, QueryState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
    {
        let panels = self.clone();
        refresh_callback(move || {
            let query = snapshot(&panels.query);
            let generation = query.generation;
            let fut = fetch(panels.source.clone(), query);
            let coordinator = panels.coordinator.clone();
            let updates = panels.updates.clone();
            async move {
                let result = fut.await.map_err(|e| e.to_string());
                match &result {
                    Ok(_) => coordinator.clear_errors(channel),
                    Err(message) => coordinator.report_error(channel, message.clone()),
                }
                // The receiver is gone once the dashboard has closed
                let _ = updates.send(PanelMessage::fetched(generation, deliver(result)));
            }
        })
    }

    fn overview(&self) -> RefreshCallback {
        self.callback(
            RefreshChannel::Overview,
            |source, query| async move { source.fetch_aggregates(&query.base_query()).await },
            PanelUpdate::Overview,
        )
    }

    fn cost_chart(&self) -> RefreshCallback {
        self.callback(
            RefreshChannel::Charts,
            |source, query| async move {
                let sample = source.fetch_sample(&query.base_query()).await?;
                Ok::<_, ApiError>(cost_by_day(&sample.items))
            },
            PanelUpdate::Cost,
        )
    }

    fn tokens_chart(&self) -> RefreshCallback {
        self.callback(
            RefreshChannel::Charts,
            |source, query| async move {
                let sample = source.fetch_sample(&query.base_query()).await?;
                Ok::<_, ApiError>(tokens_by_day(&sample.items))
            },
            PanelUpdate::Tokens,
        )
    }

    fn models_chart(&self) -> RefreshCallback {
        self.callback(
            RefreshChannel::Charts,
            |source, query| async move {
                let sample = source.fetch_sample(&query.base_query()).await?;
                Ok::<_, ApiError>(model_distribution(&sample.items))
            },
            PanelUpdate::Models,
        )
    }

    fn table(&self) -> RefreshCallback {
        self.callback(
            RefreshChannel::Table,
            |source, query| async move { source.list_requests(&query.table_query()).await },
            PanelUpdate::Table,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AggregatedMetrics;

    fn generation(filters: u64, page: u64) -> QueryGeneration {
        QueryGeneration { filters, page }
    }

    #[test]
    fn test_page_change_only_outdates_table() {
        let current = generation(1, 2);
        let overview = PanelMessage::fetched(
            generation(1, 1),
            PanelUpdate::Overview(Ok(AggregatedMetrics::default())),
        );
        let old_table = PanelMessage::fetched(generation(1, 1), PanelUpdate::Table(Err("x".into())));
        let new_table = PanelMessage::fetched(current, PanelUpdate::Table(Err("x".into())));

        assert!(!overview.is_stale(current));
        assert!(old_table.is_stale(current));
        assert!(!new_table.is_stale(current));
    }

    #[test]
    fn test_filter_change_outdates_every_panel() {
        let current = generation(2, 2);
        let models = PanelMessage::fetched(generation(1, 1), PanelUpdate::Models(Ok(Vec::new())));
        assert!(models.is_stale(current));
    }

    #[test]
    fn test_exports_are_never_stale() {
        let export = PanelMessage::unscoped(PanelUpdate::Export(Err("No data to export".into())));
        assert!(!export.is_stale(generation(9, 9)));
    }
}
