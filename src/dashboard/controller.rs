//! Dashboard controller
//!
//! Applies [`DashboardAction`]s to the session and its coordinator, drains
//! panel results into [`AppState`], and runs the terminal loop.

use super::app::{AppState, DashboardAction, Loadable, PanelData, PanelUpdate, Screen};
use super::events::{Event, EventHandler};
use super::renderer;
use super::session::{DashboardSession, PanelMessage, QueryGeneration, QueryState, SharedQuery};
use super::theme::Theme;
use super::widgets::RefreshSnapshot;
use crate::api::RequestSource;
use crate::auth::PasswordGate;
use crate::config::Config;
use crate::export::{export_to_dir, ExportKind};
use crate::refresh::{clamp_interval, RefreshChannel, RefreshUpdate, INTERVAL_STEP};
use anyhow::{Context, Result};
use crossterm::{
    event::KeyEvent,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::stdout;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub struct DashboardController {
    config: Config,
    gate: PasswordGate,
    source: Arc<dyn RequestSource>,
    state: AppState,
    query: SharedQuery,
    updates_tx: UnboundedSender<PanelMessage>,
    updates_rx: UnboundedReceiver<PanelMessage>,
    session: Option<DashboardSession>,
}

impl DashboardController {
    pub fn new(config: Config, source: Arc<dyn RequestSource>) -> Self {
        let state = AppState::new(&config);
        let query = Arc::new(RwLock::new(QueryState {
            filters: state.filters.clone(),
            page: state.page,
            page_size: state.page_size,
            generation: QueryGeneration::default(),
        }));
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        Self {
            gate: PasswordGate::new(config.auth.admin_password.clone()),
            config,
            source,
            state,
            query,
            updates_tx,
            updates_rx,
            session: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Running session, present between login and logout
    pub fn session(&self) -> Option<&DashboardSession> {
        self.session.as_ref()
    }

    /// Query the panels currently fetch with
    pub fn query(&self) -> QueryState {
        self.query
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn refresh_snapshot(&self) -> Option<RefreshSnapshot> {
        self.session
            .as_ref()
            .map(|session| RefreshSnapshot::capture(session.coordinator()))
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(action) = self.state.handle_key(key) {
            self.dispatch(action);
        }
    }

    /// Carry out an action
    pub fn dispatch(&mut self, action: DashboardAction) {
        tracing::debug!(?action, "Dashboard action");
        match action {
            DashboardAction::Quit => {
                self.end_session();
                self.state.should_quit = true;
            }
            DashboardAction::Login(attempt) => self.login(&attempt),
            DashboardAction::Logout => {
                self.end_session();
                self.state.leave_dashboard();
            }
            DashboardAction::FiltersChanged => {
                self.sync_query(true);
                self.state.data = PanelData::default();
                if let Some(session) = &self.session {
                    session.coordinator().force_refresh_all();
                }
            }
            DashboardAction::PageChanged => {
                self.sync_query(false);
                self.state.data.table = Loadable::Loading;
                if let Some(session) = &self.session {
                    session.coordinator().force_refresh(RefreshChannel::Table);
                }
            }
            DashboardAction::ExportRequests => self.spawn_export(ExportKind::Requests),
            DashboardAction::ExportSummary => self.spawn_export(ExportKind::Summary),
            action => {
                if let Some(session) = &self.session {
                    apply_refresh_action(session, action);
                }
            }
        }
    }

    /// Move finished panel results into the state; returns how many arrived
    pub fn drain_updates(&mut self) -> usize {
        let mut received = 0;
        let current = self.query().generation;
        while let Ok(message) = self.updates_rx.try_recv() {
            received += 1;
            // Late results of a session that already ended
            if self.state.screen != Screen::Dashboard {
                continue;
            }
            if message.is_stale(current) {
                tracing::debug!(
                    generation = ?message.generation,
                    ?current,
                    "Dropping stale panel result"
                );
                continue;
            }
            self.state.apply_update(message.update);
        }
        received
    }

    fn login(&mut self, attempt: &str) {
        if let Err(err) = self.gate.verify(attempt) {
            self.state.login_failed(err.to_string());
            return;
        }

        self.state.enter_dashboard();
        self.sync_query(true);
        self.session = Some(DashboardSession::start(
            self.config.refresh.defaults(),
            self.source.clone(),
            self.query.clone(),
            self.updates_tx.clone(),
        ));
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.end();
        }
    }

    // Publish filters and page to the panel callbacks; results fetched
    // under the previous generation are dropped from then on
    fn sync_query(&self, filters_changed: bool) {
        let mut query = self.query.write().unwrap_or_else(PoisonError::into_inner);
        let mut generation = query.generation;
        if filters_changed {
            generation.filters += 1;
        }
        generation.page += 1;
        *query = QueryState {
            filters: self.state.filters.clone(),
            page: self.state.page,
            page_size: self.state.page_size,
            generation,
        };
    }

    fn spawn_export(&self, kind: ExportKind) {
        if self.session.is_none() {
            return;
        }
        let source = self.source.clone();
        let query = self.query().base_query();
        let dir = self.config.dashboard.export_dir.clone();
        let updates = self.updates_tx.clone();

        tokio::spawn(async move {
            let result = export_to_dir(source.as_ref(), kind, &query, &dir).await;
            if let Err(err) = &result {
                tracing::warn!(?kind, "Export failed: {}", err);
            }
            let update = PanelUpdate::Export(result.map_err(|e| e.to_string()));
            let _ = updates.send(PanelMessage::unscoped(update));
        });
    }

    /// Run the interactive terminal loop until the user quits
    pub async fn run(mut self) -> Result<()> {
        if !crossterm::tty::IsTty::is_tty(&stdout()) {
            anyhow::bail!("The dashboard requires a real terminal (TTY).");
        }

        enable_raw_mode().context("Failed to enable terminal raw mode")?;
        let mut out = stdout();
        execute!(out, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(out)).context("Failed to create terminal backend")?;

        let theme = Theme::default();
        let events = EventHandler::default();
        let result = self.event_loop(&mut terminal, &events, &theme);

        disable_raw_mode().ok();
        execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();

        self.end_session();
        result
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &EventHandler,
        theme: &Theme,
    ) -> Result<()> {
        while !self.state.should_quit {
            self.drain_updates();

            let refresh = self.refresh_snapshot();
            terminal.draw(|frame| renderer::draw(frame, &self.state, refresh.as_ref(), theme))?;

            match events.next()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize(..) | Event::Tick => {}
            }
        }
        Ok(())
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.end_session();
    }
}

/// Actions that only touch the refresh schedule
fn apply_refresh_action(session: &DashboardSession, action: DashboardAction) {
    let coordinator = session.coordinator();
    match action {
        DashboardAction::ForceRefreshAll => coordinator.force_refresh_all(),
        DashboardAction::TogglePause => {
            if coordinator.is_paused() {
                coordinator.resume_all();
            } else if coordinator.is_any_enabled() {
                coordinator.pause_all();
            }
        }
        DashboardAction::ToggleAutoRefresh => {
            let enable = !coordinator.is_any_enabled();
            for channel in RefreshChannel::ALL {
                coordinator.set_channel_config(channel, RefreshUpdate::enabled(enable));
            }
        }
        DashboardAction::ToggleChannel(channel) => {
            let enabled = coordinator.config(channel).enabled;
            coordinator.set_channel_config(channel, RefreshUpdate::enabled(!enabled));
        }
        DashboardAction::AdjustInterval { channel, increase } => {
            let current = coordinator.config(channel).interval;
            let next = if increase {
                current.saturating_add(INTERVAL_STEP)
            } else {
                current.saturating_sub(INTERVAL_STEP)
            };
            coordinator.set_channel_config(channel, RefreshUpdate::interval(clamp_interval(next)));
        }
        DashboardAction::ClearErrors(channel) => coordinator.clear_errors(channel),
        _ => {}
    }
}
