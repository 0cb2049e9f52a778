//! Dashboard state and key handling
//!
//! `AppState` owns everything the renderer reads. Key presses either update
//! local state directly (selection, search text, modal) or produce a
//! [`DashboardAction`] that the controller applies to the coordinator.

use crate::analytics::filters::{next_model, next_range_preset, next_status};
use crate::analytics::format::page_count;
use crate::analytics::{AnalyticsFilters, CostPoint, ModelShare, TokensPoint};
use crate::api::{AggregatedMetrics, RequestEvent, RequestEventListResponse};
use crate::config::Config;
use crate::refresh::RefreshChannel;
use chrono::{Duration as ChronoDuration, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the chat id search box
    Search,
}

/// State of one panel's data
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }

    fn from_result(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(message) => Loadable::Failed(message),
        }
    }
}

/// Something the controller has to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    Quit,
    Login(String),
    Logout,
    ForceRefreshAll,
    TogglePause,
    /// Enable every channel, or disable all of them when any is enabled
    ToggleAutoRefresh,
    ToggleChannel(RefreshChannel),
    AdjustInterval {
        channel: RefreshChannel,
        increase: bool,
    },
    ClearErrors(RefreshChannel),
    FiltersChanged,
    PageChanged,
    ExportRequests,
    ExportSummary,
}

/// Result delivered by a panel fetch or an export task
#[derive(Debug, Clone)]
pub enum PanelUpdate {
    Overview(Result<AggregatedMetrics, String>),
    Cost(Result<Vec<CostPoint>, String>),
    Tokens(Result<Vec<TokensPoint>, String>),
    Models(Result<Vec<ModelShare>, String>),
    Table(Result<RequestEventListResponse, String>),
    Export(Result<PathBuf, String>),
}

/// Data of every panel
#[derive(Debug, Clone, Default)]
pub struct PanelData {
    pub overview: Loadable<AggregatedMetrics>,
    pub cost: Loadable<Vec<CostPoint>>,
    pub tokens: Loadable<Vec<TokensPoint>>,
    pub models: Loadable<Vec<ModelShare>>,
    pub table: Loadable<RequestEventListResponse>,
}

/// One-line message under the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub is_error: bool,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginState {
    pub password: String,
    pub error: Option<String>,
}

/// Everything the dashboard renders
#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub should_quit: bool,
    pub login: LoginState,
    pub input_mode: InputMode,
    pub filters: AnalyticsFilters,
    /// Models offered by the model selector
    pub known_models: Vec<String>,
    /// Current table page, starting at 1
    pub page: u32,
    pub page_size: u32,
    pub selected_row: usize,
    pub details_open: bool,
    pub settings_open: bool,
    pub selected_channel: RefreshChannel,
    /// Search text being typed, applied on Enter
    pub search_draft: String,
    pub data: PanelData,
    pub flash: Option<Flash>,
    default_range_days: i64,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let default_range_days = config.dashboard.default_range_days;
        Self {
            screen: Screen::Login,
            should_quit: false,
            login: LoginState::default(),
            input_mode: InputMode::Normal,
            filters: AnalyticsFilters::last_days(default_range_days, Utc::now()),
            known_models: config.dashboard.models.clone(),
            page: 1,
            page_size: config.dashboard.page_size,
            selected_row: 0,
            details_open: false,
            settings_open: false,
            selected_channel: RefreshChannel::Overview,
            search_draft: String::new(),
            data: PanelData::default(),
            flash: None,
            default_range_days,
        }
    }

    /// Switch to the dashboard with fresh filters and empty panels
    pub fn enter_dashboard(&mut self) {
        self.screen = Screen::Dashboard;
        self.login = LoginState::default();
        self.input_mode = InputMode::Normal;
        self.filters = AnalyticsFilters::last_days(self.default_range_days, Utc::now());
        self.search_draft.clear();
        self.page = 1;
        self.selected_row = 0;
        self.details_open = false;
        self.settings_open = false;
        self.selected_channel = RefreshChannel::Overview;
        self.data = PanelData::default();
        self.flash = None;
    }

    /// Back to the login screen
    pub fn leave_dashboard(&mut self) {
        self.screen = Screen::Login;
        self.login = LoginState::default();
        self.details_open = false;
        self.data = PanelData::default();
        self.flash = None;
    }

    /// Record a rejected login attempt
    pub fn login_failed(&mut self, message: impl Into<String>) {
        self.login.password.clear();
        self.login.error = Some(message.into());
    }

    /// Rows of the current table page, empty until it has loaded
    pub fn rows(&self) -> &[RequestEvent] {
        self.data
            .table
            .ready()
            .map(|page| page.items.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_request(&self) -> Option<&RequestEvent> {
        self.rows().get(self.selected_row)
    }

    pub fn total_pages(&self) -> u64 {
        let total = self.data.table.ready().map(|page| page.total).unwrap_or(0);
        page_count(total, self.page_size)
    }

    /// Row offset of the current page
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Store a panel result
    pub fn apply_update(&mut self, update: PanelUpdate) {
        match update {
            PanelUpdate::Overview(result) => self.data.overview = Loadable::from_result(result),
            PanelUpdate::Cost(result) => self.data.cost = Loadable::from_result(result),
            PanelUpdate::Tokens(result) => self.data.tokens = Loadable::from_result(result),
            PanelUpdate::Models(result) => self.data.models = Loadable::from_result(result),
            PanelUpdate::Table(result) => {
                self.data.table = Loadable::from_result(result);
                let rows = self.rows().len();
                self.selected_row = self.selected_row.min(rows.saturating_sub(1));
                if rows == 0 {
                    self.details_open = false;
                }
            }
            PanelUpdate::Export(Ok(path)) => {
                self.flash = Some(Flash::info(format!("Exported {}", path.display())));
            }
            PanelUpdate::Export(Err(message)) => {
                self.flash = Some(Flash::error(format!("Export failed: {}", message)));
            }
        }
    }

    /// Translate a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DashboardAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(DashboardAction::Quit);
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Dashboard => match self.input_mode {
                InputMode::Search => self.handle_search_key(key),
                InputMode::Normal if self.details_open => self.handle_details_key(key),
                InputMode::Normal => self.handle_dashboard_key(key),
            },
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Option<DashboardAction> {
        match key.code {
            KeyCode::Enter => Some(DashboardAction::Login(self.login.password.clone())),
            KeyCode::Esc => Some(DashboardAction::Quit),
            KeyCode::Backspace => {
                self.login.password.pop();
                None
            }
            KeyCode::Char(c) => {
                self.login.password.push(c);
                self.login.error = None;
                None
            }
            _ => None,
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Option<DashboardAction> {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                if self.search_draft.trim() == self.filters.search.trim() {
                    return None;
                }
                self.filters.search = self.search_draft.clone();
                Some(self.filters_changed())
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.search_draft = self.filters.search.clone();
                None
            }
            KeyCode::Backspace => {
                self.search_draft.pop();
                None
            }
            KeyCode::Char(c) => {
                self.search_draft.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_details_key(&mut self, key: KeyEvent) -> Option<DashboardAction> {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            self.details_open = false;
        }
        None
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Option<DashboardAction> {
        match key.code {
            KeyCode::Char('q') => Some(DashboardAction::Quit),
            KeyCode::Char('r') => Some(DashboardAction::ForceRefreshAll),
            KeyCode::Char('p') => Some(DashboardAction::TogglePause),
            KeyCode::Char('a') => Some(DashboardAction::ToggleAutoRefresh),
            KeyCode::Char('s') => {
                self.settings_open = !self.settings_open;
                None
            }
            KeyCode::Tab => {
                self.selected_channel = self.selected_channel.next();
                None
            }
            KeyCode::Char(' ') if self.settings_open => {
                Some(DashboardAction::ToggleChannel(self.selected_channel))
            }
            KeyCode::Char('+') | KeyCode::Char('=') => Some(DashboardAction::AdjustInterval {
                channel: self.selected_channel,
                increase: true,
            }),
            KeyCode::Char('-') => Some(DashboardAction::AdjustInterval {
                channel: self.selected_channel,
                increase: false,
            }),
            KeyCode::Char('c') => Some(DashboardAction::ClearErrors(self.selected_channel)),
            KeyCode::Char('m') => {
                let next = next_model(&self.filters, &self.known_models).map(str::to_string);
                self.filters.select_model(next.as_deref());
                Some(self.filters_changed())
            }
            KeyCode::Char('t') => {
                self.filters.status = next_status(self.filters.status);
                Some(self.filters_changed())
            }
            KeyCode::Char('d') => {
                let days = next_range_preset(self.filters.range_days());
                let now = Utc::now();
                self.filters.set_date_range(now - ChronoDuration::days(days), now);
                Some(self.filters_changed())
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.search_draft = self.filters.search.clone();
                None
            }
            KeyCode::Up => {
                self.selected_row = self.selected_row.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if self.selected_row + 1 < self.rows().len() {
                    self.selected_row += 1;
                }
                None
            }
            KeyCode::Left => self.go_to_page(self.page.saturating_sub(1)),
            KeyCode::Right => self.go_to_page(self.page.saturating_add(1)),
            KeyCode::Enter => {
                self.details_open = self.selected_request().is_some();
                None
            }
            KeyCode::Esc => {
                self.flash = None;
                None
            }
            KeyCode::Char('e') => Some(DashboardAction::ExportRequests),
            KeyCode::Char('E') => Some(DashboardAction::ExportSummary),
            KeyCode::Char('L') => Some(DashboardAction::Logout),
            _ => None,
        }
    }

    // Any filter change starts over from the first page
    fn filters_changed(&mut self) -> DashboardAction {
        self.page = 1;
        self.selected_row = 0;
        self.details_open = false;
        DashboardAction::FiltersChanged
    }

    fn go_to_page(&mut self, page: u32) -> Option<DashboardAction> {
        if page == 0 || u64::from(page) > self.total_pages() || page == self.page {
            return None;
        }
        self.page = page;
        self.selected_row = 0;
        Some(DashboardAction::PageChanged)
    }
}
