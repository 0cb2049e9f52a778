//! Frame layout
//!
//! Top to bottom: header, refresh controls, overview cards, charts row,
//! requests table and the flash line. The details modal is drawn last on top.

use super::app::{AppState, InputMode, Screen};
use super::theme::Theme;
use super::widgets::{
    CostChart, DetailsModal, FlashLine, Header, LoginScreen, ModelsChart, OverviewCards,
    RefreshControls, RefreshSnapshot, RequestsTable, TokensChart,
};
use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

/// Draw the current screen
///
/// `refresh` is `None` while no session is running (login screen).
pub fn draw(frame: &mut Frame, state: &AppState, refresh: Option<&RefreshSnapshot>, theme: &Theme) {
    match (state.screen, refresh) {
        (Screen::Dashboard, Some(refresh)) => draw_dashboard(frame, state, refresh, theme),
        _ => draw_login(frame, state, theme),
    }
}

fn draw_login(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let widget = LoginScreen::new(state.login.password.chars().count(), theme)
        .error(state.login.error.as_deref());
    frame.render_widget(widget, frame.area());
}

fn draw_dashboard(frame: &mut Frame, state: &AppState, refresh: &RefreshSnapshot, theme: &Theme) {
    let controls = RefreshControls::new(refresh, theme)
        .selected(state.selected_channel)
        .settings_open(state.settings_open);

    let [header, controls_area, cards, charts, table, flash] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(controls.height()),
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let search_draft = (state.input_mode == InputMode::Search).then_some(state.search_draft.as_str());
    frame.render_widget(
        Header::new(&state.filters, theme).editing_search(search_draft),
        header,
    );
    frame.render_widget(controls, controls_area);
    frame.render_widget(OverviewCards::new(&state.data.overview, theme), cards);

    let [cost, tokens, models] = Layout::horizontal([
        Constraint::Percentage(35),
        Constraint::Percentage(35),
        Constraint::Percentage(30),
    ])
    .areas(charts);
    frame.render_widget(CostChart::new(&state.data.cost, theme), cost);
    frame.render_widget(TokensChart::new(&state.data.tokens, theme), tokens);
    frame.render_widget(ModelsChart::new(&state.data.models, theme), models);

    frame.render_widget(
        RequestsTable::new(&state.data.table, theme)
            .page(state.page, state.total_pages())
            .selected(state.selected_row),
        table,
    );
    frame.render_widget(FlashLine::new(state.flash.as_ref(), theme), flash);

    if state.details_open {
        if let Some(request) = state.selected_request() {
            frame.render_widget(DetailsModal::new(request, theme), frame.area());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AggregatedMetrics;
    use crate::config::Config;
    use crate::dashboard::app::PanelUpdate;
    use crate::refresh::{RefreshChannel, RefreshConfig};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(state: &AppState, refresh: Option<&RefreshSnapshot>) -> String {
        let backend = TestBackend::new(140, 48);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::default();
        terminal.draw(|f| draw(f, state, refresh, &theme)).unwrap();

        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..48 {
            for x in 0..140 {
                out.push_str(buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "));
            }
            out.push('\n');
        }
        out
    }

    fn snapshot() -> RefreshSnapshot {
        RefreshSnapshot {
            paused: false,
            channels: RefreshChannel::ALL
                .iter()
                .map(|c| (*c, RefreshConfig::new(c.default_interval())))
                .collect(),
        }
    }

    #[test]
    fn test_login_screen_without_session() {
        let state = AppState::new(&Config::default());
        let output = render(&state, None);
        assert!(output.contains("Password:"));
    }

    #[test]
    fn test_dashboard_layout() {
        let mut state = AppState::new(&Config::default());
        state.enter_dashboard();
        state.apply_update(PanelUpdate::Overview(Ok(AggregatedMetrics {
            total_requests: 12,
            ..AggregatedMetrics::default()
        })));

        let output = render(&state, Some(&snapshot()));
        assert!(output.contains("Request analytics"));
        assert!(output.contains("Auto-refresh"));
        assert!(output.contains("● Active"));
        assert!(output.contains("Cost per day"));
        assert!(output.contains("Models"));
        assert!(output.contains("page 1/1"));
        assert!(output.contains("r refresh"));
    }
}
