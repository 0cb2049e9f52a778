//! Overview metric cards

use super::{panel, ready_or_placeholder};
use crate::analytics::format::{format_cost, format_latency, group_thousands};
use crate::api::AggregatedMetrics;
use crate::dashboard::app::Loadable;
use crate::dashboard::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Total requests, total cost, tokens and average latency
pub struct OverviewCards<'a> {
    data: &'a Loadable<AggregatedMetrics>,
    theme: &'a Theme,
}

impl<'a> OverviewCards<'a> {
    pub fn new(data: &'a Loadable<AggregatedMetrics>, theme: &'a Theme) -> Self {
        Self { data, theme }
    }

    fn card(&self, title: &str, value: String, detail: String, color: Color, area: Rect, buf: &mut Buffer) {
        let block = panel(title, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(vec![
            Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(detail, Style::default().fg(self.theme.text_muted))),
        ])
        .alignment(Alignment::Center)
        .render(inner, buf);
    }
}

impl Widget for OverviewCards<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(metrics) = ready_or_placeholder(self.data, area, buf, self.theme) else {
            return;
        };

        let [requests, cost, tokens, latency] =
            Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(area);

        self.card(
            "Requests",
            group_thousands(metrics.total_requests),
            "in range".to_string(),
            self.theme.blue,
            requests,
            buf,
        );
        self.card(
            "Cost",
            format_cost(metrics.total_cost_usd),
            "USD".to_string(),
            self.theme.green,
            cost,
            buf,
        );
        self.card(
            "Tokens",
            group_thousands(metrics.total_input_tokens + metrics.total_output_tokens),
            format!(
                "in {} / out {}",
                group_thousands(metrics.total_input_tokens),
                group_thousands(metrics.total_output_tokens)
            ),
            self.theme.purple,
            tokens,
            buf,
        );
        self.card(
            "Avg latency",
            format_latency(metrics.average_latency),
            "per request".to_string(),
            self.theme.orange,
            latency,
            buf,
        );
    }
}
