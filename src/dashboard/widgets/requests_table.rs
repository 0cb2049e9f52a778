//! Paginated requests table

use super::{panel, ready_or_placeholder};
use crate::analytics::format::{format_request_cost, group_thousands, truncate_width};
use crate::api::RequestEventListResponse;
use crate::dashboard::app::Loadable;
use crate::dashboard::theme::Theme;
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

/// Current page of request events
pub struct RequestsTable<'a> {
    data: &'a Loadable<RequestEventListResponse>,
    page: u32,
    total_pages: u64,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> RequestsTable<'a> {
    pub fn new(data: &'a Loadable<RequestEventListResponse>, theme: &'a Theme) -> Self {
        Self {
            data,
            page: 1,
            total_pages: 1,
            selected: 0,
            theme,
        }
    }

    pub fn page(mut self, page: u32, total_pages: u64) -> Self {
        self.page = page;
        self.total_pages = total_pages;
        self
    }

    pub fn selected(mut self, row: usize) -> Self {
        self.selected = row;
        self
    }
}

impl Widget for RequestsTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let total = self.data.ready().map(|page| page.total).unwrap_or(0);
        let title = format!(
            "Requests · {} total · page {}/{} (←/→)",
            group_thousands(total),
            self.page,
            self.total_pages
        );
        let block = panel(&title, self.theme);
        let inner = block.inner(area);

        let Some(response) = self.data.ready() else {
            block.render(area, buf);
            ready_or_placeholder(self.data, inner, buf, self.theme);
            return;
        };

        let theme = self.theme;
        let header = Row::new(
            ["Time", "Request", "Chat", "Model", "Tokens", "Cost", "Latency", "Status"]
                .into_iter()
                .map(|title| Cell::from(title).style(Style::default().fg(theme.text_secondary))),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = response
            .items
            .iter()
            .map(|item| {
                let status = Span::styled(
                    item.status.to_string(),
                    Style::default().fg(theme.status_color(item.status)),
                );
                Row::new(vec![
                    Cell::from(
                        item.originated_at
                            .with_timezone(&Local)
                            .format("%d %b %H:%M")
                            .to_string(),
                    ),
                    Cell::from(truncate_width(&item.request_id, 14)),
                    Cell::from(truncate_width(item.chat_id.as_deref().unwrap_or("-"), 14)),
                    Cell::from(truncate_width(&item.model, 16)),
                    Cell::from(group_thousands(item.total_tokens())),
                    Cell::from(format_request_cost(item.cost_usd)),
                    Cell::from(format!("{:.2}s", item.duration_seconds)),
                    Cell::from(Line::from(status)),
                ])
                .style(Style::default().fg(theme.text_primary))
            })
            .collect();

        if rows.is_empty() {
            Paragraph::new("No requests match the filters")
                .style(Style::default().fg(theme.text_muted))
                .alignment(Alignment::Center)
                .block(block)
                .render(area, buf);
            return;
        }

        let widths = [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Min(7),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(theme.border)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = TableState::default().with_selected(Some(self.selected));
        StatefulWidget::render(table, area, buf, &mut state);
    }
}
