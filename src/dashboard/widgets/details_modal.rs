//! Request details modal

use super::{centered_rect, panel};
use crate::analytics::format::{format_request_cost, group_thousands};
use crate::api::RequestEvent;
use crate::dashboard::theme::Theme;
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget, Wrap},
};

/// Longest prompt/response excerpt shown in the modal
const RAW_PREVIEW_CHARS: usize = 600;

/// Every field of one request event
pub struct DetailsModal<'a> {
    request: &'a RequestEvent,
    theme: &'a Theme,
}

impl<'a> DetailsModal<'a> {
    pub fn new(request: &'a RequestEvent, theme: &'a Theme) -> Self {
        Self { request, theme }
    }

    fn field(&self, label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{:<16}", label),
                Style::default().fg(self.theme.text_secondary),
            ),
            Span::styled(value, Style::default().fg(self.theme.text_primary)),
        ])
    }

    fn section(&self, title: &str) -> Line<'static> {
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(self.theme.cyan)
                .add_modifier(Modifier::BOLD),
        ))
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let r = self.request;
        let local = |at: chrono::DateTime<chrono::Utc>| {
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
        };
        let optional = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

        let mut lines = vec![
            self.field("Request ID", r.request_id.clone()),
            self.field("Originated", local(r.originated_at)),
            self.field("Chat ID", optional(r.chat_id.clone())),
            self.field("Message ID", optional(r.message_id.map(|id| id.to_string()))),
            self.field("Tile ID", optional(r.tile_id.clone())),
            Line::from(vec![
                Span::styled(
                    format!("{:<16}", "Status"),
                    Style::default().fg(self.theme.text_secondary),
                ),
                Span::styled(
                    r.status.to_string(),
                    Style::default()
                        .fg(self.theme.status_color(r.status))
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            self.field("Model", r.model.clone()),
            self.field("Duration", format!("{:.2}s", r.duration_seconds)),
            self.field(
                "Tokens",
                format!(
                    "{} in / {} out / {} total",
                    group_thousands(r.input_tokens),
                    group_thousands(r.output_tokens),
                    group_thousands(r.total_tokens())
                ),
            ),
            self.field("Cost", format_request_cost(r.cost_usd)),
            self.field("Created", local(r.created_at)),
        ];
        if let Some(updated) = r.updated_at {
            lines.push(self.field("Updated", local(updated)));
        }

        if !r.numbers().is_empty() {
            lines.push(Line::from(""));
            lines.push(self.section("Extracted numbers"));
            lines.push(Line::from(r.numbers().join(", ")));
        }

        if r.has_error_details() {
            lines.push(Line::from(""));
            lines.push(self.section("Error"));
            let payload = r
                .error_payload
                .as_ref()
                .and_then(|payload| serde_json::to_string_pretty(payload).ok())
                .unwrap_or_default();
            lines.extend(payload.lines().map(|line| {
                Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(self.theme.red),
                ))
            }));
        }

        for (title, raw) in [("Prompt", &r.raw_prompt), ("Response", &r.raw_response)] {
            if let Some(raw) = raw.as_deref().filter(|raw| !raw.is_empty()) {
                lines.push(Line::from(""));
                lines.push(self.section(title));
                lines.extend(preview(raw).lines().map(|line| Line::from(line.to_string())));
            }
        }

        lines
    }
}

fn preview(raw: &str) -> String {
    if raw.chars().count() <= RAW_PREVIEW_CHARS {
        return raw.to_string();
    }
    let mut cut: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

impl Widget for DetailsModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (area.width * 4 / 5).max(40);
        let height = (area.height * 4 / 5).max(12);
        let modal = centered_rect(width, height, area);
        Clear.render(modal, buf);

        let block = panel("Request details · Esc to close", self.theme)
            .border_style(Style::default().fg(self.theme.border_focused));
        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(modal, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestStatus;
    use crate::dashboard::widgets::test_support::render_widget;
    use chrono::{TimeZone, Utc};

    fn failed_request() -> RequestEvent {
        let at = Utc.with_ymd_and_hms(2025, 9, 25, 10, 15, 0).unwrap();
        RequestEvent {
            id: 9,
            request_id: "req-9".to_string(),
            originated_at: at,
            chat_id: Some("chat-1".to_string()),
            message_id: Some(77),
            tile_id: None,
            model: "gpt-4o".to_string(),
            duration_seconds: 2.5,
            input_tokens: 1200,
            output_tokens: 0,
            cost_usd: 0.0031,
            status: RequestStatus::Error,
            numbers: Some(vec!["3".into(), "14".into()]),
            error_payload: Some(serde_json::json!({"code": "rate_limited"})),
            raw_prompt: Some("How many tiles?".to_string()),
            raw_response: None,
            created_at: at,
            updated_at: None,
        }
    }

    #[test]
    fn test_shows_fields_and_error_payload() {
        let theme = Theme::default();
        let request = failed_request();
        let output = render_widget(DetailsModal::new(&request, &theme), 100, 40);

        assert!(output.contains("req-9"));
        assert!(output.contains("77"));
        assert!(output.contains("1 200 in / 0 out / 1 200 total"));
        assert!(output.contains("$0.0031"));
        assert!(output.contains("3, 14"));
        assert!(output.contains("rate_limited"));
        assert!(output.contains("How many tiles?"));
        assert!(!output.contains("Response"));
    }

    #[test]
    fn test_preview_is_bounded() {
        let long = "x".repeat(RAW_PREVIEW_CHARS + 10);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), RAW_PREVIEW_CHARS + 1);
        assert!(cut.ends_with('…'));
    }
}
