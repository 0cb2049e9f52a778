//! Header with the active filters

use super::panel;
use crate::analytics::AnalyticsFilters;
use crate::dashboard::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Header widget
pub struct Header<'a> {
    filters: &'a AnalyticsFilters,
    /// Search text being edited, if the search box is focused
    search_draft: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(filters: &'a AnalyticsFilters, theme: &'a Theme) -> Self {
        Self {
            filters,
            search_draft: None,
            theme,
        }
    }

    /// Show the search box in edit mode
    pub fn editing_search(mut self, draft: Option<&'a str>) -> Self {
        self.search_draft = draft;
        self
    }

    fn field(&self, key: &'static str, label: &'static str, value: String) -> Vec<Span<'static>> {
        vec![
            Span::styled(
                format!("[{}] ", key),
                Style::default().fg(self.theme.text_muted),
            ),
            Span::styled(
                format!("{}: ", label),
                Style::default().fg(self.theme.text_secondary),
            ),
            Span::styled(value, Style::default().fg(self.theme.text_primary)),
            Span::raw("   "),
        ]
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel("Request analytics", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let (from, to) = self.filters.date_range;
        let range = format!(
            "{} days ({} to {})",
            self.filters.range_days(),
            from.format("%d %b"),
            to.format("%d %b %Y")
        );

        let mut filters = Vec::new();
        filters.extend(self.field("m", "Model", self.filters.model_label()));
        filters.extend(self.field("t", "Status", self.filters.status_label().to_string()));
        filters.extend(self.field("d", "Range", range));

        let search = match self.search_draft {
            Some(draft) => Line::from(vec![
                Span::styled("[/] ", Style::default().fg(self.theme.text_muted)),
                Span::styled("Chat ID: ", Style::default().fg(self.theme.text_secondary)),
                Span::styled(
                    format!("{}▏", draft),
                    Style::default()
                        .fg(self.theme.cyan)
                        .add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(
                    "  Enter apply, Esc cancel",
                    Style::default().fg(self.theme.text_muted),
                ),
            ]),
            None => {
                let value = if self.filters.search.trim().is_empty() {
                    "any".to_string()
                } else {
                    self.filters.search.trim().to_string()
                };
                Line::from(self.field("/", "Chat ID", value))
            }
        };

        Paragraph::new(vec![Line::from(filters), search]).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestStatus;
    use crate::dashboard::widgets::test_support::render_widget;
    use chrono::{TimeZone, Utc};

    fn filters() -> AnalyticsFilters {
        AnalyticsFilters::last_days(7, Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_shows_filter_labels() {
        let theme = Theme::default();
        let mut filters = filters();
        filters.status = Some(RequestStatus::Error);
        let output = render_widget(Header::new(&filters, &theme), 120, 4);

        assert!(output.contains("Model: All models"));
        assert!(output.contains("Status: Errors"));
        assert!(output.contains("Range: 7 days (23 Sep to 30 Sep 2025)"));
        assert!(output.contains("Chat ID: any"));
    }

    #[test]
    fn test_search_edit_mode() {
        let theme = Theme::default();
        let filters = filters();
        let widget = Header::new(&filters, &theme).editing_search(Some("chat-4"));
        let output = render_widget(widget, 120, 4);
        assert!(output.contains("Chat ID: chat-4▏"));
        assert!(output.contains("Enter apply"));
    }
}
