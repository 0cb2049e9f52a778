//! Login screen

use super::{centered_rect, panel};
use crate::dashboard::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget},
};

/// Password prompt shown before the dashboard
pub struct LoginScreen<'a> {
    /// Characters typed so far (only the count is shown)
    password_len: usize,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> LoginScreen<'a> {
    pub fn new(password_len: usize, theme: &'a Theme) -> Self {
        Self {
            password_len,
            error: None,
            theme,
        }
    }

    pub fn error(mut self, error: Option<&'a str>) -> Self {
        self.error = error;
        self
    }
}

impl Widget for LoginScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        buf.set_style(area, Style::default().bg(theme.bg_dark));

        let dialog = centered_rect(46, 9, area);
        Clear.render(dialog, buf);
        let block = panel("reqdash", theme).border_style(Style::default().fg(theme.border_focused));
        let inner = block.inner(dialog);
        block.render(dialog, buf);

        let masked = "•".repeat(self.password_len);
        let mut lines = vec![
            Line::from(Span::styled(
                "Analytics dashboard",
                Style::default()
                    .fg(theme.text_primary)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Password: ", Style::default().fg(theme.text_secondary)),
                Span::styled(masked, Style::default().fg(theme.cyan)),
                Span::styled("▏", Style::default().fg(theme.cyan)),
            ]),
            Line::from(""),
        ];

        match self.error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(theme.red),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter to sign in, Esc to quit",
                Style::default().fg(theme.text_muted),
            ))),
        }

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}
