//! One-line message bar with key hints

use crate::dashboard::app::Flash;
use crate::dashboard::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

const HINTS: &str = "r refresh  p pause  a auto  s settings  m/t/d filters  / search  e/E export  L logout  q quit";

/// Shows the last export result, or the key hints when there is none
pub struct FlashLine<'a> {
    flash: Option<&'a Flash>,
    theme: &'a Theme,
}

impl<'a> FlashLine<'a> {
    pub fn new(flash: Option<&'a Flash>, theme: &'a Theme) -> Self {
        Self { flash, theme }
    }
}

impl Widget for FlashLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = match self.flash {
            Some(flash) => {
                let (icon, color) = if flash.is_error {
                    ("✗ ", self.theme.red)
                } else {
                    ("✓ ", self.theme.green)
                };
                Line::from(vec![
                    Span::styled(icon, Style::default().fg(color)),
                    Span::styled(flash.message.clone(), Style::default().fg(color)),
                    Span::styled("  (Esc to dismiss)", Style::default().fg(self.theme.text_muted)),
                ])
            }
            None => Line::from(Span::styled(HINTS, Style::default().fg(self.theme.text_muted))),
        };

        Paragraph::new(line)
            .style(Style::default().bg(self.theme.bg_dark))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::widgets::test_support::render_widget;

    #[test]
    fn test_hints_without_flash() {
        let theme = Theme::default();
        let output = render_widget(FlashLine::new(None, &theme), 120, 1);
        assert!(output.contains("r refresh"));
    }

    #[test]
    fn test_flash_message() {
        let theme = Theme::default();
        let flash = Flash::info("Exported out/analytics_summary.csv");
        let output = render_widget(FlashLine::new(Some(&flash), &theme), 120, 1);
        assert!(output.contains("✓ Exported out/analytics_summary.csv"));
    }
}
