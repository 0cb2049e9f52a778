//! Auto-refresh status, error alerts and interval settings

use super::panel;
use crate::dashboard::theme::Theme;
use crate::refresh::{RefreshChannel, RefreshConfig, RefreshCoordinator};
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Copy of the coordinator state taken once per frame
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSnapshot {
    pub paused: bool,
    pub channels: Vec<(RefreshChannel, RefreshConfig)>,
}

impl RefreshSnapshot {
    pub fn capture(coordinator: &RefreshCoordinator) -> Self {
        Self {
            paused: coordinator.is_paused(),
            channels: RefreshChannel::ALL
                .iter()
                .map(|channel| (*channel, coordinator.config(*channel)))
                .collect(),
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.channels.iter().any(|(_, config)| config.enabled)
    }

    fn failing(&self) -> impl Iterator<Item = &(RefreshChannel, RefreshConfig)> {
        self.channels.iter().filter(|(_, config)| config.has_errors())
    }
}

/// Refresh controls panel
pub struct RefreshControls<'a> {
    snapshot: &'a RefreshSnapshot,
    selected: RefreshChannel,
    settings_open: bool,
    theme: &'a Theme,
}

impl<'a> RefreshControls<'a> {
    pub fn new(snapshot: &'a RefreshSnapshot, theme: &'a Theme) -> Self {
        Self {
            snapshot,
            selected: RefreshChannel::Overview,
            settings_open: false,
            theme,
        }
    }

    pub fn selected(mut self, channel: RefreshChannel) -> Self {
        self.selected = channel;
        self
    }

    pub fn settings_open(mut self, open: bool) -> Self {
        self.settings_open = open;
        self
    }

    /// Rows needed including borders
    pub fn height(&self) -> u16 {
        let errors = self.snapshot.failing().count() as u16;
        let settings = if self.settings_open {
            self.snapshot.channels.len() as u16
        } else {
            0
        };
        3 + errors + settings
    }

    fn badge(&self) -> Span<'static> {
        let (label, color) = if !self.snapshot.any_enabled() {
            ("● Off", self.theme.text_muted)
        } else if self.snapshot.paused {
            ("● Paused", self.theme.yellow)
        } else {
            ("● Active", self.theme.green)
        };
        Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    }

    fn status_line(&self) -> Line<'static> {
        let mut spans = vec![self.badge(), Span::raw("   ")];
        for (channel, config) in &self.snapshot.channels {
            let color = if config.has_errors() {
                self.theme.red
            } else if config.enabled {
                self.theme.text_primary
            } else {
                self.theme.text_muted
            };
            let last = config
                .last_refresh
                .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string());
            spans.push(Span::styled(
                format!("{} ", channel.label()),
                Style::default().fg(color),
            ));
            spans.push(Span::styled(
                format!("{}s · {}   ", config.interval_secs(), last),
                Style::default().fg(self.theme.text_muted),
            ));
        }
        Line::from(spans)
    }

    fn error_line(&self, channel: RefreshChannel, config: &RefreshConfig) -> Line<'static> {
        let message = config.last_error.clone().unwrap_or_default();
        Line::from(vec![
            Span::styled("⚠ ", Style::default().fg(self.theme.red)),
            Span::styled(
                format!("{}: ", channel.label()),
                Style::default().fg(self.theme.red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(message, Style::default().fg(self.theme.red)),
            Span::styled(
                format!("  ({} consecutive, c to clear)", config.error_count),
                Style::default().fg(self.theme.text_muted),
            ),
        ])
    }

    fn settings_line(&self, channel: RefreshChannel, config: &RefreshConfig) -> Line<'static> {
        let selected = channel == self.selected;
        let marker = if selected { "▶ " } else { "  " };
        let check = if config.enabled { "[x]" } else { "[ ]" };
        let fg: Color = if selected {
            self.theme.border_focused
        } else {
            self.theme.text_secondary
        };
        Line::from(vec![
            Span::styled(marker, Style::default().fg(fg)),
            Span::styled(format!("{} {:<9}", check, channel.label()), Style::default().fg(fg)),
            Span::styled(
                format!("every {}s", config.interval_secs()),
                Style::default().fg(self.theme.text_primary),
            ),
            Span::styled(
                if selected { "   Space toggle, +/- 5s" } else { "" },
                Style::default().fg(self.theme.text_muted),
            ),
        ])
    }
}

impl Widget for RefreshControls<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel("Auto-refresh", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![self.status_line()];
        for (channel, config) in self.snapshot.failing() {
            lines.push(self.error_line(*channel, config));
        }
        if self.settings_open {
            for (channel, config) in &self.snapshot.channels {
                lines.push(self.settings_line(*channel, config));
            }
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
