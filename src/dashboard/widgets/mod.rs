//! Dashboard widgets
//!
//! Each widget borrows what it shows plus the [`Theme`] and renders itself
//! into a buffer area, so it can be tested with a `TestBackend` alone.

mod charts;
mod details_modal;
mod flash_line;
mod header;
mod login;
mod overview_cards;
mod refresh_controls;
mod requests_table;

pub use charts::{CostChart, ModelsChart, TokensChart};
pub use details_modal::DetailsModal;
pub use flash_line::FlashLine;
pub use header::Header;
pub use login::LoginScreen;
pub use overview_cards::OverviewCards;
pub use refresh_controls::{RefreshControls, RefreshSnapshot};
pub use requests_table::RequestsTable;

use super::app::Loadable;
use super::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::Line,
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

/// Rounded panel frame with a title
pub(crate) fn panel<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Line::from(format!(" {} ", title)).style(Style::default().fg(theme.text_primary)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.bg_main))
}

/// Render the loading or error text of a panel that has no data yet
///
/// Returns the data when there is some to draw.
pub(crate) fn ready_or_placeholder<'d, T>(
    data: &'d Loadable<T>,
    area: Rect,
    buf: &mut Buffer,
    theme: &Theme,
) -> Option<&'d T> {
    let (text, color) = match data {
        Loadable::Ready(value) => return Some(value),
        Loadable::Loading => ("Loading…".to_string(), theme.text_muted),
        Loadable::Failed(message) => (format!("Error: {}", message), theme.red),
    };
    Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .render(area, buf);
    None
}

/// Centered rectangle of at most `width` x `height` inside `area`
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
