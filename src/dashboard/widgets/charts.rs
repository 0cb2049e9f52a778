//! Charts row: cost per day, tokens per day, model distribution

use super::{panel, ready_or_placeholder};
use crate::analytics::format::{format_cost, truncate_width};
use crate::analytics::{CostPoint, ModelShare, TokensPoint};
use crate::dashboard::app::Loadable;
use crate::dashboard::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Direction, Rect},
    style::Style,
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Paragraph, Widget},
};

const DAY_BAR_WIDTH: u16 = 6;
const MODEL_LABEL_WIDTH: usize = 14;

/// Number of the most recent points that fit into `width` columns
fn visible<T>(points: &[T], width: u16, slot: u16) -> &[T] {
    let fits = usize::from((width / slot.max(1)).max(1));
    &points[points.len().saturating_sub(fits)..]
}

fn render_empty(block: Block<'_>, area: Rect, buf: &mut Buffer, theme: &Theme) {
    Paragraph::new("No data for the selected filters")
        .style(Style::default().fg(theme.text_muted))
        .alignment(Alignment::Center)
        .block(block)
        .render(area, buf);
}

/// Daily cost bars, values in dollars
pub struct CostChart<'a> {
    data: &'a Loadable<Vec<CostPoint>>,
    theme: &'a Theme,
}

impl<'a> CostChart<'a> {
    pub fn new(data: &'a Loadable<Vec<CostPoint>>, theme: &'a Theme) -> Self {
        Self { data, theme }
    }
}

impl Widget for CostChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel("Cost per day", self.theme);
        let inner = block.inner(area);
        let Some(points) = self.data.ready() else {
            block.render(area, buf);
            ready_or_placeholder(self.data, inner, buf, self.theme);
            return;
        };
        if points.is_empty() {
            return render_empty(block, area, buf, self.theme);
        }

        let bars: Vec<Bar> = visible(points, inner.width, DAY_BAR_WIDTH + 1)
            .iter()
            .map(|point| {
                Bar::default()
                    // Bars need integers; cents keep the proportions
                    .value((point.cost * 100.0).round().max(0.0) as u64)
                    .text_value(format_cost(point.cost))
                    .label(Line::from(point.label()))
                    .style(Style::default().fg(self.theme.green))
            })
            .collect();

        BarChart::default()
            .block(block)
            .bar_width(DAY_BAR_WIDTH)
            .bar_gap(1)
            .value_style(Style::default().fg(self.theme.bg_dark).bg(self.theme.green))
            .label_style(Style::default().fg(self.theme.text_secondary))
            .data(BarGroup::default().bars(&bars))
            .render(area, buf);
    }
}

/// Daily input and output tokens, one group per day
pub struct TokensChart<'a> {
    data: &'a Loadable<Vec<TokensPoint>>,
    theme: &'a Theme,
}

impl<'a> TokensChart<'a> {
    pub fn new(data: &'a Loadable<Vec<TokensPoint>>, theme: &'a Theme) -> Self {
        Self { data, theme }
    }
}

impl Widget for TokensChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel("Tokens per day (in / out)", self.theme);
        let inner = block.inner(area);
        let Some(points) = self.data.ready() else {
            block.render(area, buf);
            ready_or_placeholder(self.data, inner, buf, self.theme);
            return;
        };
        if points.is_empty() {
            return render_empty(block, area, buf, self.theme);
        }

        // Two bars of width 3 plus a gap of 1 and a group gap of 1
        let mut chart = BarChart::default()
            .block(block)
            .bar_width(3)
            .bar_gap(1)
            .group_gap(1)
            .label_style(Style::default().fg(self.theme.text_secondary));

        for point in visible(points, inner.width, 8) {
            let bars = [
                Bar::default()
                    .value(point.input_tokens)
                    .text_value(String::new())
                    .style(Style::default().fg(self.theme.blue)),
                Bar::default()
                    .value(point.output_tokens)
                    .text_value(String::new())
                    .style(Style::default().fg(self.theme.purple)),
            ];
            chart = chart.data(
                BarGroup::default()
                    .label(Line::from(point.date.format("%d").to_string()))
                    .bars(&bars),
            );
        }

        chart.render(area, buf);
    }
}

/// Requests per model as horizontal bars
pub struct ModelsChart<'a> {
    data: &'a Loadable<Vec<ModelShare>>,
    theme: &'a Theme,
}

impl<'a> ModelsChart<'a> {
    pub fn new(data: &'a Loadable<Vec<ModelShare>>, theme: &'a Theme) -> Self {
        Self { data, theme }
    }
}

impl Widget for ModelsChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel("Models", self.theme);
        let inner = block.inner(area);
        let Some(shares) = self.data.ready() else {
            block.render(area, buf);
            ready_or_placeholder(self.data, inner, buf, self.theme);
            return;
        };
        if shares.is_empty() {
            return render_empty(block, area, buf, self.theme);
        }

        let palette = [
            self.theme.blue,
            self.theme.green,
            self.theme.purple,
            self.theme.yellow,
            self.theme.cyan,
            self.theme.orange,
        ];
        let rows = usize::from(inner.height.max(1));
        let bars: Vec<Bar> = shares
            .iter()
            .take(rows)
            .enumerate()
            .map(|(i, share)| {
                Bar::default()
                    .value(share.count)
                    .label(Line::from(truncate_width(&share.name, MODEL_LABEL_WIDTH)))
                    .style(Style::default().fg(palette[i % palette.len()]))
            })
            .collect();

        BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .label_style(Style::default().fg(self.theme.text_secondary))
            .value_style(Style::default().fg(self.theme.text_primary))
            .data(BarGroup::default().bars(&bars))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::widgets::test_support::render_widget;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    #[test]
    fn test_visible_keeps_latest_points() {
        let points = [1, 2, 3, 4, 5];
        assert_eq!(visible(&points, 14, 7), &[4, 5]);
        assert_eq!(visible(&points, 100, 7), &points);
        assert_eq!(visible(&points, 0, 7), &[5]);
    }

    #[test]
    fn test_cost_chart_labels() {
        let theme = Theme::default();
        let data = Loadable::Ready(vec![
            CostPoint { date: day(4), cost: 1.5 },
            CostPoint { date: day(5), cost: 3.25 },
        ]);
        let output = render_widget(CostChart::new(&data, &theme), 40, 10);
        assert!(output.contains("Cost per day"));
        assert!(output.contains("04 Sep"));
        assert!(output.contains("05 Sep"));
    }

    #[test]
    fn test_tokens_chart_day_labels() {
        let theme = Theme::default();
        let data = Loadable::Ready(vec![TokensPoint {
            date: day(7),
            input_tokens: 300,
            output_tokens: 120,
        }]);
        let output = render_widget(TokensChart::new(&data, &theme), 40, 10);
        assert!(output.contains("Tokens per day"));
        assert!(output.contains("07"));
    }

    #[test]
    fn test_models_chart_names() {
        let theme = Theme::default();
        let data = Loadable::Ready(vec![
            ModelShare { name: "gpt-4o".into(), count: 8 },
            ModelShare { name: "gpt-4o-mini".into(), count: 3 },
        ]);
        let output = render_widget(ModelsChart::new(&data, &theme), 40, 6);
        assert!(output.contains("gpt-4o"));
        assert!(output.contains("gpt-4o-mini"));
    }

    #[test]
    fn test_empty_and_failed_states() {
        let theme = Theme::default();
        let empty: Loadable<Vec<ModelShare>> = Loadable::Ready(Vec::new());
        assert!(render_widget(ModelsChart::new(&empty, &theme), 50, 6).contains("No data"));

        let failed: Loadable<Vec<CostPoint>> = Loadable::Failed("timeout".into());
        assert!(render_widget(CostChart::new(&failed, &theme), 50, 6).contains("Error: timeout"));
    }
}
