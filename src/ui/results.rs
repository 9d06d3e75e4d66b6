use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::session::SessionResult;
use crate::store::{RecordHandle, RecordKind};
use crate::ui::charting::{compute_bounds, format_label, numbered_points};
use crate::ui::{bold_style, italic_style, warning_style, HORIZONTAL_MARGIN, VERTICAL_MARGIN};

pub const RESULTS_LEGEND: &str = "(r)etry / (n)ew / (h)istory / (esc)ape";

pub const AUTOMATION_WARNING: &str = "[Anti-Cheat] Warning: Detected unnaturally consistent and rapid keypresses. This may indicate use of automated input or macros.";

/// Summary of one finished session plus where it was saved
pub struct ResultsWidget<'a> {
    result: &'a SessionResult,
    saved: Option<&'a RecordHandle>,
}

impl<'a> ResultsWidget<'a> {
    pub fn new(result: &'a SessionResult, saved: Option<&'a RecordHandle>) -> Self {
        Self { result, saved }
    }

    fn stat_lines(&self) -> Vec<Line<'static>> {
        let r = self.result;
        let mut lines = vec![
            Line::from(Span::styled(
                format!(
                    "{:.2} wpm   {:.2}% acc   {:.2}s",
                    r.wpm, r.accuracy_percent, r.elapsed_seconds
                ),
                bold_style(),
            )),
            Line::from(format!(
                "Average time between letters: {:.3} seconds",
                r.avg_interval()
            )),
            Line::from(format!(
                "Time between letters (seconds): {}",
                r.intervals.iter().map(|i| format!("{i:.3}")).join(", ")
            )),
        ];

        if r.is_flagged {
            lines.push(Line::from(Span::styled(AUTOMATION_WARNING, warning_style())));
        }

        match self.saved {
            Some(handle) if handle.kind == RecordKind::Flagged => lines.push(Line::from(Span::styled(
                format!("Cheating detected! Invalid stats saved to {}", handle.path.display()),
                warning_style(),
            ))),
            Some(handle) => lines.push(Line::from(Span::styled(
                format!("Score saved to {}", handle.path.display()),
                Style::default().fg(Color::Green),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Score not saved, see keydash.log",
                warning_style(),
            ))),
        }

        lines
    }
}

impl Widget for ResultsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.stat_lines();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(lines.len() as u16 + 2),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let points = numbered_points(self.result.intervals.iter().map(|i| i * 1000.0));
        let (keystrokes, slowest_ms) = compute_bounds(&points, 0.0);

        let datasets = vec![Dataset::default()
            .marker(Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("keystroke")
                    .bounds([1.0, keystrokes])
                    .labels(vec![
                        Span::styled("1", bold_style()),
                        Span::styled(format_label(keystrokes), bold_style()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("ms")
                    .bounds([0.0, slowest_ms])
                    .labels(vec![
                        Span::styled("0", bold_style()),
                        Span::styled(format_label(slowest_ms), bold_style()),
                    ]),
            )
            .render(chunks[0], buf);

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(RESULTS_LEGEND, italic_style())).render(chunks[3], buf);
    }
}
