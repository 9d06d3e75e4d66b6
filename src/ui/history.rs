use std::rc::Rc;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph, Widget},
};

use crate::metrics::mean;
use crate::summary::SummaryEntry;
use crate::ui::charting::{compute_bounds, format_label, numbered_points};
use crate::ui::{bold_style, dim_bold_style, italic_style, HORIZONTAL_MARGIN, VERTICAL_MARGIN};

pub const HISTORY_LEGEND: &str = "(r)etry / (n)ew / (esc)ape";

/// WPM, accuracy, time taken and letter spacing across every verified session
pub struct HistoryWidget<'a> {
    entries: &'a [SummaryEntry],
}

impl<'a> HistoryWidget<'a> {
    pub fn new(entries: &'a [SummaryEntry]) -> Self {
        Self { entries }
    }

    fn points(&self, value: impl Fn(&SummaryEntry) -> f64) -> Vec<(f64, f64)> {
        numbered_points(self.entries.iter().map(value))
    }

    fn overview(&self) -> String {
        let wpm: Vec<f64> = self.entries.iter().map(|e| e.wpm).collect();
        let accuracy: Vec<f64> = self.entries.iter().map(|e| e.accuracy_percent).collect();
        let best = wpm.iter().copied().fold(0.0, f64::max);

        format!(
            "{} runs   best {:.2} wpm   avg {:.2} wpm   avg {:.2}% acc",
            self.entries.len(),
            best,
            mean(&wpm).unwrap_or(0.0),
            mean(&accuracy).unwrap_or(0.0)
        )
    }
}

fn halves(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

/// One series plotted against run number inside a titled frame
fn run_chart<'a>(title: &'a str, color: Color, y_floor: f64, points: &'a [(f64, f64)]) -> Chart<'a> {
    let (runs, highest) = compute_bounds(points, y_floor);
    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(color))
        .graph_type(GraphType::Line)
        .data(points);

    Chart::new(vec![dataset])
        .block(Block::bordered().title(Span::styled(title, bold_style())))
        .x_axis(
            Axis::default()
                .title("run")
                .bounds([1.0, runs])
                .labels(vec![
                    Span::styled("1", bold_style()),
                    Span::styled(format_label(runs), bold_style()),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, highest])
                .labels(vec![
                    Span::styled("0", bold_style()),
                    Span::styled(format_label(highest), bold_style()),
                ]),
        )
}

impl Widget for HistoryWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        if self.entries.is_empty() {
            Paragraph::new(Span::styled(
                "No verified sessions yet. Finish a typing test to start your history.",
                dim_bold_style(),
            ))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);
        } else {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[0]);
            let top = halves(rows[0]);
            let bottom = halves(rows[1]);

            let series = [
                ("WPM", Color::Magenta, 100.0, self.points(|e| e.wpm), top[0]),
                ("Accuracy %", Color::Green, 100.0, self.points(|e| e.accuracy_percent), top[1]),
                ("Time Taken (s)", Color::Cyan, 0.0, self.points(|e| e.elapsed_secs), bottom[0]),
                (
                    "Avg Time Between Letters (s)",
                    Color::Yellow,
                    0.0,
                    self.points(|e| e.avg_interval),
                    bottom[1],
                ),
            ];
            for (title, color, y_floor, points, chart_area) in &series {
                run_chart(title, *color, *y_floor, points).render(*chart_area, buf);
            }

            Paragraph::new(Span::styled(self.overview(), bold_style()))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);
        }

        Paragraph::new(Span::styled(HISTORY_LEGEND, italic_style())).render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::buffer_text;
    use chrono::NaiveDate;

    fn entry(second: u32, wpm: f64, accuracy: f64) -> SummaryEntry {
        SummaryEntry {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, second)
                .unwrap(),
            wpm,
            elapsed_secs: 5.0,
            accuracy_percent: accuracy,
            avg_interval: 0.2,
        }
    }

    fn render(entries: &[SummaryEntry]) -> String {
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);
        HistoryWidget::new(entries).render(area, &mut buf);
        buffer_text(&buf)
    }

    #[test]
    fn empty_history_explains_itself() {
        let text = render(&[]);
        assert!(text.contains("No verified sessions yet."));
        assert!(text.contains(HISTORY_LEGEND));
    }

    #[test]
    fn overview_aggregates_runs() {
        let entries = [entry(0, 40.0, 90.0), entry(1, 60.0, 100.0)];
        let text = render(&entries);
        assert!(text.contains("2 runs   best 60.00 wpm   avg 50.00 wpm   avg 95.00% acc"));
    }

    #[test]
    fn every_summary_column_gets_a_chart() {
        let entries = [entry(0, 40.0, 90.0), entry(1, 60.0, 100.0)];
        let text = render(&entries);
        for title in ["WPM", "Accuracy %", "Time Taken (s)", "Avg Time Between Letters (s)"] {
            assert!(text.contains(title), "missing {title} chart:\n{text}");
        }
    }

    #[test]
    fn time_charts_scale_to_their_own_values() {
        let points = numbered_points([5.0, 12.4]);
        let chart_area = Rect::new(0, 0, 48, 10);
        let mut buf = Buffer::empty(chart_area);
        run_chart("Time Taken (s)", Color::Cyan, 0.0, &points).render(chart_area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("13"), "{text}");
        assert!(!text.contains("100"), "{text}");
    }
}
