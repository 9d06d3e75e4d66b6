pub mod charting;
pub mod history;
pub mod results;

use std::io;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Terminal,
};
use unicode_width::UnicodeWidthStr;

use crate::session::{Phase, SessionFrame, SessionView};

pub use history::HistoryWidget;
pub use results::ResultsWidget;

pub(crate) const HORIZONTAL_MARGIN: u16 = 5;
pub(crate) const VERTICAL_MARGIN: u16 = 2;

pub(crate) fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

pub(crate) fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

pub(crate) fn warning_style() -> Style {
    bold_style().fg(Color::Red)
}

/// Live feedback for a running session
pub struct SessionWidget<'a> {
    frame: &'a SessionFrame<'a>,
}

impl<'a> SessionWidget<'a> {
    pub fn new(frame: &'a SessionFrame<'a>) -> Self {
        Self { frame }
    }

    fn prompt_spans(&self) -> Vec<Span<'static>> {
        let typed_style = bold_style().fg(Color::Green);
        let expected_style = bold_style()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED);

        self.frame
            .target
            .chars()
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let style = if idx < self.frame.cursor {
                    typed_style
                } else if idx == self.frame.cursor && self.frame.phase == Phase::Typing {
                    expected_style
                } else {
                    dim_bold_style()
                };
                Span::styled(c.to_string(), style)
            })
            .collect()
    }

    fn status_line(&self) -> String {
        match self.frame.phase {
            Phase::Waiting => "Press Enter when ready to start...".to_string(),
            Phase::Typing => format!(
                "{} {}/{}",
                self.frame.phase,
                self.frame.cursor,
                self.frame.target.len()
            ),
            Phase::Done => self.frame.phase.to_string(),
        }
    }
}

impl Widget for SessionWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_width = self.frame.target.as_str().width();
        let prompt_lines = if prompt_width <= max_chars_per_line as usize {
            1
        } else {
            (prompt_width as f64 / max_chars_per_line as f64).ceil() as u16 + 1
        };
        let padding = area.height.saturating_sub(prompt_lines + 4) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(padding),
                Constraint::Length(2),
                Constraint::Length(prompt_lines),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(Span::styled(self.status_line(), italic_style()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Line::from(self.prompt_spans()))
            .alignment(if prompt_lines == 1 {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        if let Some(correction) = self.frame.correction {
            Paragraph::new(Span::styled(
                format!(
                    "Incorrect letter '{}'. Please type '{}'.",
                    correction.got, correction.expected
                ),
                warning_style(),
            ))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }
    }
}

/// Session view drawing onto a ratatui terminal
pub struct TerminalView<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalView<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    pub fn draw<W: Widget>(&mut self, widget: W) -> io::Result<()> {
        self.terminal.draw(|f| f.render_widget(widget, f.area()))?;
        Ok(())
    }
}

impl<B: Backend> SessionView for TerminalView<B> {
    fn render(&mut self, frame: &SessionFrame) -> io::Result<()> {
        self.draw(SessionWidget::new(frame))
    }
}

/// Flatten a buffer into text rows, for tests and plain output
pub fn buffer_text(buf: &Buffer) -> String {
    let width = buf.area.width.max(1) as usize;
    buf.content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
