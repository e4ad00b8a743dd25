//! UI widgets for the portfolio dashboard.

use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Margin, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row as TableRow, Table, TableState, Wrap},
    Frame,
};

use super::theme::Theme;
use crate::clock::ClockReading;
use crate::effects::Crossfade;
use crate::rows::{ListView, COLUMN_TITLES};
use crate::sequencer::Sequencer;

/// Lines above the first data row inside the table block (border + header)
const TABLE_HEADER_LINES: u16 = 2;

const COLUMN_WIDTHS: [Constraint; 6] = [
    Constraint::Length(4),
    Constraint::Min(20),
    Constraint::Length(12),
    Constraint::Length(10),
    Constraint::Length(12),
    Constraint::Length(10),
];

/// Project table panel widget
pub struct ProjectTable<'a> {
    view: &'a ListView,
    sequencer: Option<&'a Sequencer>,
    now: Instant,
    theme: &'a Theme,
}

impl<'a> ProjectTable<'a> {
    pub fn new(
        view: &'a ListView,
        sequencer: Option<&'a Sequencer>,
        now: Instant,
        theme: &'a Theme,
    ) -> Self {
        ProjectTable {
            view,
            sequencer,
            now,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &mut TableState) {
        let active = self.sequencer.and_then(Sequencer::active);

        let block = Block::default()
            .title(" Projects ")
            .title_style(self.theme.title_style())
            .borders(Borders::ALL)
            .border_type(if active.is_some() {
                BorderType::Double
            } else {
                BorderType::Plain
            })
            .border_style(if active.is_some() {
                self.theme.focused_border_style()
            } else {
                self.theme.border_style()
            });

        let header = TableRow::new(COLUMN_TITLES.iter().map(|t| Cell::from(*t)))
            .style(self.theme.dimmed_style());

        let rows: Vec<TableRow> = match self.view.message() {
            Some(message) => {
                let style = match self.view {
                    ListView::Failed(_) => self.theme.error_style(),
                    _ => self.theme.dimmed_style(),
                };
                vec![TableRow::new(vec![Cell::from(""), Cell::from(message.to_string())]).style(style)]
            }
            None => self
                .view
                .rows()
                .iter()
                .enumerate()
                .map(|(idx, row)| {
                    let cells = (0..row.cells.len()).map(|col| {
                        let (text, opacity) = match self.sequencer {
                            Some(seq) => (
                                seq.cell_text(idx, col, self.now),
                                seq.cell_opacity(idx, col, self.now),
                            ),
                            None => (row.cells[col].clone(), 1.0),
                        };
                        Cell::from(text).style(Style::default().fg(self.theme.faded(opacity)))
                    });
                    TableRow::new(cells)
                })
                .collect(),
        };

        let table = Table::new(rows, COLUMN_WIDTHS)
            .header(header)
            .block(block)
            .row_highlight_style(self.theme.highlight_style())
            .highlight_symbol("> ");

        state.select(active);
        frame.render_stateful_widget(table, area, state);
    }
}

/// Map a terminal position to a data row of a table rendered in `area`
pub fn row_at(area: Rect, offset: usize, rows: usize, column: u16, row: u16) -> Option<usize> {
    let inner = area.inner(Margin::new(1, 1));
    if !inner.contains(Position::new(column, row)) {
        return None;
    }
    let line = row - area.y;
    if line < TABLE_HEADER_LINES {
        return None;
    }
    let idx = offset + (line - TABLE_HEADER_LINES) as usize;
    (idx < rows).then_some(idx)
}

/// Preview panel driven by the sequencer's crossfade
pub struct PreviewPanel<'a> {
    backdrop: Option<&'a Crossfade>,
    link: Option<&'a str>,
    resolved: Option<bool>,
    now: Instant,
    theme: &'a Theme,
}

impl<'a> PreviewPanel<'a> {
    pub fn new(
        backdrop: Option<&'a Crossfade>,
        link: Option<&'a str>,
        resolved: Option<bool>,
        now: Instant,
        theme: &'a Theme,
    ) -> Self {
        PreviewPanel {
            backdrop,
            link,
            resolved,
            now,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Preview ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(backdrop) = self.backdrop.filter(|b| b.is_visible(self.now)) else {
            let hint = Paragraph::new("Hover a project to preview it")
                .style(self.theme.dimmed_style())
                .alignment(Alignment::Center);
            frame.render_widget(hint, inner.inner(Margin::new(0, inner.height.saturating_sub(1) / 2)));
            return;
        };

        // Scale above 1.0 pulls the content in from the edges
        let scale = backdrop.scale_at(self.now);
        let grow = (scale - 1.0).max(0.0);
        let inset = Margin::new(
            (inner.width as f32 * grow / 2.0).round() as u16,
            (inner.height as f32 * grow / 2.0).round() as u16,
        );
        let content = inner.inner(inset);
        let style = Style::default().fg(self.theme.faded(backdrop.opacity_at(self.now)));

        let image = backdrop.image.as_deref().unwrap_or_default();
        let status = match self.resolved {
            Some(true) => "preview available",
            Some(false) => "no preview published",
            None => "preview not checked",
        };
        let mut lines = vec![
            Line::from(Span::styled(image.to_string(), style)),
            Line::from(Span::styled(status, style)),
        ];
        if let Some(link) = self.link {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(format!("→ {link}"), style)));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, content);
    }
}

/// Title line with the live clock on the right
pub struct Header<'a> {
    username: &'a str,
    reading: Option<&'a ClockReading>,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(username: &'a str, reading: Option<&'a ClockReading>, theme: &'a Theme) -> Self {
        Header {
            username,
            reading,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            format!(" {} / portfolio", self.username),
            self.theme.title_style(),
        )));
        frame.render_widget(title, area);

        if let Some(reading) = self.reading {
            let colon = if reading.colon_visible() { ":" } else { " " };
            let clock = Paragraph::new(Line::from(vec![
                Span::raw(reading.hours.clone()),
                Span::raw(colon),
                Span::raw(reading.minutes.clone()),
                Span::raw(" "),
                Span::raw(reading.day_period.clone()),
                Span::raw(" "),
            ]))
            .alignment(Alignment::Right)
            .style(self.theme.surface_style());
            frame.render_widget(clock, area);
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    summary: Option<String>,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(summary: Option<String>, error: Option<&'a str>, theme: &'a Theme) -> Self {
        StatusBar {
            summary,
            error,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let paragraph = if let Some(e) = self.error {
            Paragraph::new(format!("Error: {e}")).style(self.theme.error_style())
        } else {
            let text = match &self.summary {
                Some(s) => format!("folio-tui: {s} | [h] Help [q] Quit"),
                None => "folio-tui | [h] Help [q] Quit".to_string(),
            };
            Paragraph::new(text)
        };

        frame.render_widget(paragraph.block(Block::default().borders(Borders::TOP)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_at_maps_lines_to_rows() {
        let area = Rect::new(0, 2, 80, 20);

        // Border and header lines are not rows
        assert_eq!(row_at(area, 0, 5, 10, 2), None);
        assert_eq!(row_at(area, 0, 5, 10, 3), None);

        assert_eq!(row_at(area, 0, 5, 10, 4), Some(0));
        assert_eq!(row_at(area, 0, 5, 10, 8), Some(4));
        assert_eq!(row_at(area, 0, 5, 10, 9), None);

        // Scrolled table
        assert_eq!(row_at(area, 3, 10, 10, 4), Some(3));
    }

    #[test]
    fn test_row_at_outside_area() {
        let area = Rect::new(0, 2, 80, 20);
        assert_eq!(row_at(area, 0, 5, 0, 4), None);
        assert_eq!(row_at(area, 0, 5, 90, 4), None);
        assert_eq!(row_at(area, 0, 5, 10, 40), None);
    }
}
