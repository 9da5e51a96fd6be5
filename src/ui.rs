pub mod screen;

use std::rc::Rc;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Block, Borders, Paragraph, Widget, Wrap,
    },
};

use dotboard::geometry::{GameArea, Point};
use dotboard::input::InputMode;
use dotboard::summary::Feedback;

use crate::App;

const FOOTER_HEIGHT: u16 = 4;
const CURSOR_RADIUS: f64 = 6.0;

/// Header, board, footer.
pub fn chunks(area: Rect) -> Rc<[Rect]> {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(FOOTER_HEIGHT),
    ])
    .split(area)
}

fn board_block(title: String) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title)
}

/// Terminal cells the board is painted into.
pub fn board_inner(area: Rect) -> Rect {
    board_block(String::new()).inner(chunks(area)[1])
}

/// Screen-space pixel under the middle of a terminal cell, if the cell is on the board.
pub fn cell_to_screen(board: Rect, viewport: GameArea, column: u16, row: u16) -> Option<Point> {
    if board.width == 0
        || board.height == 0
        || column < board.x
        || row < board.y
        || column >= board.x + board.width
        || row >= board.y + board.height
    {
        return None;
    }
    let fx = (f64::from(column - board.x) + 0.5) / f64::from(board.width);
    let fy = (f64::from(row - board.y) + 0.5) / f64::from(board.height);
    Some(Point::new(
        viewport.origin.x + fx * viewport.width,
        viewport.origin.y + fy * viewport.height,
    ))
}

fn format_secs(secs: f64) -> String {
    format!("{:.1}s", secs)
}

pub fn render_board(app: &App, area: Rect, buf: &mut Buffer) {
    let parts = chunks(area);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let state = app.game.state();
    let header = Line::from(vec![
        Span::styled(format!("{} - {}", app.mode_label(), app.level_label()), bold),
        Span::raw("   "),
        Span::raw(format!(
            "Dots: {}/{}",
            state.hits, app.session_config.targets_to_win
        )),
        Span::raw("   "),
        Span::raw(format!(
            "Time: {} / {}",
            format_secs(app.game.elapsed().as_secs_f64()),
            format_secs(app.session_config.max_duration.as_secs_f64())
        )),
    ]);
    Paragraph::new(header)
        .alignment(Alignment::Center)
        .render(parts[0], buf);

    let viewport = app.viewport;
    let (y0, y1) = (viewport.origin.y, viewport.origin.y + viewport.height);
    let flip = |y: f64| y0 + y1 - y;
    let active = app.game.current_target();
    let layout = app.game.layout();
    let cursor = app.cursor;

    let title = match app.input.mode() {
        InputMode::Mouse => " click the red dot ".to_string(),
        InputMode::Finger => match &app.feed {
            Some(feed) if feed.is_exhausted() => " fingertip feed finished ".to_string(),
            Some(_) => " touch the red dot ".to_string(),
            None => " no camera feed ".to_string(),
        },
    };

    Canvas::default()
        .block(board_block(title))
        .marker(Marker::Braille)
        .x_bounds([viewport.origin.x, viewport.origin.x + viewport.width])
        .y_bounds([y0, y1])
        .paint(|ctx| {
            for target in layout.iter() {
                let color = if Some(target.id) == active {
                    Color::Red
                } else {
                    Color::White
                };
                ctx.draw(&Circle {
                    x: target.center.x,
                    y: flip(target.center.y),
                    radius: target.radius,
                    color,
                });
            }
            if let Some(p) = cursor {
                ctx.draw(&Circle {
                    x: p.x,
                    y: flip(p.y),
                    radius: CURSOR_RADIUS,
                    color: Color::Yellow,
                });
            }
        })
        .render(parts[1], buf);

    let mut footer: Vec<Line> = app
        .device_log
        .iter()
        .map(|m| Line::from(Span::styled(m.clone(), dim)))
        .collect();
    footer.push(Line::from(Span::styled(
        "(esc) end session",
        Style::default().add_modifier(Modifier::ITALIC),
    )));
    Paragraph::new(footer).render(parts[2], buf);
}

pub fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines = Vec::new();
    match &app.last_summary {
        Some(summary) => {
            let (headline, color) = match summary.end_reason {
                dotboard::session::EndReason::Win => ("Well done!", Color::Green),
                dotboard::session::EndReason::Timeout => ("Time is up", Color::Yellow),
                dotboard::session::EndReason::EarlyAbort => ("Session ended early", Color::Gray),
            };
            lines.push(Line::from(Span::styled(headline, bold.fg(color))));
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!(
                "{} dots in {}",
                summary.hits,
                format_secs(summary.duration_seconds)
            )));
            if let Some(mean) = summary.mean_interval_seconds {
                lines.push(Line::raw(format!("{} per dot on average", format_secs(mean))));
            }
            if let Some(best) = app.best_duration {
                lines.push(Line::raw(format!(
                    "best win on this level: {}",
                    format_secs(best)
                )));
            }
        }
        None => lines.push(Line::from(Span::styled("Session ended", bold))),
    }

    lines.push(Line::raw(""));
    if let Some(summary) = app.last_summary.as_ref().filter(|_| !app.saved) {
        let mut spans = vec![Span::raw("how did it go? ")];
        for (i, feedback) in Feedback::ALL.iter().enumerate() {
            let label = format!(" ({}) {} ", i + 1, feedback);
            spans.push(if summary.feedback == Some(*feedback) {
                Span::styled(label, bold.fg(Color::Cyan))
            } else {
                Span::raw(label)
            });
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("(r)etry / (esc)ape", italic)));

    let block_area = Layout::vertical([Constraint::Percentage(25), Constraint::Min(1)]).split(area)[1];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(block_area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> GameArea {
        GameArea {
            origin: Point::new(500.0, 150.0),
            width: 800.0,
            height: 700.0,
        }
    }

    #[test]
    fn cells_map_to_cell_centers() {
        let board = Rect::new(1, 2, 80, 35);
        let top_left = cell_to_screen(board, viewport(), 1, 2).unwrap();
        assert!((top_left.x - 505.0).abs() < 1e-9);
        assert!((top_left.y - 160.0).abs() < 1e-9);

        let bottom_right = cell_to_screen(board, viewport(), 80, 36).unwrap();
        assert!((bottom_right.x - 1295.0).abs() < 1e-9);
        assert!((bottom_right.y - 840.0).abs() < 1e-9);
    }

    #[test]
    fn cells_off_the_board_map_to_nothing() {
        let board = Rect::new(1, 2, 80, 35);
        assert_eq!(cell_to_screen(board, viewport(), 0, 5), None);
        assert_eq!(cell_to_screen(board, viewport(), 81, 5), None);
        assert_eq!(cell_to_screen(board, viewport(), 10, 37), None);
        assert_eq!(cell_to_screen(Rect::new(0, 0, 0, 0), viewport(), 0, 0), None);
    }

    #[test]
    fn board_sits_between_header_and_footer() {
        let area = Rect::new(0, 0, 100, 40);
        let inner = board_inner(area);
        assert_eq!(inner, Rect::new(1, 2, 98, 40 - 1 - FOOTER_HEIGHT - 2));
    }
}
