//! Terminal UI rendering with ratatui

use blockfall::cell::CellCode;
use blockfall::grid::{DisplayCell, RenderSnapshot};
use blockfall::score::Score;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const BLOCK_GLYPH: char = '█';
const BORDER_GLYPH: char = '▒';
const BORDER_FALLBACK: Color = Color::DarkGray;

/// Width of the score panel beside the board
const STATS_WIDTH: u16 = 16;

/// Everything one frame needs, copied out of the session
pub struct View<'a> {
    pub snapshot: &'a RenderSnapshot,
    pub score: &'a Score,
    pub cell_size: u16,
    pub game_over: bool,
}

/// Render the board, score panel and any overlay
pub fn render_game(frame: &mut Frame, view: &View) {
    let area = frame.area();
    let cell_size = view.cell_size.max(1);
    let board_width = view.snapshot.width as u16 * cell_size;
    let board_height = view.snapshot.height as u16;

    let game_area = center_rect(area, board_width + STATS_WIDTH, board_height);

    // Create main layout: board | stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(board_width),
            Constraint::Length(STATS_WIDTH),
        ])
        .split(game_area);

    render_board(frame, main_layout[0], view.snapshot, cell_size);
    render_stats(frame, main_layout[1], view.score);

    if view.game_over {
        render_overlay(frame, area, "GAME OVER", "Press q to quit");
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Text and style for one cell, `cell_size` columns wide
fn cell_span(cell: DisplayCell, cell_size: u16) -> Span<'static> {
    let repeat = |glyph: char| glyph.to_string().repeat(cell_size as usize);
    match cell.code {
        CellCode::Empty => Span::raw(" ".repeat(cell_size as usize)),
        CellCode::Filled => Span::styled(
            repeat(BLOCK_GLYPH),
            Style::default().fg(cell.color.unwrap_or(Color::White)),
        ),
        // The frame's own color is black, which vanishes on dark terminals
        CellCode::Border => Span::styled(
            repeat(BORDER_GLYPH),
            Style::default().fg(BORDER_FALLBACK),
        ),
    }
}

/// Render the snapshot, frame included
fn render_board(frame: &mut Frame, area: Rect, snapshot: &RenderSnapshot, cell_size: u16) {
    let lines: Vec<Line> = snapshot
        .rows()
        .map(|row| Line::from(row.iter().map(|cell| cell_span(*cell, cell_size)).collect::<Vec<_>>()))
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, score: &Score) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled("SCORE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", score.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        Line::from(Span::styled("LEVEL", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", score.level),
            Style::default().fg(Color::Cyan),
        )),
        Line::raw(""),
        Line::from(Span::styled("LINES", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", score.lines),
            Style::default().fg(Color::Green),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render a centered overlay message
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_area = center_rect(area, 24, 5);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}
