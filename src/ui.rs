//! Layout and drawing: board, sidebar, pause overlay, game over panel, clear fade.

use crate::app::Screen;
use crate::game::GameState;
use crate::grid::{HEIGHT, WIDTH};
use crate::piece::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count};

/// Terminal columns per grid cell (glyph in the middle column).
const CELL_WIDTH: u16 = 3;
const CELL_HEIGHT: u16 = 1;
const SIDEBAR_WIDTH: u16 = 24;
const CLEAR_FADE_MS: u32 = 400;

const LOCKED_GLYPH: &str = "●";
const ACTIVE_GLYPH: &str = "◉";
const EMPTY_GLYPH: &str = "·";

/// Board size in terminal cells including the border.
const fn board_outer_size() -> (u16, u16) {
    (WIDTH as u16 * CELL_WIDTH + 2, HEIGHT as u16 * CELL_HEIGHT + 2)
}

/// Fade over the cells emptied by one clear pass.
pub struct ClearFlash {
    cells: Vec<(usize, usize)>,
    effect: Option<Effect>,
    last_processed: Option<Instant>,
}

impl ClearFlash {
    pub fn new(cells: Vec<(usize, usize)>) -> Self {
        Self {
            cells,
            effect: None,
            last_processed: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

/// Board and sidebar rects, centred in `area`.
fn game_layout(area: Rect) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size();
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bw + SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(bh), Constraint::Fill(1)])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Buffer position of the glyph for grid cell (x, y) inside the board's inner rect.
fn cell_position(inner: Rect, x: usize, y: usize) -> Option<Position> {
    let px = inner.x + x as u16 * CELL_WIDTH + CELL_WIDTH / 2;
    let py = inner.y + y as u16 * CELL_HEIGHT;
    (px < inner.x + inner.width && py < inner.y + inner.height).then_some(Position::new(px, py))
}

pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    clear_flash: &mut Option<ClearFlash>,
    now: Instant,
) {
    let area = frame.area();
    let (board_area, sidebar_area) = game_layout(area);
    let inner = draw_board(frame, state, theme, board_area);
    draw_sidebar(frame, state, theme, sidebar_area);

    if let Some(flash) = clear_flash {
        apply_clear_flash(frame, state, theme, inner, flash, now);
    }

    match screen {
        Screen::Playing if paused => draw_pause_overlay(frame, theme, area),
        Screen::Playing => {}
        Screen::GameOver => draw_game_over(frame, state, theme, area),
    }
}

/// Draws the bordered board; returns the inner rect the cells occupy.
fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
        .title(Span::styled(" Colortris ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for (y, row) in state.grid().rows().enumerate() {
        for (x, piece) in row.iter().enumerate() {
            let Some(pos) = cell_position(inner, x, y) else {
                continue;
            };
            let (symbol, style) = cell_glyph(*piece, theme);
            buf[pos].set_symbol(symbol).set_style(style);
        }
    }
    inner
}

fn cell_glyph(piece: Piece, theme: &Theme) -> (&'static str, Style) {
    let base = Style::default().bg(theme.bg).fg(theme.piece_color(piece.color()));
    if piece.is_empty() {
        (EMPTY_GLYPH, base)
    } else if piece.is_active() {
        (ACTIVE_GLYPH, base.add_modifier(Modifier::BOLD))
    } else {
        (LOCKED_GLYPH, base)
    }
}

/// Paints cleared cells white, then fades them to the background (TachyonFX).
fn apply_clear_flash(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    inner: Rect,
    flash: &mut ClearFlash,
    now: Instant,
) {
    let delta = flash
        .last_processed
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.last_processed = Some(now);

    let buf = frame.buffer_mut();
    for &(x, y) in &flash.cells {
        let still_empty = state.grid().get(x, y).is_some_and(|p| p.is_empty());
        if let (true, Some(pos)) = (still_empty, cell_position(inner, x, y)) {
            buf[pos]
                .set_symbol(LOCKED_GLYPH)
                .set_style(Style::default().fg(Color::White).bg(theme.bg));
        }
    }

    if flash.effect.is_none() {
        let positions: HashSet<(u16, u16)> = flash
            .cells
            .iter()
            .filter_map(|&(x, y)| cell_position(inner, x, y))
            .map(|p| (p.x, p.y))
            .collect();
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(theme.bg, theme.bg, (CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        flash.effect = Some(effect);
    }

    if let Some(effect) = &mut flash.effect {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let label = Style::default().fg(theme.main_fg);
    let value = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let key = Style::default().fg(theme.div_line);
    let grid = state.grid();
    let filled = format!("{}/{}", grid.occupied_count(), grid.width() * grid.height());
    let status = if state.is_scoring() { " clearing…" } else { "" };
    let lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(" Score   ", label), Span::styled(state.score().to_string(), value)]),
        Line::from(vec![
            Span::styled(" Pieces  ", label),
            Span::styled(state.pieces_spawned().to_string(), label),
        ]),
        Line::from(vec![Span::styled(" Filled  ", label), Span::styled(filled, label)]),
        Line::from(Span::styled(status, value)),
        Line::from(Span::styled(" ←/→ h/l  move", key)),
        Line::from(Span::styled(" ↓ j      soft drop", key)),
        Line::from(Span::styled(" p        pause", key)),
        Line::from(Span::styled(" q Esc    quit", key)),
    ];
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(area, frame.buffer_mut());
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 28, 6);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(" P — Resume    Q — Quit ", Style::default().fg(theme.main_fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 30, 9);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", state.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Pieces: {} ", state.pieces_spawned()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(" R — Restart    Q — Quit ", Style::default().fg(theme.main_fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .style(Style::default().bg(theme.bg))
                .title(Span::styled(" Colortris ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}
