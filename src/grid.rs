//! Grid: fixed 7x10 playfield and the pure operations the simulation is built from.
//!
//! Every operation takes `&self` and returns a fresh grid, so callers only ever observe
//! whole snapshots. Row 0 is the spawn row at the top; row `HEIGHT - 1` is the floor.

use crate::piece::{Piece, PieceColor};
use crate::rng::SpawnSource;
use std::ops::Range;
use thiserror::Error;

pub const WIDTH: usize = 7;
pub const HEIGHT: usize = 10;

/// Shortest same-colour line that clears.
pub const MIN_RUN: usize = 3;

/// Lateral direction for `Grid::shift`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Column of the neighbour in this direction, if it is on the grid.
    fn step(self, x: usize) -> Option<usize> {
        match self {
            Self::Left => x.checked_sub(1),
            Self::Right => (x + 1 < WIDTH).then_some(x + 1),
        }
    }
}

/// Broken grid invariants. These indicate a sequencing bug, not a player-reachable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("{count} active pieces on the grid, at most one may be falling")]
    MultipleActive { count: usize },
}

/// Result of one clear pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOutcome {
    pub grid: Grid,
    /// Qualifying runs found, horizontal and vertical summed.
    pub runs_cleared: u32,
    /// Cells emptied by this pass, each listed once, as (x, y).
    pub cells: Vec<(usize, usize)>,
}

impl ClearOutcome {
    pub fn any_cleared(&self) -> bool {
        self.runs_cleared > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Grid {
    /// cells[y][x]
    cells: [[Piece; WIDTH]; HEIGHT],
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub const fn width(&self) -> usize {
        WIDTH
    }

    #[inline]
    pub const fn height(&self) -> usize {
        HEIGHT
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Piece> {
        self.cells.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Writes a cell; out-of-bounds writes are ignored and reported as `false`.
    #[cfg(test)]
    pub fn set(&mut self, x: usize, y: usize, piece: Piece) -> bool {
        match self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(cell) => {
                *cell = piece;
                true
            }
            None => false,
        }
    }

    /// Rows top to bottom, for rendering.
    pub fn rows(&self) -> impl Iterator<Item = &[Piece; WIDTH]> {
        self.cells.iter()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|p| !p.is_empty()).count()
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().flatten().filter(|p| p.is_active()).count()
    }

    /// Position of the falling piece, if there is one.
    pub fn active_position(&self) -> Option<(usize, usize)> {
        self.positions().find(|&(x, y)| self.cells[y][x].is_active())
    }

    pub fn check_invariants(&self) -> Result<(), GridError> {
        match self.active_count() {
            0 | 1 => Ok(()),
            count => Err(GridError::MultipleActive { count }),
        }
    }

    /// Every non-empty cell falls one row if the cell beneath it is free.
    /// Scans from the floor up so a stacked column drops together in one call.
    pub fn apply_gravity(&self) -> Self {
        let mut out = Self::new();
        for y in (0..HEIGHT).rev() {
            for x in 0..WIDTH {
                let piece = self.cells[y][x];
                if piece.is_empty() {
                    continue;
                }
                if y + 1 < HEIGHT && out.cells[y + 1][x].is_empty() {
                    out.cells[y + 1][x] = piece;
                } else {
                    out.cells[y][x] = piece;
                }
            }
        }
        out
    }

    /// Shifts active pieces one column, when the target cell is free and on the grid.
    /// Locked pieces never move sideways.
    pub fn shift(&self, direction: Direction) -> Self {
        let mut out = *self;
        for (x, y) in self.positions() {
            let piece = self.cells[y][x];
            if !piece.is_active() {
                continue;
            }
            let Some(tx) = direction.step(x) else {
                continue;
            };
            if self.cells[y][tx].is_empty() {
                out.cells[y][tx] = piece;
                out.cells[y][x] = Piece::empty();
            }
        }
        out
    }

    /// Locks the first active piece that rests on the floor or on another piece.
    pub fn lock(&self) -> (Self, bool) {
        let mut out = *self;
        for (x, y) in self.positions() {
            let piece = self.cells[y][x];
            if !piece.is_active() {
                continue;
            }
            let grounded = y + 1 == HEIGHT || !self.cells[y + 1][x].is_empty();
            if grounded {
                out.cells[y][x] = piece.with_active(false);
                return (out, true);
            }
        }
        (out, false)
    }

    /// Empties every horizontal and vertical run of `MIN_RUN` or more same-coloured cells.
    /// Both axes are scanned on this grid, before anything is removed.
    pub fn clear_runs(&self) -> ClearOutcome {
        let mut out = *self;
        let mut runs_cleared = 0u32;
        let mut cells = Vec::new();
        let mut mark = |out: &mut Self, x: usize, y: usize| {
            if !out.cells[y][x].is_empty() {
                out.cells[y][x] = Piece::empty();
                cells.push((x, y));
            }
        };

        for y in 0..HEIGHT {
            let line = self.cells[y].map(|p| p.color());
            for run in runs_in_line(&line) {
                runs_cleared += 1;
                for x in run {
                    mark(&mut out, x, y);
                }
            }
        }
        for x in 0..WIDTH {
            let line: [PieceColor; HEIGHT] = std::array::from_fn(|y| self.cells[y][x].color());
            for run in runs_in_line(&line) {
                runs_cleared += 1;
                for y in run {
                    mark(&mut out, x, y);
                }
            }
        }

        ClearOutcome {
            grid: out,
            runs_cleared,
            cells,
        }
    }

    /// Drops a new active piece of random colour into a random column of the spawn row.
    ///
    /// Overwrites whatever is there. A locked piece in that cell is how the stack tops out;
    /// an active one means two pieces would be falling at once.
    pub fn spawn(&self, source: &mut impl SpawnSource) -> Self {
        let x = source.next_index(WIDTH);
        let piece = Piece::random(source).with_active(true);
        self.spawn_at(x, piece)
    }

    pub fn spawn_at(&self, x: usize, piece: Piece) -> Self {
        assert!(
            !self.cells[0][x].is_active(),
            "spawn onto the falling piece at column {x}"
        );
        let mut out = *self;
        out.cells[0][x] = piece;
        out
    }

    /// The stack reached the top: a locked piece sits in the spawn row.
    pub fn is_game_over_condition(&self) -> bool {
        self.cells[0].iter().any(Piece::is_locked)
    }

    fn positions(&self) -> impl Iterator<Item = (usize, usize)> {
        (0..HEIGHT).flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
    }

    /// Builds a grid from text rows placed against the floor (last string = bottom row).
    /// `.` is empty, `RGBY` locked, `rgby` active. Short rows are padded with empty cells.
    #[cfg(test)]
    pub fn from_ascii(rows: &[&str]) -> Self {
        assert!(rows.len() <= HEIGHT);
        let mut grid = Self::new();
        let top = HEIGHT - rows.len();
        for (i, row) in rows.iter().enumerate() {
            assert!(row.len() <= WIDTH, "row {row:?} is wider than the grid");
            for (x, ch) in row.chars().enumerate() {
                let color = match ch.to_ascii_uppercase() {
                    'R' => PieceColor::Red,
                    'G' => PieceColor::Green,
                    'B' => PieceColor::Blue,
                    'Y' => PieceColor::Yellow,
                    _ => PieceColor::None,
                };
                let piece = Piece::new(color).with_active(ch.is_ascii_lowercase());
                grid.set(x, top + i, piece);
            }
        }
        grid
    }
}

/// Maximal runs of one non-empty colour, at least `MIN_RUN` long, in a single pass.
fn runs_in_line(line: &[PieceColor]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=line.len() {
        if i < line.len() && line[i] == line[start] {
            continue;
        }
        if line[start] != PieceColor::None && i - start >= MIN_RUN {
            runs.push(start..i);
        }
        start = i;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{FastrandSource, ScriptedSource};

    fn random_settled_grid(rng: &mut fastrand::Rng) -> Grid {
        let mut grid = Grid::new();
        for x in 0..WIDTH {
            let height = rng.usize(..=HEIGHT);
            for y in (HEIGHT - height)..HEIGHT {
                let color = PieceColor::PLAYABLE[rng.usize(..4)];
                grid.set(x, y, Piece::new(color));
            }
        }
        grid
    }

    fn random_grid(rng: &mut fastrand::Rng) -> Grid {
        let mut grid = Grid::new();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                if rng.bool() {
                    grid.set(x, y, Piece::new(PieceColor::PLAYABLE[rng.usize(..4)]));
                }
            }
        }
        grid
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new();
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 10);
        assert_eq!(grid.occupied_count(), 0);
        assert_eq!(grid.active_position(), None);
        assert!(!grid.is_game_over_condition());
    }

    #[test]
    fn test_get_set_out_of_bounds() {
        let mut grid = Grid::new();
        assert_eq!(grid.get(WIDTH, 0), None);
        assert_eq!(grid.get(0, HEIGHT), None);
        assert!(!grid.set(WIDTH, 0, Piece::new(PieceColor::Red)));
        assert!(grid.set(6, 9, Piece::new(PieceColor::Red)));
        assert_eq!(grid.get(6, 9).map(|p| p.color()), Some(PieceColor::Red));
    }

    #[test]
    fn test_gravity_idempotent_at_rest() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..200 {
            let grid = random_settled_grid(&mut rng);
            assert_eq!(grid.apply_gravity(), grid);
        }
    }

    #[test]
    fn test_gravity_conserves_and_moves_at_most_one_row() {
        let mut rng = fastrand::Rng::with_seed(12);
        for _ in 0..200 {
            let grid = random_grid(&mut rng);
            let after = grid.apply_gravity();
            assert_eq!(after.occupied_count(), grid.occupied_count());
            for x in 0..WIDTH {
                let column = |g: &Grid| -> Vec<(usize, PieceColor)> {
                    (0..HEIGHT)
                        .filter_map(|y| {
                            let p = g.get(x, y)?;
                            (!p.is_empty()).then_some((y, p.color()))
                        })
                        .collect()
                };
                let before = column(&grid);
                let moved = column(&after);
                // Pieces never pass each other, so the column order is preserved.
                assert_eq!(before.len(), moved.len());
                for ((y0, c0), (y1, c1)) in before.iter().zip(&moved) {
                    assert_eq!(c0, c1);
                    assert!(*y1 == *y0 || *y1 == *y0 + 1);
                }
            }
        }
    }

    #[test]
    fn test_gravity_drops_stacked_column_together() {
        let grid = Grid::from_ascii(&["R", "G", "B", "."]);
        let after = grid.apply_gravity();
        assert_eq!(after, Grid::from_ascii(&["R", "G", "B"]));
    }

    #[test]
    fn test_gravity_keeps_active_flag() {
        let mut grid = Grid::new();
        grid.set(3, 0, Piece::new(PieceColor::Red).with_active(true));
        let after = grid.apply_gravity();
        assert!(after.get(3, 1).is_some_and(|p| p.is_active()));
        assert!(after.get(3, 0).is_some_and(|p| p.is_empty()));
    }

    #[test]
    fn test_shift_moves_active_piece_one_column() {
        let grid = Grid::from_ascii(&["...r..."]);
        let left = grid.shift(Direction::Left);
        assert_eq!(left, Grid::from_ascii(&["..r...."]));
        let right = grid.shift(Direction::Right);
        assert_eq!(right, Grid::from_ascii(&["....r.."]));
    }

    #[test]
    fn test_shift_respects_walls() {
        let at_left = Grid::from_ascii(&["g......"]);
        assert_eq!(at_left.shift(Direction::Left), at_left);
        let at_right = Grid::from_ascii(&["......g"]);
        assert_eq!(at_right.shift(Direction::Right), at_right);
    }

    #[test]
    fn test_shift_blocked_by_neighbour() {
        let grid = Grid::from_ascii(&["..Br..."]);
        assert_eq!(grid.shift(Direction::Left), grid);
        // No tunnelling through the blocker, only one column per call.
        let far = Grid::from_ascii(&["b.Y...."]);
        assert_eq!(far.shift(Direction::Right), Grid::from_ascii(&[".bY...."]));
    }

    #[test]
    fn test_shift_never_moves_locked_pieces() {
        let grid = Grid::from_ascii(&["R.G.B.Y"]);
        assert_eq!(grid.shift(Direction::Left), grid);
        assert_eq!(grid.shift(Direction::Right), grid);
    }

    #[test]
    fn test_lock_on_floor_then_nothing_left() {
        let mut grid = Grid::new();
        grid.set(2, HEIGHT - 1, Piece::new(PieceColor::Yellow).with_active(true));
        let (locked, did_lock) = grid.lock();
        assert!(did_lock);
        assert!(locked.get(2, HEIGHT - 1).is_some_and(|p| p.is_locked()));
        assert_eq!(locked.active_count(), 0);
        let (again, did_lock) = locked.lock();
        assert!(!did_lock);
        assert_eq!(again, locked);
    }

    #[test]
    fn test_lock_on_top_of_piece() {
        let grid = Grid::from_ascii(&["b", "R"]);
        let (locked, did_lock) = grid.lock();
        assert!(did_lock);
        assert_eq!(locked, Grid::from_ascii(&["B", "R"]));
    }

    #[test]
    fn test_lock_ignores_piece_in_air() {
        let grid = Grid::from_ascii(&["b", "."]);
        let (same, did_lock) = grid.lock();
        assert!(!did_lock);
        assert_eq!(same, grid);
    }

    #[test]
    fn test_clear_horizontal_run() {
        let grid = Grid::from_ascii(&["RRRBG"]);
        let outcome = grid.clear_runs();
        assert_eq!(outcome.grid, Grid::from_ascii(&["...BG"]));
        assert_eq!(outcome.runs_cleared, 1);
        assert!(outcome.any_cleared());
        assert_eq!(outcome.cells.len(), 3);
    }

    #[test]
    fn test_run_of_two_stays() {
        let grid = Grid::from_ascii(&["RRB"]);
        let outcome = grid.clear_runs();
        assert_eq!(outcome.grid, grid);
        assert_eq!(outcome.runs_cleared, 0);
        assert!(!outcome.any_cleared());
        assert!(outcome.cells.is_empty());
    }

    #[test]
    fn test_trailing_run_at_line_end() {
        let grid = Grid::from_ascii(&["BGYYYYY"]);
        let outcome = grid.clear_runs();
        assert_eq!(outcome.grid, Grid::from_ascii(&["BG....."]));
        assert_eq!(outcome.runs_cleared, 1);
    }

    #[test]
    fn test_empty_cells_break_runs() {
        let grid = Grid::from_ascii(&["RR.RR.."]);
        assert!(!grid.clear_runs().any_cleared());
    }

    #[test]
    fn test_clear_vertical_run() {
        let grid = Grid::from_ascii(&["G", "G", "G", "B"]);
        let outcome = grid.clear_runs();
        assert_eq!(outcome.grid, Grid::from_ascii(&["B"]));
        assert_eq!(outcome.runs_cleared, 1);
    }

    #[test]
    fn test_overlapping_runs_count_twice_clear_once() {
        // L shape: column 0 rows 7..=9 and row 9 columns 0..=2 share the corner.
        let grid = Grid::from_ascii(&["R", "R", "RRRB"]);
        let outcome = grid.clear_runs();
        assert_eq!(outcome.runs_cleared, 2);
        assert_eq!(outcome.grid, Grid::from_ascii(&["...B"]));
        assert_eq!(outcome.cells.len(), 5);
    }

    #[test]
    fn test_two_separate_runs_in_one_pass() {
        let grid = Grid::from_ascii(&["GGG", "RRRR"]);
        let outcome = grid.clear_runs();
        assert_eq!(outcome.runs_cleared, 2);
        assert_eq!(outcome.grid.occupied_count(), 0);
    }

    #[test]
    fn test_clear_reads_pre_clear_grid() {
        // The vertical yellow run must still be found after the horizontal pass
        // has emptied the shared bottom cell in the output.
        let grid = Grid::from_ascii(&["...Y", "...Y", "YYYY"]);
        let outcome = grid.clear_runs();
        assert_eq!(outcome.runs_cleared, 2);
        assert_eq!(outcome.grid.occupied_count(), 0);
    }

    #[test]
    fn test_runs_in_line_single_pass() {
        use PieceColor::{Blue as B, None as N, Red as R};
        assert_eq!(runs_in_line(&[R, R, R, B, B, B]), vec![0..3, 3..6]);
        assert_eq!(runs_in_line(&[N, N, N, N]), Vec::<Range<usize>>::new());
        assert_eq!(runs_in_line(&[]), Vec::<Range<usize>>::new());
    }

    #[test]
    fn test_spawn_places_active_piece_in_top_row() {
        let mut source = ScriptedSource::spawns(&[(3, 0)]);
        let grid = Grid::new().spawn(&mut source);
        assert_eq!(grid.active_position(), Some((3, 0)));
        assert_eq!(grid.get(3, 0).map(|p| p.color()), Some(PieceColor::Red));
        assert!(grid.check_invariants().is_ok());
    }

    #[test]
    fn test_spawn_column_is_in_bounds() {
        let mut source = FastrandSource::with_seed(3);
        for _ in 0..500 {
            let grid = Grid::new().spawn(&mut source);
            let (x, y) = grid.active_position().unwrap();
            assert!(x < WIDTH);
            assert_eq!(y, 0);
        }
    }

    #[test]
    fn test_spawn_overwrites_locked_piece() {
        let mut grid = Grid::new();
        grid.set(1, 0, Piece::new(PieceColor::Blue));
        let mut source = ScriptedSource::spawns(&[(1, 0)]);
        let spawned = grid.spawn(&mut source);
        assert!(spawned.get(1, 0).is_some_and(|p| p.is_active()));
    }

    #[test]
    #[should_panic(expected = "spawn onto the falling piece")]
    fn test_spawn_onto_active_piece_panics() {
        let mut grid = Grid::new();
        grid.set(0, 0, Piece::new(PieceColor::Red).with_active(true));
        let mut source = ScriptedSource::spawns(&[(0, 1)]);
        let _ = grid.spawn(&mut source);
    }

    #[test]
    fn test_game_over_condition() {
        let mut grid = Grid::new();
        assert!(!grid.is_game_over_condition());
        grid.set(4, 0, Piece::new(PieceColor::Green).with_active(true));
        assert!(!grid.is_game_over_condition());
        grid.set(4, 0, Piece::new(PieceColor::Green));
        assert!(grid.is_game_over_condition());
    }

    #[test]
    fn test_multiple_active_is_an_invariant_violation() {
        let grid = Grid::from_ascii(&["r.b"]);
        assert_eq!(
            grid.check_invariants(),
            Err(GridError::MultipleActive { count: 2 })
        );
    }

    #[test]
    fn test_single_piece_falls_to_floor() {
        let mut source = ScriptedSource::spawns(&[(3, 0)]);
        let mut grid = Grid::new().spawn(&mut source);
        for _ in 0..HEIGHT - 1 {
            grid = grid.apply_gravity();
        }
        assert_eq!(grid.active_position(), Some((3, HEIGHT - 1)));
        assert_eq!(grid.get(3, HEIGHT - 1).map(|p| p.color()), Some(PieceColor::Red));
        let (grid, did_lock) = grid.lock();
        assert!(did_lock);
        assert!(!grid.clear_runs().any_cleared());
    }
}
