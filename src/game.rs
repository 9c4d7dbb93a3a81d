//! Game state: one session's grid, phase, score and timers, advanced frame by frame.

use crate::grid::{Direction, Grid};
use crate::rng::{FastrandSource, SpawnSource};
use crate::score::Score;
use crate::timing::{GravityClock, MoveRepeat};
use log::{debug, info};

/// Where the session is in the spawn → fall → lock → clear cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A new piece goes in on the next gravity step.
    Spawning,
    /// A piece is falling.
    Falling,
    /// A piece locked; clear passes repeat each gravity step until one finds nothing.
    Scoring,
    /// A locked piece reached the spawn row. Nothing advances any more.
    GameOver,
}

/// Input sampled once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub direction: Option<Direction>,
    pub soft_drop: bool,
}

/// What one gravity step did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepReport {
    pub locked: bool,
    pub runs_cleared: u32,
    pub cleared_cells: Vec<(usize, usize)>,
    /// Column of the piece spawned this step.
    pub spawned: Option<usize>,
    pub game_over: bool,
}

/// What one frame did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub step: Option<StepReport>,
    pub moved: Option<Direction>,
}

#[derive(Debug)]
pub struct GameState<S = FastrandSource> {
    grid: Grid,
    phase: Phase,
    score: Score,
    gravity: GravityClock,
    mover: MoveRepeat,
    source: S,
    pieces_spawned: u32,
}

impl<S: SpawnSource> GameState<S> {
    /// Fresh session: empty grid, first piece spawns on the first gravity step.
    pub fn new(source: S) -> Self {
        Self::from_grid(Grid::new(), Phase::Spawning, source)
    }

    pub fn from_grid(grid: Grid, phase: Phase, source: S) -> Self {
        Self {
            grid,
            phase,
            score: Score::new(),
            gravity: GravityClock::new(),
            mover: MoveRepeat::new(),
            source,
            pieces_spawned: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score.value()
    }

    pub fn pieces_spawned(&self) -> u32 {
        self.pieces_spawned
    }

    pub fn is_scoring(&self) -> bool {
        self.phase == Phase::Scoring
    }

    #[cfg(test)]
    pub fn should_spawn(&self) -> bool {
        self.phase == Phase::Spawning
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Advances the session by `dt` seconds of wall time.
    ///
    /// Gravity steps when its clock fires; lateral movement then runs on its own
    /// repeat clock. A session that is over ignores further frames.
    pub fn update(&mut self, input: InputState, dt: f64) -> FrameReport {
        let mut report = FrameReport::default();
        if self.is_over() {
            return report;
        }

        if self.gravity.advance(dt, input.soft_drop) {
            let step = self.step();
            let over = step.game_over;
            report.step = Some(step);
            if over {
                return report;
            }
        }

        if let Some(direction) = self.mover.advance(input.direction, dt) {
            let shifted = self.grid.shift(direction);
            if shifted != self.grid {
                self.grid = shifted;
                report.moved = Some(direction);
            }
        }
        report
    }

    /// One gravity step: gravity, lock, clear while scoring, spawn when needed, game-over check.
    pub fn step(&mut self) -> StepReport {
        let mut report = StepReport::default();
        if self.is_over() {
            report.game_over = true;
            return report;
        }

        self.grid = self.grid.apply_gravity();

        let (grid, locked) = self.grid.lock();
        self.grid = grid;
        if locked {
            debug!("piece locked");
            report.locked = true;
            self.phase = Phase::Scoring;
        }

        if self.phase == Phase::Scoring {
            let outcome = self.grid.clear_runs();
            if outcome.any_cleared() {
                self.score.add_runs(outcome.runs_cleared);
                info!(
                    "cleared {} run(s), {} cell(s); score {}",
                    outcome.runs_cleared,
                    outcome.cells.len(),
                    self.score.value()
                );
            } else {
                self.phase = Phase::Spawning;
            }
            report.runs_cleared = outcome.runs_cleared;
            report.cleared_cells = outcome.cells;
            self.grid = outcome.grid;
        }

        if self.phase == Phase::Spawning {
            self.grid = self.grid.spawn(&mut self.source);
            self.phase = Phase::Falling;
            self.pieces_spawned += 1;
            report.spawned = self.grid.active_position().map(|(x, _)| x);
            debug!("spawned piece #{} at column {:?}", self.pieces_spawned, report.spawned);
        }

        debug_assert_eq!(self.grid.check_invariants(), Ok(()));

        if self.grid.is_game_over_condition() {
            info!("game over: score {}, pieces {}", self.score.value(), self.pieces_spawned);
            self.phase = Phase::GameOver;
            report.game_over = true;
        }
        report
    }
}
