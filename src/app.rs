//! App: terminal init, main loop, per-frame input sampling and simulation.

use crate::GameConfig;
use crate::game::GameState;
use crate::input::{Action, HeldKeys, key_to_action};
use crate::rng::FastrandSource;
use crate::theme::Theme;
use crate::ui::ClearFlash;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use log::{debug, info};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// Whether the loop keeps going after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    held: HeldKeys,
    last_frame: Instant,
    /// Fade over the cells emptied by the latest clear.
    clear_flash: Option<ClearFlash>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let state = new_session(config.seed);
        Self {
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            held: HeldKeys::new(false),
            last_frame: Instant::now(),
            clear_flash: None,
        }
    }

    fn reset_game(&mut self) {
        self.state = new_session(self.config.seed);
        self.screen = Screen::Playing;
        self.paused = false;
        self.held.clear();
        self.last_frame = Instant::now();
        self.clear_flash = None;
    }

    /// Runs until the player quits. Returns the score of the last session.
    ///
    /// The terminal is restored on every exit path, including setup failures.
    pub fn run(&mut self) -> Result<u32> {
        use crossterm::{
            event::PopKeyboardEnhancementFlags,
            execute,
            terminal::{LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut release_events = false;
        let result = self.run_in_terminal(&mut release_events);

        // Restore
        let mut stdout = std::io::stdout();
        if release_events {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        }
        let restored = execute!(stdout, LeaveAlternateScreen).and_then(|()| disable_raw_mode());
        let score = result?;
        restored?;
        Ok(score)
    }

    /// Everything between raw mode on and off. Sets `release_events` once the
    /// enhancement flags are pushed, so the caller knows to pop them.
    fn run_in_terminal(&mut self, release_events: &mut bool) -> Result<u32> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, supports_keyboard_enhancement},
        };

        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events let held keys end exactly when they are let go.
        *release_events = supports_keyboard_enhancement().unwrap_or(false)
            && execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        info!("key release events: {release_events}");
        self.held = HeldKeys::new(*release_events);

        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.run_loop(&mut terminal)
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<u32> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        self.last_frame = Instant::now();
        loop {
            let frame_start = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    &mut self.clear_flash,
                    frame_start,
                )
            })?;
            if self.clear_flash.as_ref().is_some_and(ClearFlash::is_done) {
                self.clear_flash = None;
            }

            let timeout = frame_duration.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if self.handle_key(key) == Flow::Quit {
                            return Ok(self.state.score());
                        }
                    }
                }
            }

            let now = Instant::now();
            let dt = now.saturating_duration_since(self.last_frame).as_secs_f64();
            self.last_frame = now;
            if self.screen == Screen::Playing && !self.paused {
                self.advance(now, dt);
            }
        }
    }

    fn advance(&mut self, now: Instant, dt: f64) {
        let input = self.held.sample(now);
        let report = self.state.update(input, dt);
        if let Some(direction) = report.moved {
            debug!("moved {direction:?}");
        }
        let Some(step) = report.step else {
            return;
        };
        debug!("step: {step:?}, phase {:?}", self.state.phase());
        if !step.cleared_cells.is_empty() && !self.config.no_animation {
            self.clear_flash = Some(ClearFlash::new(step.cleared_cells));
        }
        if step.game_over {
            self.screen = Screen::GameOver;
            self.held.clear();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        let action = key_to_action(key);
        if action.is_held() {
            self.held.handle(action, key.kind, Instant::now());
            return Flow::Continue;
        }
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        match (action, self.screen) {
            (Action::Quit, _) => {
                info!("quit with score {}", self.state.score());
                return Flow::Quit;
            }
            (Action::Pause, Screen::Playing) => {
                self.paused = !self.paused;
                debug!("paused: {}", self.paused);
            }
            (Action::Restart, Screen::GameOver) => {
                info!("restart after score {}", self.state.score());
                self.reset_game();
            }
            _ => {}
        }
        Flow::Continue
    }
}

fn new_session(seed: Option<u64>) -> GameState {
    let source = seed.map_or_else(FastrandSource::from_entropy, FastrandSource::with_seed);
    info!("new session, seed {}", source.seed());
    GameState::new(source)
}
