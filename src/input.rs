//! Key bindings (arrows and vim-style) and held-key tracking for the per-frame input sample.

use crate::game::InputState;
use crate::grid::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Without release events, a key is only treated as held once the OS auto-repeat
/// has sent a second event; a lone press counts for a single frame.
/// Two events closer together than this belong to the same hold.
const REPEAT_WINDOW: Duration = Duration::from_millis(600);
/// Once auto-repeat is running, the hold ends this long after the last repeat.
const REPEAT_TIMEOUT: Duration = Duration::from_millis(100);

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Pause,
    Restart,
    Quit,
    None,
}

impl Action {
    /// Actions that are sampled as "held" every frame rather than fired once.
    pub fn is_held(self) -> bool {
        matches!(self, Self::MoveLeft | Self::MoveRight | Self::SoftDrop)
    }
}

/// Map key event to game action. Supports both normal (arrows) and vim (hjkl) keys.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        _ => Action::None,
    }
}

/// One tracked key.
#[derive(Debug, Clone, Copy)]
struct KeyHold {
    /// Last press or repeat.
    last: Instant,
    /// A second event arrived, so this is an OS auto-repeat hold.
    repeating: bool,
    /// The first press has already been sampled.
    reported: bool,
}

impl KeyHold {
    fn pressed(now: Instant) -> Self {
        Self {
            last: now,
            repeating: false,
            reported: false,
        }
    }

    /// Whether this key counts as down for the frame sampled at `now`.
    /// Returns `None` once the key should be forgotten.
    fn sample_without_release(&mut self, now: Instant) -> Option<bool> {
        let since = now.saturating_duration_since(self.last);
        if self.repeating {
            return (since < REPEAT_TIMEOUT).then_some(true);
        }
        if !self.reported {
            self.reported = true;
            return Some(true);
        }
        (since < REPEAT_WINDOW).then_some(false)
    }
}

/// Which movement keys are currently down.
///
/// Fed with key events as they arrive; sampled once per frame into an `InputState`.
#[derive(Debug, Clone)]
pub struct HeldKeys {
    left: Option<KeyHold>,
    right: Option<KeyHold>,
    soft_drop: Option<KeyHold>,
    /// Terminal reports key releases, so a press holds until its release.
    release_events: bool,
}

impl HeldKeys {
    pub fn new(release_events: bool) -> Self {
        Self {
            left: None,
            right: None,
            soft_drop: None,
            release_events,
        }
    }

    fn slot(&mut self, action: Action) -> Option<&mut Option<KeyHold>> {
        match action {
            Action::MoveLeft => Some(&mut self.left),
            Action::MoveRight => Some(&mut self.right),
            Action::SoftDrop => Some(&mut self.soft_drop),
            _ => None,
        }
    }

    /// Records a key event for a held action. Other actions are ignored.
    pub fn handle(&mut self, action: Action, kind: KeyEventKind, now: Instant) {
        let Some(slot) = self.slot(action) else {
            return;
        };
        if kind == KeyEventKind::Release {
            *slot = None;
            return;
        }
        match slot {
            Some(hold) if now.saturating_duration_since(hold.last) < REPEAT_WINDOW => {
                hold.last = now;
                hold.repeating = true;
            }
            _ => *slot = Some(KeyHold::pressed(now)),
        }
    }

    pub fn clear(&mut self) {
        self.left = None;
        self.right = None;
        self.soft_drop = None;
    }

    /// Current sample. Left and right together cancel out.
    pub fn sample(&mut self, now: Instant) -> InputState {
        let release_events = self.release_events;
        let down = |slot: &mut Option<KeyHold>| -> bool {
            let Some(hold) = slot.as_mut() else {
                return false;
            };
            if release_events {
                return true;
            }
            let state = hold.sample_without_release(now);
            if state.is_none() {
                *slot = None;
            }
            state.unwrap_or(false)
        };
        let left = down(&mut self.left);
        let right = down(&mut self.right);
        let soft_drop = down(&mut self.soft_drop);
        let direction = match (left, right) {
            (true, false) => Some(Direction::Left),
            (false, true) => Some(Direction::Right),
            _ => None,
        };
        InputState { direction, soft_drop }
    }
}
