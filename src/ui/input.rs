/// Input state tracker.
///
/// Tracks which keys are currently held, enabling:
///   - Continuous movement/climb/rewind while a key is held
///   - Edge-triggered attack (fires only on the initial press)
///
/// Uses crossterm's keyboard enhancement for Release events when available,
/// with a timeout-based fallback on terminals that don't report releases.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind};

use crate::domain::entity::InputFrame;

/// After this long without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of the last Press/Repeat event per key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned "not held" -> "held" during the most recent
    /// drain_events() call. Used for edge-triggered actions (attack, menus).
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Set at startup from the
    /// terminal's keyboard-enhancement probe.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call once per frame, before stepping the simulation.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key);
            }
        }

        // Expire keys that timed out (terminals without Release events)
        let now = Instant::now();
        self.last_active
            .retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Snapshot the held/fresh keys as one simulation input frame.
    pub fn frame(&self) -> InputFrame {
        InputFrame {
            left: self.any_held(&[KeyCode::Left, KeyCode::Char('a')]),
            right: self.any_held(&[KeyCode::Right, KeyCode::Char('d')]),
            up: self.any_held(&[KeyCode::Up, KeyCode::Char('w')]),
            down: self.any_held(&[KeyCode::Down, KeyCode::Char('s')]),
            jump: self.any_held(&[KeyCode::Char(' '), KeyCode::Char('k')]),
            rewind: self.any_held(&[KeyCode::Char('r'), KeyCode::Char('j')]),
            attack: self.any_pressed(&[KeyCode::Char('x'), KeyCode::Char('f')]),
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_inner(code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame carries Ctrl+C.
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn apply(&mut self, key: KeyEvent) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.is_held_inner(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn is_held_inner(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn release_clears_a_held_key_when_the_terminal_reports_releases() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        kb.apply(press(KeyCode::Char('d')));
        assert!(kb.is_held(KeyCode::Char('d')));
        kb.apply(release(KeyCode::Char('d')));
        assert!(!kb.is_held(KeyCode::Char('d')));
    }

    #[test]
    fn release_falls_back_to_hold_timeout_without_enhancement() {
        let mut kb = InputState::new();
        kb.apply(press(KeyCode::Char('d')));
        kb.apply(release(KeyCode::Char('d')));
        // Still held: expiry is the timeout sweep in drain_events
        assert!(kb.is_held(KeyCode::Char('d')));
    }

    #[test]
    fn repeat_does_not_count_as_a_fresh_press() {
        let mut kb = InputState::new();
        kb.apply(press(KeyCode::Char('x')));
        kb.apply(press(KeyCode::Char('x')));
        assert_eq!(
            kb.fresh_presses
                .iter()
                .filter(|c| **c == KeyCode::Char('x'))
                .count(),
            1
        );
    }
}
