/// Keyboard state tracker.
///
/// Tracks which keys are currently held so a held arrow keeps feeding the
/// level's input buffer, while one-shot keys (quit, save) fire only on the
/// initial press.
///
/// Terminals that report Release events end a hold immediately; the rest
/// fall back to a timeout since the last Press/Repeat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use cavern::domain::entity::Direction;

/// After this long without a Press/Repeat event, the key counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const MOVE_KEYS: [(Direction, [KeyCode; 3]); 4] = [
    (Direction::North, [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')]),
    (Direction::South, [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')]),
    (Direction::West, [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')]),
    (Direction::East, [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')]),
];

pub struct InputState {
    /// Timestamp of the last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events from the last drain, for modifier checks.
    raw_events: Vec<KeyEvent>,

    /// Only true when the terminal is known to send Release events.
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

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            self.raw_events.push(key);
            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    self.last_active.remove(&key.code);
                }
                KeyEventKind::Release => {}
                _ => {
                    if !self.is_held(key.code) {
                        self.fresh_presses.push(key.code);
                    }
                    self.last_active.insert(key.code, Instant::now());
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| t.elapsed() < HOLD_TIMEOUT)
    }

    /// Was this key freshly pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Movement requested this frame. A fresh press beats a key that was
    /// already held, so tapping a new direction turns immediately.
    pub fn direction(&self) -> Option<Direction> {
        let pressed = MOVE_KEYS
            .iter()
            .find(|(_, keys)| keys.iter().any(|&k| self.was_pressed(k)));
        let held = || MOVE_KEYS.iter().find(|(_, keys)| keys.iter().any(|&k| self.is_held(k)));
        pressed.or_else(held).map(|(dir, _)| *dir)
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }
}
