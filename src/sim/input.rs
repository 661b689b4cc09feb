/// Single-slot input buffer between the host and the player actor.
///
/// The host writes whenever a key arrives; newer input overwrites older.
/// The tick loop reads at most once every `rate` ticks, and a successful
/// read empties the slot.

use crate::domain::entity::Direction;

#[derive(Clone, Debug)]
pub struct InputBuffer {
    slot: Option<Direction>,
    rate: u32,
    count: u32,
}

impl InputBuffer {
    pub fn new(rate: u32) -> Self {
        InputBuffer { slot: None, rate: rate.max(1), count: 0 }
    }

    pub fn push(&mut self, dir: Direction) {
        self.slot = Some(dir);
    }

    pub fn peek(&self) -> Option<Direction> {
        self.slot
    }

    /// Called once per tick. Yields the buffered command only on eligible
    /// ticks.
    pub fn read(&mut self) -> Option<Direction> {
        self.count += 1;
        if self.count < self.rate {
            return None;
        }
        self.count = 0;
        self.slot.take()
    }
}
