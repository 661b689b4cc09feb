/// Wall-following tables for Fireflies and Butterflies.
///
/// A flyer keeps one hand on a wall. Each move it tries four directions in a
/// fixed priority (toward the wall, straight, away from the wall, reverse)
/// and takes the first one that is not wall-like. Priorities are looked up by
/// `(hand, facing)`.
///
/// A short position history catches the flyer circling a single block (the
/// four canonical 4-step loops per hand). `sim::step` uses that to break
/// stalls when another mover keeps the flyer boxed in.

use super::entity::{Direction, Hand};
use Direction::{East, North, South, West};

// ── Turn priorities ──

/// Rows indexed by facing N, S, E, W.
const LEFT_PRIORITY: [[Direction; 4]; 4] = [
    [West, North, East, South],
    [East, South, West, North],
    [North, East, South, West],
    [South, West, North, East],
];

const RIGHT_PRIORITY: [[Direction; 4]; 4] = [
    [East, North, West, South],
    [West, South, East, North],
    [South, East, North, West],
    [North, West, South, East],
];

fn row(facing: Direction) -> usize {
    match facing {
        North => 0,
        South => 1,
        East => 2,
        West => 3,
    }
}

pub fn priorities(hand: Hand, facing: Direction) -> [Direction; 4] {
    match hand {
        Hand::Left => LEFT_PRIORITY[row(facing)],
        Hand::Right => RIGHT_PRIORITY[row(facing)],
    }
}

// ── Initial facing ──

/// `(probe, facing)`: if the neighbour in `probe` is blocked, start facing
/// `facing`. First hit wins.
const RIGHT_START: [(Direction, Direction); 4] =
    [(South, East), (West, South), (North, West), (East, North)];
const LEFT_START: [(Direction, Direction); 4] =
    [(North, East), (East, South), (South, West), (West, North)];

/// Pick a starting facing so the configured hand touches the first wall found.
/// `blocked` is asked about each probe direction in turn.
pub fn initial_facing(hand: Hand, mut blocked: impl FnMut(Direction) -> bool) -> Direction {
    let (table, fallback) = match hand {
        Hand::Right => (&RIGHT_START, South),
        Hand::Left => (&LEFT_START, North),
    };
    for &(probe, facing) in table.iter() {
        if blocked(probe) {
            return facing;
        }
    }
    fallback
}

// ── Loop detection ──

/// Offsets from the current cell: `[0]` is the cell itself, `[3]` the
/// position one move ago, `[2]` two moves ago, `[1]` three moves ago.
const LEFT_LOOPS: [[(i32, i32); 4]; 4] = [
    [(0, 0), (-1, 0), (-1, 1), (0, 1)],
    [(0, 0), (0, 1), (1, 1), (1, 0)],
    [(0, 0), (1, 0), (1, -1), (0, -1)],
    [(0, 0), (0, -1), (-1, -1), (-1, 0)],
];

const RIGHT_LOOPS: [[(i32, i32); 4]; 4] = [
    [(0, 0), (0, 1), (-1, 1), (-1, 0)],
    [(0, 0), (-1, 0), (-1, -1), (0, -1)],
    [(0, 0), (0, -1), (1, -1), (1, 0)],
    [(0, 0), (1, 0), (1, 1), (0, 1)],
];

/// Ring buffer of the last four positions a flyer updated from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveHistory {
    slots: [Option<(usize, usize)>; 4],
    next: usize,
}

impl MoveHistory {
    pub fn record(&mut self, pos: (usize, usize)) {
        self.slots[self.next] = Some(pos);
        self.next = (self.next + 1) % self.slots.len();
    }

    /// Position recorded `n` updates ago (1 = most recent).
    pub fn back(&self, n: usize) -> Option<(usize, usize)> {
        let len = self.slots.len();
        if n == 0 || n > len {
            return None;
        }
        self.slots[(self.next + len - n) % len]
    }

    /// Are the last three recorded positions, plus `current`, one of the
    /// hand's canonical loops? All three offsets come from the same pattern.
    pub fn is_looping(&self, hand: Hand, current: (usize, usize)) -> bool {
        let patterns = match hand {
            Hand::Left => &LEFT_LOOPS,
            Hand::Right => &RIGHT_LOOPS,
        };
        let (Some(p1), Some(p2), Some(p3)) = (self.back(1), self.back(2), self.back(3)) else {
            return false;
        };
        let rel = |p: (usize, usize)| {
            (p.0 as i64 - current.0 as i64, p.1 as i64 - current.1 as i64)
        };
        let (r1, r2, r3) = (rel(p1), rel(p2), rel(p3));
        patterns.iter().any(|pat| {
            let at = |i: usize| (pat[i].0 as i64, pat[i].1 as i64);
            r1 == at(3) && r2 == at(2) && r3 == at(1)
        })
    }
}
