/// Actors: Player, Boulder, Diamond, Amoeba, Frog, Flyer (Firefly/Butterfly).
/// Kind-specific state lives inside `ActorKind`; everything else (position,
/// tick cadence, liveness) is shared in `Actor`.

use std::collections::{BTreeSet, VecDeque};

use super::flyer::MoveHistory;

/// Handle into the world's actor store. Tiles and chase targets hold these,
/// never the actor itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ActorId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// Which wall a flyer keeps its hand on.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn code(self) -> char {
        match self {
            Hand::Left => 'L',
            Hand::Right => 'R',
        }
    }
}

/// The two flyer skins share one automaton; they differ in cadence and in
/// what their death blast leaves behind.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum FlyerSkin {
    Firefly,
    Butterfly,
}

/// Flat kind tag, for predicates that don't care about per-kind state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ActorTag {
    Player,
    Boulder,
    Diamond,
    Amoeba,
    Frog,
    Firefly,
    Butterfly,
}

impl ActorTag {
    pub fn name(self) -> &'static str {
        match self {
            ActorTag::Player => "player",
            ActorTag::Boulder => "boulder",
            ActorTag::Diamond => "diamond",
            ActorTag::Amoeba => "amoeba",
            ActorTag::Frog => "frog",
            ActorTag::Firefly => "firefly",
            ActorTag::Butterfly => "butterfly",
        }
    }

    pub fn is_flyer(self) -> bool {
        matches!(self, ActorTag::Firefly | ActorTag::Butterfly)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub keys: BTreeSet<u32>,
    pub diamonds: u32,
    pub pending: Option<Direction>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FallingState {
    pub has_fallen: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AmoebaState {
    /// Ticks since this amoeba (or any colony sibling) last acted.
    pub since_growth: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrogState {
    pub target: ActorId,
    pub path: VecDeque<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlyerState {
    pub skin: FlyerSkin,
    pub hand: Hand,
    pub target: ActorId,
    /// `None` until the first update picks a facing from the surroundings.
    pub direction: Option<Direction>,
    pub history: MoveHistory,
    /// Sticky: another mover was seen next to us since the last loop break.
    pub saw_mover: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActorKind {
    Player(PlayerState),
    Boulder(FallingState),
    Diamond(FallingState),
    Amoeba(AmoebaState),
    Frog(FrogState),
    Flyer(FlyerState),
}

impl ActorKind {
    pub fn tag(&self) -> ActorTag {
        match self {
            ActorKind::Player(_) => ActorTag::Player,
            ActorKind::Boulder(_) => ActorTag::Boulder,
            ActorKind::Diamond(_) => ActorTag::Diamond,
            ActorKind::Amoeba(_) => ActorTag::Amoeba,
            ActorKind::Frog(_) => ActorTag::Frog,
            ActorKind::Flyer(f) => match f.skin {
                FlyerSkin::Firefly => ActorTag::Firefly,
                FlyerSkin::Butterfly => ActorTag::Butterfly,
            },
        }
    }

    pub fn boulder() -> Self {
        ActorKind::Boulder(FallingState::default())
    }

    pub fn diamond() -> Self {
        ActorKind::Diamond(FallingState::default())
    }

    pub fn amoeba() -> Self {
        ActorKind::Amoeba(AmoebaState::default())
    }

    pub fn frog(target: ActorId) -> Self {
        ActorKind::Frog(FrogState { target, path: VecDeque::new() })
    }

    pub fn flyer(skin: FlyerSkin, hand: Hand, target: ActorId) -> Self {
        ActorKind::Flyer(FlyerState {
            skin,
            hand,
            target,
            direction: None,
            history: MoveHistory::default(),
            saw_mover: false,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub x: usize,
    pub y: usize,
    pub kind: ActorKind,
    pub alive: bool,
    tick_rate: u32,
    tick_count: u32,
}

impl Actor {
    pub fn new(kind: ActorKind, x: usize, y: usize, tick_rate: u32) -> Self {
        Actor {
            x,
            y,
            kind,
            alive: true,
            tick_rate: tick_rate.max(1),
            tick_count: 0,
        }
    }

    pub fn tag(&self) -> ActorTag {
        self.kind.tag()
    }

    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Advance the accumulator. Fires (and resets) once every `tick_rate`
    /// calls; dead actors never fire.
    pub fn should_update(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.tick_count += 1;
        if self.tick_count >= self.tick_rate {
            self.tick_count = 0;
            return true;
        }
        false
    }

    pub fn image_key(&self) -> &'static str {
        match self.tag() {
            ActorTag::Player => "player",
            ActorTag::Boulder => "boulder",
            ActorTag::Diamond => "diamond",
            ActorTag::Amoeba => "amoeba",
            ActorTag::Frog => "frog",
            ActorTag::Firefly => "firefly",
            ActorTag::Butterfly => "butterfly",
        }
    }
}
