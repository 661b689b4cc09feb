/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use super::entity::{ActorId, ActorTag};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Colour {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Colour {
    pub fn code(self) -> char {
        match self {
            Colour::Red => 'R',
            Colour::Green => 'G',
            Colour::Blue => 'B',
            Colour::Yellow => 'Y',
        }
    }

    pub fn from_code(code: &str) -> Option<Colour> {
        match code {
            "R" => Some(Colour::Red),
            "G" => Some(Colour::Green),
            "B" => Some(Colour::Blue),
            "Y" => Some(Colour::Yellow),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TileKind {
    Wall,
    Dirt,         // Player tunnels through it, amoeba grows into it
    Path,         // Open floor
    MagicWall,    // Transmutes boulders <-> diamonds dropping onto it
    TitaniumWall, // Survives explosions
    Key { id: u32, colour: Colour },
    Door { id: u32, colour: Colour },
    Exit { threshold: u32 },
}

impl TileKind {
    /// Explosions turn this tile into Path.
    pub fn is_destroyable(self) -> bool {
        !matches!(self, TileKind::TitaniumWall)
    }

    /// Open floor that falling objects can drop or roll into.
    pub fn is_path(self) -> bool {
        matches!(self, TileKind::Path)
    }

    /// Can an actor of this kind stand on the tile?
    pub fn walkable_by(self, actor: ActorTag) -> bool {
        match self {
            TileKind::Path | TileKind::Key { .. } => true,
            TileKind::Dirt => matches!(actor, ActorTag::Player | ActorTag::Amoeba),
            TileKind::Wall
            | TileKind::MagicWall
            | TileKind::TitaniumWall
            | TileKind::Door { .. }
            | TileKind::Exit { .. } => false,
        }
    }

    /// Stable key the renderer maps to a glyph or sprite.
    pub fn image_key(self) -> &'static str {
        match self {
            TileKind::Wall => "wall",
            TileKind::Dirt => "dirt",
            TileKind::Path => "path",
            TileKind::MagicWall => "magic_wall",
            TileKind::TitaniumWall => "titanium_wall",
            TileKind::Key { colour, .. } => match colour {
                Colour::Red => "key_red",
                Colour::Green => "key_green",
                Colour::Blue => "key_blue",
                Colour::Yellow => "key_yellow",
            },
            TileKind::Door { colour, .. } => match colour {
                Colour::Red => "door_red",
                Colour::Green => "door_green",
                Colour::Blue => "door_blue",
                Colour::Yellow => "door_yellow",
            },
            TileKind::Exit { .. } => "exit",
        }
    }
}

impl Default for TileKind {
    fn default() -> Self {
        TileKind::Path
    }
}

/// One grid cell. Coordinates and kind are fixed for the tile's lifetime;
/// a kind change replaces the whole tile (see `Grid::change_tile`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    kind: TileKind,
    x: usize,
    y: usize,
    occupant: Option<ActorId>,
}

impl Tile {
    pub fn new(kind: TileKind, x: usize, y: usize) -> Self {
        Tile { kind, x, y, occupant: None }
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn occupant(&self) -> Option<ActorId> {
        self.occupant
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn is_destroyable(&self) -> bool {
        self.kind.is_destroyable()
    }

    /// Path with nobody on it.
    pub fn is_open_path(&self) -> bool {
        self.kind.is_path() && self.occupant.is_none()
    }

    // Only `Grid` touches occupancy, so the tile<->actor invariant has one writer.
    pub(crate) fn set_occupant(&mut self, occupant: Option<ActorId>) {
        self.occupant = occupant;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_titanium_survives_explosions() {
        assert!(!TileKind::TitaniumWall.is_destroyable());
        assert!(TileKind::Wall.is_destroyable());
        assert!(TileKind::Dirt.is_destroyable());
        assert!(TileKind::Exit { threshold: 3 }.is_destroyable());
    }

    #[test]
    fn dirt_is_for_player_and_amoeba() {
        assert!(TileKind::Dirt.walkable_by(ActorTag::Player));
        assert!(TileKind::Dirt.walkable_by(ActorTag::Amoeba));
        assert!(!TileKind::Dirt.walkable_by(ActorTag::Frog));
        assert!(!TileKind::Dirt.walkable_by(ActorTag::Boulder));
    }

    #[test]
    fn keys_are_walkable_doors_are_not() {
        let key = TileKind::Key { id: 1, colour: Colour::Red };
        let door = TileKind::Door { id: 1, colour: Colour::Red };
        assert!(key.walkable_by(ActorTag::Frog));
        assert!(!door.walkable_by(ActorTag::Player));
        assert!(!TileKind::Exit { threshold: 0 }.walkable_by(ActorTag::Player));
    }

    #[test]
    fn colour_codes_round_trip() {
        for c in [Colour::Red, Colour::Green, Colour::Blue, Colour::Yellow] {
            assert_eq!(Colour::from_code(&c.code().to_string()), Some(c));
        }
        assert_eq!(Colour::from_code("Q"), None);
    }
}
