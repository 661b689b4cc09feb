/// Interaction rules between actors and tiles.
///
/// Pure functions, no side effects. These encode "what is legal" without
/// performing the action; `sim::step` and `sim::world` act on the answers.
///
/// ### Who may step onto an occupied tile
/// ┌──────────────┬──────────────────┬────────┐
/// │ Mover         │ Occupant          │ Allow? │
/// ├──────────────┼──────────────────┼────────┤
/// │ any           │ none / dead       │ YES    │
/// │ Player        │ live Diamond      │ YES (collected) │
/// │ any           │ anything else     │ NO     │
/// └──────────────┴──────────────────┴────────┘
///
/// ### What a falling object crushes (after a real fall)
/// ┌──────────────┬────────────────────────────────────────┐
/// │ Falling       │ Refuses to crush                        │
/// ├──────────────┼────────────────────────────────────────┤
/// │ Boulder       │ Diamond, Amoeba, Boulder, Firefly, Butterfly │
/// │ Diamond       │ Boulder, Amoeba, Diamond                │
/// └──────────────┴────────────────────────────────────────┘

use super::entity::ActorTag;
use super::tile::TileKind;

/// May `mover` enter a walkable tile holding `occupant`?
/// `occupant` is `(kind, alive)`.
pub fn can_walk_onto(mover: ActorTag, occupant: Option<(ActorTag, bool)>) -> bool {
    match occupant {
        None => true,
        Some((_, false)) => true,
        Some((ActorTag::Diamond, true)) => mover == ActorTag::Player,
        Some(_) => false,
    }
}

/// Does a falling `faller` blow up when it lands on `victim`?
pub fn crushes(faller: ActorTag, victim: ActorTag) -> bool {
    match faller {
        ActorTag::Boulder => !matches!(
            victim,
            ActorTag::Diamond
                | ActorTag::Amoeba
                | ActorTag::Boulder
                | ActorTag::Firefly
                | ActorTag::Butterfly
        ),
        ActorTag::Diamond => !matches!(
            victim,
            ActorTag::Boulder | ActorTag::Amoeba | ActorTag::Diamond
        ),
        _ => false,
    }
}

pub fn is_falling_kind(tag: ActorTag) -> bool {
    matches!(tag, ActorTag::Boulder | ActorTag::Diamond)
}

/// Kinds a flyer treats as moving obstacles. Seeing one arms the
/// loop breaker.
pub fn is_mover(tag: ActorTag) -> bool {
    tag.is_flyer() || tag == ActorTag::Frog
}

/// Does a flyer treat this neighbour as a wall to follow?
/// `occupant` is the live occupant, if any.
pub fn flyer_wall(kind: TileKind, occupant: Option<ActorTag>) -> bool {
    match occupant {
        Some(tag) if is_mover(tag) || is_falling_kind(tag) => true,
        Some(_) => false,
        None => matches!(
            kind,
            TileKind::Wall
                | TileKind::Dirt
                | TileKind::MagicWall
                | TileKind::Exit { .. }
                | TileKind::TitaniumWall
                | TileKind::Door { .. }
                | TileKind::Key { .. }
        ),
    }
}

/// Amoebas spread into empty Dirt or empty Path.
pub fn amoeba_can_grow_into(kind: TileKind, occupied: bool) -> bool {
    !occupied && matches!(kind, TileKind::Dirt | TileKind::Path)
}

/// Cells a dying flyer refills with boulders or diamonds.
pub fn flyer_blast_fills(kind: TileKind, occupied: bool) -> bool {
    !occupied
        && matches!(
            kind,
            TileKind::Wall
                | TileKind::Dirt
                | TileKind::MagicWall
                | TileKind::Door { .. }
                | TileKind::Key { .. }
                | TileKind::Path
        )
}

/// Manhattan distance of exactly one.
pub fn touching(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1) == 1
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Colour;

    #[test]
    fn empty_or_dead_occupants_never_block() {
        assert!(can_walk_onto(ActorTag::Frog, None));
        assert!(can_walk_onto(ActorTag::Frog, Some((ActorTag::Player, false))));
    }

    #[test]
    fn only_the_player_walks_onto_diamonds() {
        assert!(can_walk_onto(ActorTag::Player, Some((ActorTag::Diamond, true))));
        assert!(!can_walk_onto(ActorTag::Frog, Some((ActorTag::Diamond, true))));
        assert!(!can_walk_onto(ActorTag::Player, Some((ActorTag::Boulder, true))));
    }

    #[test]
    fn boulders_spare_flyers_diamonds_spare_nothing_moving() {
        assert!(crushes(ActorTag::Boulder, ActorTag::Player));
        assert!(crushes(ActorTag::Boulder, ActorTag::Frog));
        assert!(!crushes(ActorTag::Boulder, ActorTag::Firefly));
        assert!(!crushes(ActorTag::Boulder, ActorTag::Diamond));
        assert!(crushes(ActorTag::Diamond, ActorTag::Butterfly));
        assert!(crushes(ActorTag::Diamond, ActorTag::Player));
        assert!(!crushes(ActorTag::Diamond, ActorTag::Boulder));
        assert!(!crushes(ActorTag::Player, ActorTag::Frog));
    }

    #[test]
    fn flyer_walls() {
        assert!(flyer_wall(TileKind::Wall, None));
        assert!(flyer_wall(TileKind::Key { id: 1, colour: Colour::Blue }, None));
        assert!(!flyer_wall(TileKind::Path, None));
        assert!(flyer_wall(TileKind::Path, Some(ActorTag::Boulder)));
        assert!(flyer_wall(TileKind::Path, Some(ActorTag::Frog)));
        assert!(!flyer_wall(TileKind::Path, Some(ActorTag::Player)));
        assert!(!flyer_wall(TileKind::Path, Some(ActorTag::Amoeba)));
    }

    #[test]
    fn amoeba_growth_targets() {
        assert!(amoeba_can_grow_into(TileKind::Dirt, false));
        assert!(amoeba_can_grow_into(TileKind::Path, false));
        assert!(!amoeba_can_grow_into(TileKind::Path, true));
        assert!(!amoeba_can_grow_into(TileKind::Wall, false));
    }

    #[test]
    fn blast_fill_skips_titanium_and_exit() {
        assert!(flyer_blast_fills(TileKind::Wall, false));
        assert!(!flyer_blast_fills(TileKind::TitaniumWall, false));
        assert!(!flyer_blast_fills(TileKind::Exit { threshold: 1 }, false));
        assert!(!flyer_blast_fills(TileKind::Path, true));
    }

    #[test]
    fn touching_is_orthogonal_only() {
        assert!(touching((2, 2), (3, 2)));
        assert!(touching((2, 2), (2, 1)));
        assert!(!touching((2, 2), (3, 3)));
        assert!(!touching((2, 2), (2, 2)));
    }
}
