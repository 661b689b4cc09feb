/// Per-kind actor updates.
///
/// `update_actor` is called by the level runtime for each actor whose tick
/// rate has elapsed. Every update reads what it needs from the world, acts
/// through the world's mutators (`try_move`, `add_actor`, `remove_actor`,
/// `place_explosion`), and writes its own kind-specific state back last.
///
/// Processing per kind:
///   - Boulder / Diamond: magic wall → fall → crush → roll
///   - Amoeba: colony flood fill → kill hunters → harden / spread / crystallise
///   - Frog: kill on contact → follow cached A* path → random hop
///   - Firefly / Butterfly: kill on contact → crushed from above → wall-follow
///   - Player: push → interact → move

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use crate::domain::ai;
use crate::domain::entity::{
    Actor, ActorId, ActorKind, ActorTag, Direction, FallingState, FlyerSkin, FlyerState,
    FrogState, PlayerState,
};
use crate::domain::flyer;
use crate::domain::rules;
use crate::domain::tile::{Tile, TileKind};
use crate::error::GridError;
use super::event::GameEvent;
use super::world::World;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn update_actor(world: &mut World, id: ActorId) -> Result<(), GridError> {
    let tag = match world.live(id) {
        Some(a) => a.tag(),
        None => return Ok(()),
    };
    match tag {
        ActorTag::Player => update_player(world, id),
        ActorTag::Boulder | ActorTag::Diamond => update_falling(world, id),
        ActorTag::Amoeba => update_amoeba(world, id),
        ActorTag::Frog => update_frog(world, id),
        ActorTag::Firefly | ActorTag::Butterfly => update_flyer(world, id),
    }
}

fn is_open(world: &World, pos: Option<(usize, usize)>) -> bool {
    pos.and_then(|(x, y)| world.grid.get(x, y))
        .map_or(false, Tile::is_open_path)
}

// ══════════════════════════════════════════════════════════════
// Falling objects
// ══════════════════════════════════════════════════════════════

fn falling_state(world: &mut World, id: ActorId) -> Option<&mut FallingState> {
    match world.actor_mut(id).map(|a| &mut a.kind) {
        Some(ActorKind::Boulder(s)) | Some(ActorKind::Diamond(s)) => Some(s),
        _ => None,
    }
}

fn update_falling(world: &mut World, id: ActorId) -> Result<(), GridError> {
    let (tag, x, y, mut has_fallen) = match world.actor(id) {
        Some(a) => match a.kind {
            ActorKind::Boulder(s) | ActorKind::Diamond(s) => (a.tag(), a.x, a.y, s.has_fallen),
            _ => return Ok(()),
        },
        None => return Ok(()),
    };

    // Magic wall below: reappear as the other kind on its far side.
    if world.grid.kind_at(x, y + 1) == Some(TileKind::MagicWall)
        && is_open(world, world.grid.offset(x, y, 0, 2))
    {
        let (kind, into) = match tag {
            ActorTag::Boulder => (ActorKind::diamond(), ActorTag::Diamond),
            _ => (ActorKind::boulder(), ActorTag::Boulder),
        };
        world.retire(id)?;
        world.add_actor(kind, x, y + 2)?;
        world.emit(GameEvent::Transmuted { x, y: y + 2, into });
        return Ok(());
    }

    let mut moved = false;
    if is_open(world, world.grid.offset(x, y, 0, 1)) {
        moved = world.try_move(id, x, y + 1)?;
        has_fallen |= moved;
    }
    let (x, y) = world.actor(id).map_or((x, y), Actor::pos);

    if has_fallen {
        if let Some((_, victim)) = world.live_occupant(x, y + 1) {
            if rules::crushes(tag, victim) {
                if let Some(s) = falling_state(world, id) {
                    s.has_fallen = false;
                }
                world.place_explosion(x, y)?;
                return Ok(());
            }
        }
    }

    if !moved {
        has_fallen = false;
        roll(world, id, x, y)?;
    }
    if let Some(s) = falling_state(world, id) {
        s.has_fallen = has_fallen;
    }
    Ok(())
}

/// Slide off to one side when both that side and the cell below it are
/// open. Side preference is a coin flip; the other side is the fallback.
fn roll(world: &mut World, id: ActorId, x: usize, y: usize) -> Result<(), GridError> {
    if world.grid.kind_at(x, y + 1) == Some(TileKind::MagicWall) {
        return Ok(());
    }
    let sides: [i32; 2] = if world.rng.random_bool(0.5) { [1, -1] } else { [-1, 1] };
    for dx in sides {
        let side = world.grid.offset(x, y, dx, 0);
        let diagonal = world.grid.offset(x, y, dx, 1);
        if let (Some((sx, sy)), true, true) = (side, is_open(world, side), is_open(world, diagonal)) {
            world.try_move(id, sx, sy)?;
            return Ok(());
        }
    }
    Ok(())
}

pub fn can_be_pushed(world: &World, id: ActorId, dir: Direction) -> bool {
    match world.live(id) {
        Some(a) if a.tag() == ActorTag::Boulder => is_open(world, world.grid.step(a.x, a.y, dir)),
        _ => false,
    }
}

/// Shove a boulder one cell. Driven by the player, not the boulder's tick.
pub fn push(world: &mut World, id: ActorId, dir: Direction) -> Result<bool, GridError> {
    if !can_be_pushed(world, id, dir) {
        return Ok(false);
    }
    let target = world.live(id).and_then(|a| world.grid.step(a.x, a.y, dir));
    match target {
        Some((nx, ny)) => world.try_move(id, nx, ny),
        None => Ok(false),
    }
}

// ══════════════════════════════════════════════════════════════
// Amoeba
// ══════════════════════════════════════════════════════════════

/// Live amoebas connected to `(x, y)`, breadth-first from there.
fn colony(world: &World, x: usize, y: usize) -> Vec<(ActorId, (usize, usize))> {
    let is_amoeba = |p: (usize, usize)| match world.live_occupant(p.0, p.1) {
        Some((id, ActorTag::Amoeba)) => Some(id),
        _ => None,
    };
    let mut members = vec![];
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    if is_amoeba((x, y)).is_some() {
        seen.insert((x, y));
        queue.push_back((x, y));
    }
    while let Some(pos) = queue.pop_front() {
        if let Some(id) = is_amoeba(pos) {
            members.push((id, pos));
        }
        for next in world.grid.adjacent(pos.0, pos.1) {
            if !seen.contains(&next) && is_amoeba(next).is_some() {
                seen.insert(next);
                queue.push_back(next);
            }
        }
    }
    members
}

fn can_grow_into(world: &World, (x, y): (usize, usize)) -> bool {
    world.grid.get(x, y)
        .map_or(false, |t| rules::amoeba_can_grow_into(t.kind(), t.is_occupied()))
}

/// Replace every colony member with a boulder or diamond on a fresh Path.
fn convert_colony(
    world: &mut World,
    colony: &[(ActorId, (usize, usize))],
    into: ActorTag,
) -> Result<(), GridError> {
    for &(member, (mx, my)) in colony {
        world.retire(member)?;
        world.grid.remove_tile(mx, my)?;
        let kind = match into {
            ActorTag::Boulder => ActorKind::boulder(),
            _ => ActorKind::diamond(),
        };
        world.add_actor(kind, mx, my)?;
    }
    let size = colony.len();
    if into == ActorTag::Boulder {
        log::info!("amoeba colony of {size} hardened into boulders");
        world.emit(GameEvent::AmoebaHardened { size });
    } else {
        log::info!("amoeba colony of {size} crystallised into diamonds");
        world.emit(GameEvent::AmoebaCrystallised { size });
    }
    Ok(())
}

fn update_amoeba(world: &mut World, id: ActorId) -> Result<(), GridError> {
    let interval = world.amoeba_interval();
    let (x, y) = {
        let Some(a) = world.actor_mut(id) else {
            return Ok(());
        };
        let pos = a.pos();
        let ActorKind::Amoeba(st) = &mut a.kind else {
            return Ok(());
        };
        let due = st.since_growth >= interval;
        st.since_growth = st.since_growth.saturating_add(1);
        if !due {
            return Ok(());
        }
        pos
    };

    let colony = colony(world, x, y);

    // One action per colony per pass: siblings start counting again.
    for &(member, _) in &colony {
        if let Some(ActorKind::Amoeba(st)) = world.actor_mut(member).map(|a| &mut a.kind) {
            st.since_growth = 0;
        }
    }

    for &(_, (mx, my)) in &colony {
        for (nx, ny) in world.grid.adjacent(mx, my) {
            if let Some((victim, tag)) = world.live_occupant(nx, ny) {
                if rules::is_mover(tag) {
                    world.kill(victim);
                    world.remove_actor(victim)?;
                }
            }
        }
    }

    if colony.len() >= world.amoeba.max_colony {
        return convert_colony(world, &colony, ActorTag::Boulder);
    }

    if colony.len() > 1 {
        for &(_, (mx, my)) in &colony {
            let spot = world.grid.adjacent(mx, my).into_iter().find(|&p| can_grow_into(world, p));
            if let Some((nx, ny)) = spot {
                world.add_actor(ActorKind::amoeba(), nx, ny)?;
                return Ok(());
            }
        }
        return convert_colony(world, &colony, ActorTag::Diamond);
    }

    let candidates: Vec<(usize, usize)> = world
        .grid
        .adjacent(x, y)
        .into_iter()
        .filter(|&p| can_grow_into(world, p))
        .collect();
    if candidates.is_empty() {
        return convert_colony(world, &colony, ActorTag::Diamond);
    }
    let (nx, ny) = candidates[world.rng.random_range(0..candidates.len())];
    world.add_actor(ActorKind::amoeba(), nx, ny)?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Frog
// ══════════════════════════════════════════════════════════════

fn store_frog(world: &mut World, id: ActorId, state: FrogState) {
    if let Some(ActorKind::Frog(s)) = world.actor_mut(id).map(|a| &mut a.kind) {
        *s = state;
    }
}

fn update_frog(world: &mut World, id: ActorId) -> Result<(), GridError> {
    let (pos, mut st) = match world.actor(id) {
        Some(a) => match &a.kind {
            ActorKind::Frog(s) => (a.pos(), s.clone()),
            _ => return Ok(()),
        },
        None => return Ok(()),
    };
    let Some(quarry) = world.live(st.target).map(Actor::pos) else {
        return Ok(());
    };

    if rules::touching(pos, quarry) {
        world.kill(st.target);
        st.path.clear();
        store_frog(world, id, st);
        return Ok(());
    }

    let stale = match st.path.front() {
        None => true,
        Some(&next) => {
            !rules::touching(pos, next)
                || !ai::path_still_valid(&world.grid, &st.path, st.target, ActorTag::Frog)
        }
    };
    if stale {
        st.path = ai::find_path(&world.grid, pos, quarry, ActorTag::Frog);
    }

    match st.path.pop_front() {
        Some((nx, ny)) => {
            if !world.try_move(id, nx, ny)? {
                st.path.clear();
            }
        }
        None => {
            let options = world.grid.adjacent(pos.0, pos.1);
            if !options.is_empty() {
                let (nx, ny) = options[world.rng.random_range(0..options.len())];
                world.try_move(id, nx, ny)?;
            }
        }
    }
    store_frog(world, id, st);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Flyers (Firefly / Butterfly)
// ══════════════════════════════════════════════════════════════

fn store_flyer(world: &mut World, id: ActorId, state: FlyerState) {
    if let Some(ActorKind::Flyer(s)) = world.actor_mut(id).map(|a| &mut a.kind) {
        *s = state;
    }
}

/// Is the neighbour in `dir` something to keep a hand on? Off-grid counts.
/// Seeing a frog or another flyer sets `saw_mover`.
fn flyer_blocked(world: &World, x: usize, y: usize, dir: Direction, saw_mover: &mut bool) -> bool {
    let Some((nx, ny)) = world.grid.step(x, y, dir) else {
        return true;
    };
    let Some(kind) = world.grid.kind_at(nx, ny) else {
        return true;
    };
    let occupant = world.live_occupant(nx, ny).map(|(_, tag)| tag);
    if occupant.map_or(false, rules::is_mover) {
        *saw_mover = true;
    }
    rules::flyer_wall(kind, occupant)
}

/// Refill the 3×3 around a dead flyer: boulders for fireflies, diamonds for
/// butterflies.
fn death_blast(world: &mut World, skin: FlyerSkin, x: usize, y: usize) -> Result<(), GridError> {
    for dy in -1..=1 {
        for dx in -1..=1 {
            let Some((bx, by)) = world.grid.offset(x, y, dx, dy) else {
                continue;
            };
            let tile = world.grid.tile(bx, by)?;
            if !rules::flyer_blast_fills(tile.kind(), tile.is_occupied()) {
                continue;
            }
            world.grid.remove_tile(bx, by)?;
            let kind = match skin {
                FlyerSkin::Firefly => ActorKind::boulder(),
                FlyerSkin::Butterfly => ActorKind::diamond(),
            };
            world.add_actor(kind, bx, by)?;
        }
    }
    world.emit(GameEvent::Explosion { x, y });
    Ok(())
}

fn update_flyer(world: &mut World, id: ActorId) -> Result<(), GridError> {
    let ((x, y), mut st) = match world.actor(id) {
        Some(a) => match &a.kind {
            ActorKind::Flyer(s) => (a.pos(), s.clone()),
            _ => return Ok(()),
        },
        None => return Ok(()),
    };

    let facing = match st.direction {
        Some(d) => d,
        None => {
            let view: &World = world;
            let mut saw = st.saw_mover;
            let d = flyer::initial_facing(st.hand, |probe| flyer_blocked(view, x, y, probe, &mut saw));
            st.saw_mover = saw;
            d
        }
    };
    st.direction = Some(facing);

    if let Some(quarry) = world.live(st.target).map(Actor::pos) {
        if rules::touching((x, y), quarry) {
            world.kill(st.target);
            world.remove_actor(st.target)?;
            world.kill(id);
            world.remove_actor(id)?;
            return Ok(());
        }
    }

    if y > 0 {
        if let Some((above, tag)) = world.live_occupant(x, y - 1) {
            if rules::is_falling_kind(tag) {
                world.kill(above);
                world.remove_actor(above)?;
                world.place_explosion(x, y - 1)?;
                world.kill(id);
                world.remove_actor(id)?;
                return death_blast(world, st.skin, x, y);
            }
        }
    }

    // All four neighbours are probed before the loop check, so a mover
    // next to the flyer this tick can already break the loop.
    let mut saw = st.saw_mover;
    let probes = [Direction::North, Direction::East, Direction::South, Direction::West]
        .map(|dir| (dir, flyer_blocked(world, x, y, dir, &mut saw)));
    let blocked = |dir: Direction| probes.iter().any(|&(d, b)| d == dir && b);

    let looping = st.history.is_looping(st.hand, (x, y));
    st.history.record((x, y));
    let skip = if looping && saw {
        saw = false;
        1
    } else {
        0
    };
    st.saw_mover = saw;

    for dir in flyer::priorities(st.hand, facing).into_iter().skip(skip) {
        if blocked(dir) {
            continue;
        }
        st.direction = Some(dir);
        if let Some((nx, ny)) = world.grid.step(x, y, dir) {
            world.try_move(id, nx, ny)?;
        }
        break;
    }
    store_flyer(world, id, st);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn player_state(world: &mut World, id: ActorId) -> Option<&mut PlayerState> {
    match world.actor_mut(id).map(|a| &mut a.kind) {
        Some(ActorKind::Player(s)) => Some(s),
        _ => None,
    }
}

fn update_player(world: &mut World, id: ActorId) -> Result<(), GridError> {
    let Some((x, y)) = world.actor(id).map(Actor::pos) else {
        return Ok(());
    };
    let Some(dir) = player_state(world, id).and_then(|s| s.pending.take()) else {
        return Ok(());
    };
    let Some((tx, ty)) = world.grid.step(x, y, dir) else {
        return Ok(());
    };

    if matches!(dir, Direction::East | Direction::West) {
        if let Some((boulder, ActorTag::Boulder)) = world.live_occupant(tx, ty) {
            push(world, boulder, dir)?;
        }
    }

    interact(world, id, tx, ty)?;
    world.try_move(id, tx, ty)?;
    Ok(())
}

/// Whatever the player is about to step into reacts first.
fn interact(world: &mut World, id: ActorId, tx: usize, ty: usize) -> Result<(), GridError> {
    if let Some((diamond, ActorTag::Diamond)) = world.live_occupant(tx, ty) {
        world.retire(diamond)?;
        if let Some(s) = player_state(world, id) {
            s.diamonds += 1;
        }
        world.emit(GameEvent::DiamondCollected { x: tx, y: ty });
    }

    let threshold = world.diamond_threshold;
    match world.grid.tile(tx, ty)?.kind() {
        TileKind::Key { id: key, .. } => {
            if let Some(s) = player_state(world, id) {
                s.keys.insert(key);
            }
            world.grid.remove_tile(tx, ty)?;
            world.emit(GameEvent::KeyCollected { id: key, x: tx, y: ty });
        }
        TileKind::Door { id: door, .. } => {
            let unlocked = player_state(world, id).map_or(false, |s| s.keys.contains(&door));
            if unlocked {
                world.grid.remove_tile(tx, ty)?;
                world.emit(GameEvent::DoorOpened { id: door, x: tx, y: ty });
            }
        }
        TileKind::Exit { .. } => {
            let enough = player_state(world, id).map_or(false, |s| s.diamonds >= threshold);
            if enough {
                world.request_exit();
            }
        }
        _ => {}
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::runtime::Level;
    use crate::sim::testkit::{def_from, fast_speed, level_from, level_with};

    fn tag_at(level: &Level, x: usize, y: usize) -> Option<ActorTag> {
        level.world().live_occupant(x, y).map(|(_, t)| t)
    }

    fn tick(level: &mut Level, n: usize) -> Vec<GameEvent> {
        let mut events = vec![];
        for _ in 0..n {
            events.extend(level.advance_one_tick().unwrap());
            assert!(level.world().occupancy_consistent());
        }
        events
    }

    // ── Falling ──

    #[test]
    fn boulder_falls_down_a_shaft_and_stops() {
        let mut l = level_from(&["b", ".", ".", "#", "p"]);
        tick(&mut l, 1);
        assert_eq!(tag_at(&l, 0, 1), Some(ActorTag::Boulder));
        tick(&mut l, 1);
        assert_eq!(tag_at(&l, 0, 2), Some(ActorTag::Boulder));
        tick(&mut l, 3);
        assert_eq!(tag_at(&l, 0, 2), Some(ActorTag::Boulder));
    }

    #[test]
    fn falling_boulder_crushes_the_player() {
        let mut l = level_from(&[
            "#b#",
            "#.#",
            "#p#",
            "###",
        ]);
        let events = tick(&mut l, 1);
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Explosion { x: 1, y: 1 })));
        assert!(!l.player_alive());
        // the blast opened the walls around the landing cell
        assert_eq!(l.world().grid.kind_at(0, 1), Some(TileKind::Path));
    }

    #[test]
    fn resting_boulder_does_not_crush() {
        let mut l = level_from(&[
            "#b#",
            "#p#",
            "###",
        ]);
        let events = tick(&mut l, 3);
        assert!(!events.contains(&GameEvent::PlayerKilled));
        assert!(l.player_alive());
    }

    #[test]
    fn boulder_lands_on_diamond_without_exploding() {
        let mut l = level_from(&[
            "#b#",
            "#.#",
            "#d#",
            "###",
            "p..",
        ]);
        let events = tick(&mut l, 3);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Explosion { .. })));
        assert_eq!(tag_at(&l, 1, 1), Some(ActorTag::Boulder));
        assert_eq!(tag_at(&l, 1, 2), Some(ActorTag::Diamond));
    }

    #[test]
    fn boulder_rolls_off_into_an_open_side() {
        let mut l = level_from(&[
            "#b.",
            "#d.",
            "###",
            "p..",
        ]);
        tick(&mut l, 1);
        assert_eq!(tag_at(&l, 2, 0), Some(ActorTag::Boulder));
        tick(&mut l, 1);
        assert_eq!(tag_at(&l, 2, 1), Some(ActorTag::Boulder));
    }

    #[test]
    fn magic_wall_turns_boulders_into_diamonds() {
        let mut l = level_from(&[
            "b",
            "M",
            ".",
            "#",
            "p",
        ]);
        let events = tick(&mut l, 1);
        assert_eq!(tag_at(&l, 0, 0), None);
        assert_eq!(tag_at(&l, 0, 2), Some(ActorTag::Diamond));
        assert!(events.contains(&GameEvent::Transmuted { x: 0, y: 2, into: ActorTag::Diamond }));
    }

    #[test]
    fn magic_wall_blocked_below_holds_the_object() {
        let mut l = level_from(&["d", "M", "#", "p"]);
        tick(&mut l, 3);
        assert_eq!(tag_at(&l, 0, 0), Some(ActorTag::Diamond));
    }

    // ── Amoeba ──

    #[test]
    fn isolated_amoeba_spreads_into_dirt() {
        let mut l = level_with(&[
            "###",
            "#a:",
            "###",
            "p..",
        ], |def| def.amoeba.growth_rate = 10.0);
        tick(&mut l, 2);
        assert_eq!(tag_at(&l, 2, 1), Some(ActorTag::Amoeba));
    }

    #[test]
    fn enclosed_amoeba_crystallises() {
        let mut l = level_with(&[
            "###",
            "#a#",
            "###",
            "p..",
        ], |def| def.amoeba.growth_rate = 10.0);
        let events = tick(&mut l, 2);
        assert_eq!(tag_at(&l, 1, 1), Some(ActorTag::Diamond));
        assert!(events.contains(&GameEvent::AmoebaCrystallised { size: 1 }));
    }

    #[test]
    fn colony_hardens_at_max_size_and_never_exceeds_it() {
        let mut l = level_with(&[
            "#......#",
            "#a.....#",
            "########",
            "p.......",
        ], |def| {
            def.amoeba.growth_rate = 10.0;
            def.amoeba.max_colony = 4;
        });
        let mut hardened = false;
        for _ in 0..40 {
            let events = tick(&mut l, 1);
            let amoebas = l.actor_views().iter().filter(|v| v.kind == ActorTag::Amoeba).count();
            assert!(amoebas <= 4);
            if events.iter().any(|e| matches!(e, GameEvent::AmoebaHardened { size: 4 })) {
                hardened = true;
                break;
            }
        }
        assert!(hardened);
        let boulders = l.actor_views().iter().filter(|v| v.kind == ActorTag::Boulder).count();
        assert_eq!(boulders, 4);
    }

    #[test]
    fn amoeba_kills_adjacent_frogs() {
        let mut l = level_with(&[
            "####",
            "#af#",
            "####",
            "p...",
        ], |def| def.amoeba.growth_rate = 10.0);
        let events = tick(&mut l, 2);
        assert!(events.contains(&GameEvent::ActorKilled { kind: ActorTag::Frog, x: 2, y: 1 }));
        assert!(l.actor_views().iter().all(|v| v.kind != ActorTag::Frog));
    }

    // ── Frog ──

    #[test]
    fn frog_chases_down_a_corridor() {
        let mut l = level_from(&["f...p"]);
        let mut killed_at = None;
        for t in 1..=4 {
            if tick(&mut l, 1).contains(&GameEvent::PlayerKilled) {
                killed_at = Some(t);
                break;
            }
        }
        assert_eq!(killed_at, Some(4));
        assert_eq!(tag_at(&l, 3, 0), Some(ActorTag::Frog));
    }

    #[test]
    fn frog_goes_quiet_once_the_player_is_dead() {
        let mut l = level_from(&["f.p"]);
        tick(&mut l, 2);
        assert!(!l.player_alive());
        let frog_before = l.actor_views().into_iter().find(|v| v.kind == ActorTag::Frog);
        tick(&mut l, 3);
        let frog_after = l.actor_views().into_iter().find(|v| v.kind == ActorTag::Frog);
        assert_eq!(frog_before.map(|v| (v.x, v.y)), frog_after.map(|v| (v.x, v.y)));
    }

    // ── Flyers ──

    #[test]
    fn flyer_kills_the_player_on_contact() {
        let mut l = level_from(&["lp"]);
        let events = tick(&mut l, 1);
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert_eq!(tag_at(&l, 0, 0), None);
        assert_eq!(tag_at(&l, 1, 0), None);
    }

    #[test]
    fn flyer_follows_the_wall() {
        let mut l = level_from(&[
            "#####",
            "#r..#",
            "#...#",
            "#####",
            "p....",
        ]);
        tick(&mut l, 1);
        // right hand on the west wall: heads south first
        let pos = l.actor_views().into_iter().find(|v| v.kind == ActorTag::Firefly).map(|v| (v.x, v.y));
        assert_eq!(pos, Some((1, 2)));
        for _ in 0..20 {
            tick(&mut l, 1);
            let v = l.actor_views().into_iter().find(|v| v.kind == ActorTag::Firefly);
            let (x, y) = v.map(|v| (v.x, v.y)).unwrap();
            assert!((1..=3).contains(&x) && (1..=2).contains(&y));
        }
    }

    fn flyer_pos(level: &Level) -> Option<(usize, usize)> {
        level.actor_views().into_iter().find(|v| v.kind == ActorTag::Firefly).map(|v| (v.x, v.y))
    }

    #[test]
    fn left_hand_flyer_starts_along_the_ceiling() {
        let mut l = level_from(&["#####", "#.l.#", "#####", "p...."]);
        tick(&mut l, 1);
        assert_eq!(flyer_pos(&l), Some((3, 1)));
    }

    /// Open room, left-hand firefly at (2,2). With nothing to touch it
    /// circles W, S, E, N back to where it started.
    const OPEN_ROOM: [&str; 7] = [
        "######",
        "#....#",
        "#.l..#",
        "#....#",
        "#....#",
        "######",
        "p.....",
    ];

    #[test]
    fn lone_flyer_circles_a_square() {
        let mut l = level_from(&OPEN_ROOM);
        let mut trail = vec![];
        for _ in 0..4 {
            tick(&mut l, 1);
            trail.push(flyer_pos(&l));
        }
        assert_eq!(trail, vec![Some((1, 2)), Some((1, 3)), Some((2, 3)), Some((2, 2))]);
    }

    #[test]
    fn mover_beside_a_looping_flyer_breaks_the_loop() {
        // A frog that never acts sits east of the square's last corner.
        let mut rows = OPEN_ROOM;
        rows[3] = "#..f.#";
        let mut speed = fast_speed();
        speed.actors.frog = 1000;
        let mut l = Level::new(&def_from(&rows), speed, 1).unwrap();
        tick(&mut l, 3);
        assert_eq!(flyer_pos(&l), Some((2, 3)));
        // Fourth move: the loop is spotted with the frog adjacent, so the
        // flyer skips its first choice (north) and, with east taken by the
        // frog, drops south.
        tick(&mut l, 1);
        assert_eq!(flyer_pos(&l), Some((2, 4)));
    }

    #[test]
    fn butterfly_crushed_from_above_leaves_diamonds() {
        let mut l = level_from(&[
            "TTTTT",
            "T#b#T",
            "T.R.T",
            "T###T",
            "TTTTT",
            "p....",
        ]);
        let events = tick(&mut l, 1);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Explosion { .. })));
        assert_eq!(tag_at(&l, 2, 2), Some(ActorTag::Diamond));
        assert_eq!(l.world().grid.kind_at(2, 3), Some(TileKind::Path));
        assert_eq!(tag_at(&l, 2, 3), Some(ActorTag::Diamond));
    }

    // ── Player ──

    #[test]
    fn player_collects_diamonds_and_digs() {
        let mut l = level_from(&["pd:"]);
        l.push_input(Direction::East);
        let events = tick(&mut l, 1);
        assert!(events.contains(&GameEvent::DiamondCollected { x: 1, y: 0 }));
        assert_eq!(l.score(), 1);
        assert_eq!(tag_at(&l, 1, 0), Some(ActorTag::Player));
        l.push_input(Direction::East);
        tick(&mut l, 1);
        assert_eq!(l.world().grid.kind_at(2, 0), Some(TileKind::Path));
    }

    #[test]
    fn player_pushes_boulders_sideways() {
        let mut l = level_from(&["pb.", "###"]);
        l.push_input(Direction::East);
        tick(&mut l, 1);
        assert_eq!(tag_at(&l, 2, 0), Some(ActorTag::Boulder));
        assert_eq!(tag_at(&l, 1, 0), Some(ActorTag::Player));
    }

    #[test]
    fn key_opens_matching_door() {
        let mut l = level_from(&["pkD."]);
        l.push_input(Direction::East);
        let events = tick(&mut l, 1);
        assert!(events.contains(&GameEvent::KeyCollected { id: 7, x: 1, y: 0 }));
        l.push_input(Direction::East);
        let events = tick(&mut l, 1);
        assert!(events.contains(&GameEvent::DoorOpened { id: 7, x: 2, y: 0 }));
        assert_eq!(l.world().grid.kind_at(2, 0), Some(TileKind::Path));
        assert_eq!(tag_at(&l, 2, 0), Some(ActorTag::Player));
    }

    #[test]
    fn exit_needs_enough_diamonds() {
        let mut l = level_with(&["dpX"], |def| def.diamond_threshold = 1);
        l.push_input(Direction::East);
        tick(&mut l, 1);
        assert!(!l.world().level_complete());
        assert_eq!(tag_at(&l, 1, 0), Some(ActorTag::Player));

        l.push_input(Direction::West);
        tick(&mut l, 1);
        l.push_input(Direction::East);
        tick(&mut l, 1);
        l.push_input(Direction::East);
        let events = tick(&mut l, 1);
        assert!(events.contains(&GameEvent::ExitReached));
        assert!(l.world().level_complete());
    }
}
