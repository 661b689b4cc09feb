/// World: the grid orchestrator.
///
/// ## Ownership
///
/// Actors live in an arena (`Vec<Option<Actor>>`) indexed by `ActorId`.
/// Ids are handed out in order and never reused. Tiles and chase targets
/// hold ids; nothing else holds an actor.
///
/// ## Mutation discipline
///
/// The active update order belongs to `Level`. The world never edits it:
/// spawns and removals go into `pending_spawns` / `pending_removals`, which
/// `Level` drains once per tick after the sweep.
///
/// Occupancy is written only through `Grid::set_occupant`, from
/// `add_actor`, `try_move` and `remove_actor`, so the tile↔actor pairing
/// stays symmetric.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::ActorRates;
use crate::domain::entity::{Actor, ActorId, ActorKind, ActorTag};
use crate::domain::grid::Grid;
use crate::domain::rules;
use crate::domain::tile::TileKind;
use crate::error::GridError;
use super::event::GameEvent;
use super::level::AmoebaConfig;

/// Ticks a blast footprint stays on screen.
pub const EXPLOSION_DISPLAY_TICKS: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplosionMark {
    pub cells: Vec<(usize, usize)>,
    pub age: u32,
}

pub struct World {
    pub grid: Grid,
    actors: Vec<Option<Actor>>,
    pending_spawns: Vec<ActorId>,
    pending_removals: Vec<ActorId>,
    explosion: Option<ExplosionMark>,
    exit_requested: bool,
    events: Vec<GameEvent>,

    /// The player is always the first actor added to a level.
    pub player: ActorId,
    pub diamond_threshold: u32,
    pub amoeba: AmoebaConfig,
    pub rates: ActorRates,
    pub rng: Pcg32,
}

impl World {
    pub fn new(
        grid: Grid,
        amoeba: AmoebaConfig,
        rates: ActorRates,
        diamond_threshold: u32,
        seed: u64,
    ) -> Self {
        World {
            grid,
            actors: Vec::new(),
            pending_spawns: Vec::new(),
            pending_removals: Vec::new(),
            explosion: None,
            exit_requested: false,
            events: Vec::new(),
            player: ActorId(0),
            diamond_threshold,
            amoeba,
            rates,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    // ── Actor lookup ──

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn live(&self, id: ActorId) -> Option<&Actor> {
        self.actor(id).filter(|a| a.alive)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.live(id).is_some()
    }

    /// Every actor still in the arena, dead or alive.
    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.actors
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|a| (ActorId(i as u32), a)))
    }

    /// Live occupant of `(x, y)`, if any.
    pub fn live_occupant(&self, x: usize, y: usize) -> Option<(ActorId, ActorTag)> {
        let id = self.grid.occupant_at(x, y)?;
        self.live(id).map(|a| (id, a.tag()))
    }

    pub fn tick_rate_for(&self, tag: ActorTag) -> u32 {
        let r = &self.rates;
        match tag {
            ActorTag::Player => r.player,
            ActorTag::Boulder => r.boulder,
            ActorTag::Diamond => r.diamond,
            ActorTag::Amoeba => r.amoeba,
            ActorTag::Frog => r.frog,
            ActorTag::Firefly => r.firefly,
            ActorTag::Butterfly => r.butterfly,
        }
    }

    /// Ticks between amoeba growth steps at this level's growth rate.
    pub fn amoeba_interval(&self) -> u32 {
        if self.amoeba.growth_rate <= 0.0 {
            return u32::MAX;
        }
        (self.rates.amoeba_base_interval as f32 / self.amoeba.growth_rate) as u32
    }

    // ── Spawning and removal (deferred) ──

    /// Place a new actor on the grid and queue it for the active list.
    pub fn add_actor(&mut self, kind: ActorKind, x: usize, y: usize) -> Result<ActorId, GridError> {
        let tag = kind.tag();
        let tile = self.grid.tile(x, y)?;
        if tile.is_occupied() {
            return Err(GridError::Occupied { x, y });
        }
        if !tile.kind().walkable_by(tag) {
            return Err(GridError::NotWalkable { x, y, actor: tag.name() });
        }
        let id = ActorId(self.actors.len() as u32);
        let rate = self.tick_rate_for(tag);
        self.actors.push(Some(Actor::new(kind, x, y, rate)));
        self.grid.set_occupant(x, y, Some(id))?;
        self.pending_spawns.push(id);
        Ok(id)
    }

    /// Queue `id` for removal and release its tile.
    pub fn remove_actor(&mut self, id: ActorId) -> Result<(), GridError> {
        let (x, y) = self.actor(id).ok_or(GridError::UnknownActor(id))?.pos();
        if self.grid.occupant_at(x, y) == Some(id) {
            self.grid.set_occupant(x, y, None)?;
        }
        if !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
        Ok(())
    }

    /// Queue whatever stands on `(x, y)` for removal and clear the tile.
    pub fn remove_actor_at(&mut self, x: usize, y: usize) -> Result<(), GridError> {
        match self.grid.tile(x, y)?.occupant() {
            Some(id) => self.remove_actor(id),
            None => Ok(()),
        }
    }

    pub fn take_spawns(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.pending_spawns)
    }

    pub fn take_removals(&mut self) -> Vec<ActorId> {
        std::mem::take(&mut self.pending_removals)
    }

    /// Drop an actor from the arena. The player's record is kept so the
    /// final score survives its death.
    pub fn free(&mut self, id: ActorId) {
        if id == self.player {
            return;
        }
        if let Some(slot) = self.actors.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    /// Clear the tile of a dead actor that still claims it.
    pub fn release_if_dead(&mut self, id: ActorId) -> Result<(), GridError> {
        let Some(a) = self.actor(id) else {
            return Ok(());
        };
        if a.alive {
            return Ok(());
        }
        let (x, y) = a.pos();
        if self.grid.occupant_at(x, y) == Some(id) {
            self.grid.set_occupant(x, y, None)?;
        }
        Ok(())
    }

    /// Take an actor off the board without counting it as a death
    /// (collected, transmuted, absorbed into a conversion).
    pub fn retire(&mut self, id: ActorId) -> Result<(), GridError> {
        if let Some(a) = self.actor_mut(id) {
            a.kill();
        }
        self.remove_actor(id)
    }

    pub fn kill(&mut self, id: ActorId) {
        let player = self.player;
        let Some(a) = self.actor_mut(id) else {
            return;
        };
        if !a.alive {
            return;
        }
        a.kill();
        let (kind, x, y) = (a.tag(), a.x, a.y);
        if id == player {
            log::info!("player killed at ({x}, {y})");
            self.emit(GameEvent::PlayerKilled);
        } else {
            log::debug!("{} killed at ({x}, {y})", kind.name());
            self.emit(GameEvent::ActorKilled { kind, x, y });
        }
    }

    // ── Movement ──

    /// Move `id` to `(x, y)` if the tile is walkable for its kind and free
    /// (or holds something it may walk onto). Returns whether it moved.
    pub fn try_move(&mut self, id: ActorId, x: usize, y: usize) -> Result<bool, GridError> {
        let (tag, ox, oy) = {
            let a = self.actor(id).ok_or(GridError::UnknownActor(id))?;
            (a.tag(), a.x, a.y)
        };
        let Some(tile) = self.grid.get(x, y) else {
            return Ok(false);
        };
        let kind = tile.kind();
        if !kind.walkable_by(tag) {
            return Ok(false);
        }
        let displaced = tile.occupant();
        let occupant = displaced.and_then(|o| self.actor(o).map(|a| (a.tag(), a.alive)));
        if !rules::can_walk_onto(tag, occupant) {
            return Ok(false);
        }
        if let (Some(other), Some((_, true))) = (displaced, occupant) {
            // A live occupant we may walk onto is a diamond under the player.
            self.retire(other)?;
        }

        if self.grid.occupant_at(ox, oy) == Some(id) {
            self.grid.set_occupant(ox, oy, None)?;
        }
        self.grid.set_occupant(x, y, Some(id))?;
        if let Some(a) = self.actor_mut(id) {
            a.x = x;
            a.y = y;
        }
        if tag == ActorTag::Player && kind == TileKind::Dirt {
            self.grid.change_tile(x, y, TileKind::Path)?;
        }
        Ok(true)
    }

    // ── Explosions ──

    /// Blow up the 3×3 block around `(cx, cy)`. Every destroyable tile in it
    /// loses its occupant and becomes Path.
    pub fn place_explosion(&mut self, cx: usize, cy: usize) -> Result<(), GridError> {
        let mut cells = Vec::with_capacity(9);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some((x, y)) = self.grid.offset(cx, cy, dx, dy) else {
                    continue;
                };
                let tile = self.grid.tile(x, y)?;
                if !tile.is_destroyable() {
                    continue;
                }
                if let Some(occupant) = tile.occupant() {
                    self.kill(occupant);
                }
                self.grid.change_tile(x, y, TileKind::Path)?;
                cells.push((x, y));
            }
        }
        log::debug!("explosion at ({cx}, {cy}) covering {} cells", cells.len());
        self.emit(GameEvent::Explosion { x: cx, y: cy });
        self.explosion = Some(ExplosionMark { cells, age: 0 });
        Ok(())
    }

    pub fn age_explosion(&mut self) {
        if let Some(mark) = self.explosion.as_mut() {
            mark.age = mark.age.saturating_add(1);
        }
    }

    /// Cells of a blast young enough to still be drawn.
    pub fn explosion_cells(&self) -> &[(usize, usize)] {
        match &self.explosion {
            Some(mark) if mark.age < EXPLOSION_DISPLAY_TICKS => &mark.cells,
            _ => &[],
        }
    }

    // ── Exit latch ──

    pub fn request_exit(&mut self) {
        if !self.exit_requested {
            log::info!("exit reached");
            self.emit(GameEvent::ExitReached);
        }
        self.exit_requested = true;
    }

    pub fn level_complete(&self) -> bool {
        self.exit_requested
    }

    // ── Events ──

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Audit ──

    /// Every occupied tile points at an actor standing exactly there, and
    /// no actor is claimed by two tiles.
    pub fn occupancy_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.grid.tiles().all(|t| match t.occupant() {
            None => true,
            Some(id) => {
                seen.insert(id)
                    && self.actor(id).map_or(false, |a| a.pos() == (t.x(), t.y()))
            }
        })
    }
}
