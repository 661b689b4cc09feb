/// Level runtime: owns the world and drives the tick.
///
/// One call to `advance_one_tick` is one simulation step:
///   1. age the blast marker, advance the countdown
///   2. hand buffered input to the player
///   3. sweep the active list in order, updating actors whose rate elapsed
///   4. drop dead actors, merge spawns, apply removals
///
/// Spawns made during a sweep join the list afterwards, so a newborn actor
/// never acts in the tick that created it.

use std::collections::HashSet;

use crate::config::SpeedConfig;
use crate::domain::entity::{ActorId, ActorKind, ActorTag, Direction, PlayerState};
use crate::domain::grid::Grid;
use crate::error::GridError;
use super::event::GameEvent;
use super::input::InputBuffer;
use super::level::{ActorDef, ActorSpawn, LevelDef, PlayerDef};
use super::step;
use super::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelState {
    Updating,
    PlayerDied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    PlayerDead,
    TimeOut,
    LevelComplete,
}

/// What the renderer needs to draw one actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorView {
    pub id: ActorId,
    pub kind: ActorTag,
    pub alive: bool,
    pub x: usize,
    pub y: usize,
    pub image_key: &'static str,
}

pub struct Level {
    world: World,
    active: Vec<ActorId>,
    speed: SpeedConfig,
    input: InputBuffer,
    timer: u32,
    sub_ticks: u32,
    state: LevelState,
    death_ticks: u32,
    ticks: u64,
}

impl Level {
    pub fn new(def: &LevelDef, speed: SpeedConfig, seed: u64) -> Result<Self, GridError> {
        let grid = Grid::from_kinds(def.width, def.height, &def.tiles);
        let mut world = World::new(
            grid,
            def.amoeba,
            speed.actors.clone(),
            def.diamond_threshold,
            seed,
        );

        let player = PlayerState {
            keys: def.player.keys.clone(),
            diamonds: def.player.diamonds,
            pending: None,
        };
        world.player = world.add_actor(ActorKind::Player(player), def.player.x, def.player.y)?;
        let target = world.player;

        for a in &def.actors {
            let kind = match a.kind {
                ActorSpawn::Boulder => ActorKind::boulder(),
                ActorSpawn::Diamond => ActorKind::diamond(),
                ActorSpawn::Amoeba => ActorKind::amoeba(),
                ActorSpawn::Frog => ActorKind::frog(target),
                ActorSpawn::Flyer(skin, hand) => ActorKind::flyer(skin, hand, target),
            };
            world.add_actor(kind, a.x, a.y)?;
        }
        let active = world.take_spawns();

        log::info!(
            "level started: {}x{}, {} actors, timer {}, threshold {}",
            def.width,
            def.height,
            active.len(),
            def.timer,
            def.diamond_threshold
        );

        Ok(Level {
            world,
            active,
            input: InputBuffer::new(speed.input_rate),
            speed,
            timer: def.timer,
            sub_ticks: 0,
            state: LevelState::Updating,
            death_ticks: 0,
            ticks: 0,
        })
    }

    /// Buffer a move for the player. Newer input replaces older.
    pub fn push_input(&mut self, dir: Direction) {
        self.input.push(dir);
    }

    // ── Tick ──

    pub fn advance_one_tick(&mut self) -> Result<Vec<GameEvent>, GridError> {
        self.ticks += 1;
        self.world.age_explosion();

        if self.state == LevelState::PlayerDied {
            self.death_ticks += 1;
            return Ok(self.world.take_events());
        }

        self.sub_ticks += 1;
        if self.sub_ticks >= self.speed.timer_cadence {
            self.sub_ticks = 0;
            self.timer = self.timer.saturating_sub(1);
        }

        let player = self.world.player;
        if let Some(dir) = self.input.read() {
            if let Some(ActorKind::Player(s)) = self.world.actor_mut(player).map(|a| &mut a.kind) {
                s.pending = Some(dir);
            }
        }

        // Index loop: the list is not edited during the sweep.
        for i in 0..self.active.len() {
            let id = self.active[i];
            let due = self.world.actor_mut(id).map_or(false, |a| a.should_update());
            if due {
                step::update_actor(&mut self.world, id)?;
            }
        }

        self.settle()?;

        if !self.world.is_alive(player) {
            self.state = LevelState::PlayerDied;
        }
        Ok(self.world.take_events())
    }

    /// Post-sweep bookkeeping on the active list.
    fn settle(&mut self) -> Result<(), GridError> {
        for &id in &self.active {
            self.world.release_if_dead(id)?;
        }
        let mut dead = vec![];
        self.active.retain(|&id| {
            let alive = self.world.is_alive(id);
            if !alive {
                dead.push(id);
            }
            alive
        });

        for id in self.world.take_spawns() {
            if self.world.is_alive(id) {
                self.active.push(id);
            } else {
                self.world.release_if_dead(id)?;
                dead.push(id);
            }
        }

        let removals: HashSet<ActorId> = self.world.take_removals().into_iter().collect();
        if !removals.is_empty() {
            self.active.retain(|id| !removals.contains(id));
            dead.extend(removals);
        }

        for id in dead {
            self.world.free(id);
        }
        Ok(())
    }

    /// Player death (once the grace ticks are spent), then timeout, then the
    /// exit latch. Inside the grace window the other two still apply.
    pub fn exit_reason(&self) -> Option<ExitReason> {
        if self.state == LevelState::PlayerDied && self.death_ticks > self.speed.death_grace_ticks {
            return Some(ExitReason::PlayerDead);
        }
        if self.timer == 0 {
            return Some(ExitReason::TimeOut);
        }
        self.world.level_complete().then_some(ExitReason::LevelComplete)
    }

    // ── Queries ──

    pub fn score(&self) -> u32 {
        match self.world.actor(self.world.player).map(|a| &a.kind) {
            Some(ActorKind::Player(s)) => s.diamonds,
            _ => 0,
        }
    }

    pub fn keys(&self) -> Vec<u32> {
        match self.world.actor(self.world.player).map(|a| &a.kind) {
            Some(ActorKind::Player(s)) => s.keys.iter().copied().collect(),
            _ => vec![],
        }
    }

    /// Where the player stands, or stood when it died.
    pub fn player_pos(&self) -> Option<(usize, usize)> {
        self.world.actor(self.world.player).map(|a| a.pos())
    }

    pub fn player_alive(&self) -> bool {
        self.world.is_alive(self.world.player)
    }

    pub fn status_line(&self) -> String {
        format!(
            "Diamond count: {}/{}. Time left: {}.",
            self.score(),
            self.world.diamond_threshold,
            self.timer
        )
    }

    /// Snapshot of the level as it stands, in the shape level files use.
    pub fn to_def(&self) -> LevelDef {
        let player_id = self.world.player;
        let (px, py, diamonds, keys) = match self.world.actor(player_id) {
            Some(a) => match &a.kind {
                ActorKind::Player(s) => (a.x, a.y, s.diamonds, s.keys.clone()),
                _ => (a.x, a.y, 0, Default::default()),
            },
            None => (0, 0, 0, Default::default()),
        };

        let actors = self
            .active
            .iter()
            .filter_map(|&id| self.world.live(id))
            .filter_map(|a| {
                let kind = match &a.kind {
                    ActorKind::Boulder(_) => ActorSpawn::Boulder,
                    ActorKind::Diamond(_) => ActorSpawn::Diamond,
                    ActorKind::Amoeba(_) => ActorSpawn::Amoeba,
                    ActorKind::Frog(_) => ActorSpawn::Frog,
                    ActorKind::Flyer(f) => ActorSpawn::Flyer(f.skin, f.hand),
                    ActorKind::Player(_) => return None,
                };
                Some(ActorDef { kind, x: a.x, y: a.y })
            })
            .collect();

        LevelDef {
            amoeba: self.world.amoeba,
            timer: self.timer,
            diamond_threshold: self.world.diamond_threshold,
            width: self.world.grid.width(),
            height: self.world.grid.height(),
            tiles: self.world.grid.kinds(),
            player: PlayerDef { x: px, y: py, diamonds, keys },
            actors,
        }
    }

    pub fn tile_image_key(&self, x: usize, y: usize) -> Option<&'static str> {
        self.world.grid.kind_at(x, y).map(|k| k.image_key())
    }

    /// Live actors in update order.
    pub fn actor_views(&self) -> Vec<ActorView> {
        self.active
            .iter()
            .filter_map(|&id| self.world.live(id).map(|a| (id, a)))
            .map(|(id, a)| ActorView {
                id,
                kind: a.tag(),
                alive: a.alive,
                x: a.x,
                y: a.y,
                image_key: a.image_key(),
            })
            .collect()
    }

    pub fn explosion_cells(&self) -> &[(usize, usize)] {
        self.world.explosion_cells()
    }

    pub fn width(&self) -> usize {
        self.world.grid.width()
    }

    pub fn height(&self) -> usize {
        self.world.grid.height()
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn occupancy_consistent(&self) -> bool {
        self.world.occupancy_consistent()
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
