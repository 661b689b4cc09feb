/// Procedural cave generator.
///
/// Phases, in order:
///   1. random stone/open field
///   2. ten passes of a five-point blur
///   3. classify: < 0.5 Wall, < 0.6 Dirt, else Path
///   4. titanium border
///   5. flood-fill caves and carve tunnels between successive cave origins
///   6. place player, actors and special tiles on open Path cells
///
/// The result is a plain `LevelDef`: it parses back from its own text and
/// loads into a `Level` without spawn errors.

use std::collections::{BTreeSet, HashSet};

use rand::Rng;

use crate::domain::entity::{FlyerSkin, Hand};
use crate::domain::tile::{Colour, TileKind};
use super::level::{ActorDef, ActorSpawn, AmoebaConfig, LevelDef, PlayerDef};

pub const MIN_SIZE: usize = 5;

const STONE_CHANCE: f64 = 0.45;
const BLUR_PASSES: usize = 10;
const STONE_THRESHOLD: f32 = 0.5;
const DIRT_THRESHOLD: f32 = 0.6;
const PLACE_ATTEMPTS: usize = 200;

const GROWTH_RATE: f32 = 1.0;
const MAX_COLONY: usize = 30;
const TIMER: u32 = 230;
const MAX_THRESHOLD: u32 = 12;
const KEY_ID: u32 = 1;

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Generate a cave at least `MIN_SIZE` on each side.
pub fn generate_cave(width: usize, height: usize, rng: &mut impl Rng) -> LevelDef {
    let width = width.max(MIN_SIZE);
    let height = height.max(MIN_SIZE);
    let area = width * height;

    let tiles = carve_caves(width, height, rng);
    let mut placer = Placer { width, height, tiles, occupied: HashSet::new(), player: None };

    let (px, py) = placer.place_player(rng);
    let mut actors = vec![];
    let a = &mut actors;
    scatter(&mut placer, a, rng, ActorSpawn::Boulder, (area / 40).max(1));
    scatter(&mut placer, a, rng, ActorSpawn::Diamond, (area / 50).max(1));
    scatter(&mut placer, a, rng, ActorSpawn::Frog, 1);
    let hand = random_hand(rng);
    scatter(&mut placer, a, rng, ActorSpawn::Flyer(FlyerSkin::Butterfly, hand), 1);
    scatter(&mut placer, a, rng, ActorSpawn::Amoeba, 1);
    let hand = random_hand(rng);
    scatter(&mut placer, a, rng, ActorSpawn::Flyer(FlyerSkin::Firefly, hand), 1);

    let diamonds = actors.iter().filter(|a| a.kind == ActorSpawn::Diamond).count() as u32;
    let threshold = diamonds.min(MAX_THRESHOLD);

    for _ in 0..2 {
        placer.set_tile(rng, TileKind::MagicWall);
    }
    placer.set_tile(rng, TileKind::Key { id: KEY_ID, colour: Colour::Red });
    placer.set_tile(rng, TileKind::Door { id: KEY_ID, colour: Colour::Red });
    placer.set_tile(rng, TileKind::Exit { threshold });

    log::info!(
        "generated {width}x{height} cave: {} actors, {diamonds} diamonds",
        actors.len()
    );

    LevelDef {
        amoeba: AmoebaConfig { growth_rate: GROWTH_RATE, max_colony: MAX_COLONY },
        timer: TIMER,
        diamond_threshold: threshold,
        width,
        height,
        tiles: placer.tiles,
        player: PlayerDef { x: px, y: py, diamonds: 0, keys: BTreeSet::new() },
        actors,
    }
}

fn scatter(
    placer: &mut Placer,
    actors: &mut Vec<ActorDef>,
    rng: &mut impl Rng,
    kind: ActorSpawn,
    count: usize,
) {
    let falls = matches!(kind, ActorSpawn::Boulder | ActorSpawn::Diamond);
    for _ in 0..count {
        if let Some((x, y)) = placer.spot(rng, falls) {
            placer.occupied.insert((x, y));
            actors.push(ActorDef { kind, x, y });
        }
    }
}

fn random_hand(rng: &mut impl Rng) -> Hand {
    if rng.random_bool(0.5) { Hand::Left } else { Hand::Right }
}

// ══════════════════════════════════════════════════════════════
// Terrain
// ══════════════════════════════════════════════════════════════

fn carve_caves(width: usize, height: usize, rng: &mut impl Rng) -> Vec<TileKind> {
    let mut field: Vec<f32> = (0..width * height)
        .map(|_| if rng.random_bool(STONE_CHANCE) { 0.0 } else { 1.0 })
        .collect();
    for _ in 0..BLUR_PASSES {
        field = blur(&field, width, height);
    }

    let mut tiles: Vec<TileKind> = field
        .iter()
        .map(|&v| {
            if v < STONE_THRESHOLD {
                TileKind::Wall
            } else if v < DIRT_THRESHOLD {
                TileKind::Dirt
            } else {
                TileKind::Path
            }
        })
        .collect();

    for y in 0..height {
        for x in 0..width {
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                tiles[y * width + x] = TileKind::TitaniumWall;
            }
        }
    }

    let origins = cave_origins(&tiles, width, height);
    for pair in origins.windows(2) {
        tunnel(&mut tiles, width, pair[0], pair[1]);
    }
    // A solid field still needs somewhere to stand.
    if origins.is_empty() {
        let (cx, cy) = (width / 2, height / 2);
        tiles[cy * width + cx] = TileKind::Path;
        tiles[cy * width + cx - 1] = TileKind::Path;
    }
    tiles
}

/// Average of each cell and its in-bounds orthogonal neighbours.
fn blur(field: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mut out = vec![0.0; field.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = field[y * width + x];
            let mut n = 1.0;
            for (nx, ny) in neighbours(x, y, width, height) {
                sum += field[ny * width + nx];
                n += 1.0;
            }
            out[y * width + x] = sum / n;
        }
    }
    out
}

fn neighbours(x: usize, y: usize, width: usize, height: usize) -> impl Iterator<Item = (usize, usize)> {
    [(1i32, 0i32), (-1, 0), (0, 1), (0, -1)].into_iter().filter_map(move |(dx, dy)| {
        let nx = x.checked_add_signed(dx as isize)?;
        let ny = y.checked_add_signed(dy as isize)?;
        (nx < width && ny < height).then_some((nx, ny))
    })
}

fn is_cave(kind: TileKind) -> bool {
    matches!(kind, TileKind::Dirt | TileKind::Path)
}

/// First cell (row-major) of every connected cave.
fn cave_origins(tiles: &[TileKind], width: usize, height: usize) -> Vec<(usize, usize)> {
    let mut seen = vec![false; tiles.len()];
    let mut origins = vec![];
    for start in 0..tiles.len() {
        if seen[start] || !is_cave(tiles[start]) {
            continue;
        }
        origins.push((start % width, start / width));
        seen[start] = true;
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            for (nx, ny) in neighbours(i % width, i / width, width, height) {
                let j = ny * width + nx;
                if !seen[j] && is_cave(tiles[j]) {
                    seen[j] = true;
                    stack.push(j);
                }
            }
        }
    }
    origins
}

/// Open every wall along an L-shaped route from `a` to `b`.
fn tunnel(tiles: &mut [TileKind], width: usize, a: (usize, usize), b: (usize, usize)) {
    let (mut x, y) = a;
    while x != b.0 {
        open(tiles, width, x, y);
        x = if x < b.0 { x + 1 } else { x - 1 };
    }
    let mut y = y;
    while y != b.1 {
        open(tiles, width, x, y);
        y = if y < b.1 { y + 1 } else { y - 1 };
    }
    open(tiles, width, x, y);
}

fn open(tiles: &mut [TileKind], width: usize, x: usize, y: usize) {
    let cell = &mut tiles[y * width + x];
    if *cell == TileKind::Wall {
        *cell = TileKind::Path;
    }
}

// ══════════════════════════════════════════════════════════════
// Placement
// ══════════════════════════════════════════════════════════════

struct Placer {
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
    occupied: HashSet<(usize, usize)>,
    player: Option<(usize, usize)>,
}

impl Placer {
    fn kind(&self, x: usize, y: usize) -> TileKind {
        self.tiles[y * self.width + x]
    }

    fn is_free_path(&self, x: usize, y: usize) -> bool {
        self.kind(x, y) == TileKind::Path && !self.occupied.contains(&(x, y))
    }

    fn usable(&self, x: usize, y: usize, falls: bool) -> bool {
        self.is_free_path(x, y)
            && neighbours(x, y, self.width, self.height).any(|(nx, ny)| self.is_free_path(nx, ny))
            && !(falls && self.drops_onto_player(x, y))
    }

    /// A falling object here would land on the player's head.
    fn drops_onto_player(&self, x: usize, y: usize) -> bool {
        match self.player {
            Some((px, py)) if px == x && y < py => {
                (y + 1..py).all(|yy| self.kind(x, yy) == TileKind::Path)
            }
            _ => false,
        }
    }

    fn spot(&self, rng: &mut impl Rng, falls: bool) -> Option<(usize, usize)> {
        (0..PLACE_ATTEMPTS)
            .map(|_| (rng.random_range(1..self.width - 1), rng.random_range(1..self.height - 1)))
            .find(|&(x, y)| self.usable(x, y, falls))
    }

    fn place_player(&mut self, rng: &mut impl Rng) -> (usize, usize) {
        let pos = self.spot(rng, false).unwrap_or_else(|| {
            // Fall back to the first open interior cell, opening one if needed.
            let found = (0..self.tiles.len())
                .map(|i| (i % self.width, i / self.width))
                .find(|&(x, y)| self.kind(x, y) == TileKind::Path);
            found.unwrap_or_else(|| {
                let centre = (self.width / 2, self.height / 2);
                self.tiles[centre.1 * self.width + centre.0] = TileKind::Path;
                centre
            })
        });
        self.occupied.insert(pos);
        self.player = Some(pos);
        pos
    }

    fn set_tile(&mut self, rng: &mut impl Rng, kind: TileKind) {
        if let Some((x, y)) = self.spot(rng, false) {
            self.tiles[y * self.width + x] = kind;
            self.occupied.insert((x, y));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::config::SpeedConfig;
    use crate::sim::level::parse_level;
    use crate::sim::runtime::Level;
    use crate::sim::save::serialize_level;

    fn cave(seed: u64, w: usize, h: usize) -> LevelDef {
        generate_cave(w, h, &mut Pcg32::seed_from_u64(seed))
    }

    #[test]
    fn border_is_titanium() {
        let def = cave(3, 20, 12);
        for x in 0..def.width {
            assert_eq!(def.tile(x, 0), Some(TileKind::TitaniumWall));
            assert_eq!(def.tile(x, def.height - 1), Some(TileKind::TitaniumWall));
        }
        for y in 0..def.height {
            assert_eq!(def.tile(0, y), Some(TileKind::TitaniumWall));
            assert_eq!(def.tile(def.width - 1, y), Some(TileKind::TitaniumWall));
        }
    }

    #[test]
    fn same_seed_same_cave() {
        assert_eq!(cave(11, 30, 16), cave(11, 30, 16));
    }

    #[test]
    fn tiny_requests_are_padded() {
        let def = cave(1, 1, 2);
        assert_eq!((def.width, def.height), (MIN_SIZE, MIN_SIZE));
        assert!(Level::new(&def, SpeedConfig::default(), 1).is_ok());
    }

    #[test]
    fn caves_are_connected_after_carving() {
        for seed in 0..10 {
            let (w, h) = (24, 14);
            let tiles = carve_caves(w, h, &mut Pcg32::seed_from_u64(seed));
            assert!(cave_origins(&tiles, w, h).len() <= 1, "seed {seed}");
        }
    }

    #[test]
    fn generated_levels_load_and_round_trip() {
        for seed in 0..20 {
            let def = cave(seed, 32, 18);
            assert_eq!(def.tile(def.player.x, def.player.y), Some(TileKind::Path));
            for a in &def.actors {
                assert_eq!(def.tile(a.x, a.y), Some(TileKind::Path), "seed {seed}");
            }
            let diamonds = def.actors.iter().filter(|a| a.kind == ActorSpawn::Diamond).count();
            assert!(def.diamond_threshold as usize <= diamonds.min(12));
            assert_eq!(parse_level(&serialize_level(&def)).unwrap(), def);
            let level = Level::new(&def, SpeedConfig::default(), seed).unwrap();
            assert!(level.occupancy_consistent());
        }
    }

    #[test]
    fn nothing_hangs_over_the_player() {
        for seed in 0..20 {
            let def = cave(seed, 32, 18);
            let (px, py) = (def.player.x, def.player.y);
            let clear_drop = def.actors.iter().any(|a| {
                matches!(a.kind, ActorSpawn::Boulder | ActorSpawn::Diamond)
                    && a.x == px
                    && a.y < py
                    && (a.y + 1..py).all(|y| def.tile(px, y) == Some(TileKind::Path))
            });
            assert!(!clear_drop, "seed {seed}");
        }
    }
}
