/// ASCII level builder for unit tests.
///
/// Tiles: `#` Wall  `.` Path  `:` Dirt  `T` Titanium  `M` MagicWall
///        `X` Exit  `k` Key 7  `D` Door 7
/// Actors (on Path): `p` player  `b` boulder  `d` diamond  `a` amoeba
///        `f` frog  `l`/`r` firefly  `L`/`R` butterfly

use std::collections::BTreeSet;

use crate::config::SpeedConfig;
use crate::domain::entity::{FlyerSkin, Hand};
use crate::domain::tile::{Colour, TileKind};
use super::level::{ActorDef, ActorSpawn, AmoebaConfig, LevelDef, PlayerDef};
use super::runtime::Level;

pub fn def_from(rows: &[&str]) -> LevelDef {
    let height = rows.len();
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut tiles = vec![TileKind::Path; width * height];
    let mut player = PlayerDef { x: 0, y: 0, diamonds: 0, keys: BTreeSet::new() };
    let mut actors = vec![];

    for (y, row) in rows.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            let tile = match c {
                '#' => TileKind::Wall,
                ':' => TileKind::Dirt,
                'T' => TileKind::TitaniumWall,
                'M' => TileKind::MagicWall,
                'X' => TileKind::Exit { threshold: 0 },
                'k' => TileKind::Key { id: 7, colour: Colour::Red },
                'D' => TileKind::Door { id: 7, colour: Colour::Red },
                _ => TileKind::Path,
            };
            tiles[y * width + x] = tile;

            let spawn = match c {
                'p' => {
                    player.x = x;
                    player.y = y;
                    None
                }
                'b' => Some(ActorSpawn::Boulder),
                'd' => Some(ActorSpawn::Diamond),
                'a' => Some(ActorSpawn::Amoeba),
                'f' => Some(ActorSpawn::Frog),
                'l' => Some(ActorSpawn::Flyer(FlyerSkin::Firefly, Hand::Left)),
                'r' => Some(ActorSpawn::Flyer(FlyerSkin::Firefly, Hand::Right)),
                'L' => Some(ActorSpawn::Flyer(FlyerSkin::Butterfly, Hand::Left)),
                'R' => Some(ActorSpawn::Flyer(FlyerSkin::Butterfly, Hand::Right)),
                _ => None,
            };
            if let Some(kind) = spawn {
                actors.push(ActorDef { kind, x, y });
            }
        }
    }

    LevelDef {
        amoeba: AmoebaConfig { growth_rate: 1.0, max_colony: 100 },
        timer: 1000,
        diamond_threshold: 0,
        width,
        height,
        tiles,
        player,
        actors,
    }
}

/// Every actor acts every tick and input is read every tick.
pub fn fast_speed() -> SpeedConfig {
    let mut speed = SpeedConfig::default();
    speed.timer_cadence = 10;
    speed.input_rate = 1;
    let a = &mut speed.actors;
    a.player = 1;
    a.boulder = 1;
    a.diamond = 1;
    a.amoeba = 1;
    a.frog = 1;
    a.firefly = 1;
    a.butterfly = 1;
    a.amoeba_base_interval = 10;
    speed
}

pub fn level_from(rows: &[&str]) -> Level {
    level_with(rows, |_| {})
}

pub fn level_with(rows: &[&str], tweak: impl FnOnce(&mut LevelDef)) -> Level {
    let mut def = def_from(rows);
    tweak(&mut def);
    Level::new(&def, fast_speed(), 1).expect("test level should build")
}
