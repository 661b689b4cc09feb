/// Level serializer and save slots.
///
/// `serialize_level` writes the same text grammar `parse_level` reads, so a
/// running level can be captured with `Level::to_def` and resumed later.
///
/// ## Slot files
///   `save_<slot>.txt` in the save directory:
///     line 1: level index
///     rest: level text
///
/// Slots are plain files; any number is accepted.

use std::path::{Path, PathBuf};

use crate::domain::entity::FlyerSkin;
use crate::domain::tile::TileKind;
use crate::error::SaveError;
use super::level::{parse_level, ActorSpawn, LevelDef};
use super::runtime::Level;

// ══════════════════════════════════════════════════════════════
// Serializer
// ══════════════════════════════════════════════════════════════

pub fn tile_code(kind: TileKind) -> String {
    match kind {
        TileKind::Wall => "W".into(),
        TileKind::Dirt => "D".into(),
        TileKind::Path => "P".into(),
        TileKind::MagicWall => "M".into(),
        TileKind::TitaniumWall => "T".into(),
        TileKind::Key { id, colour } => format!("K {id} {}", colour.code()),
        TileKind::Door { id, colour } => format!("Do {id} {}", colour.code()),
        TileKind::Exit { threshold } => format!("E {threshold}"),
    }
}

fn actor_code(kind: ActorSpawn) -> String {
    match kind {
        ActorSpawn::Boulder => "B".into(),
        ActorSpawn::Diamond => "Di".into(),
        ActorSpawn::Amoeba => "A".into(),
        ActorSpawn::Frog => "F".into(),
        ActorSpawn::Flyer(FlyerSkin::Butterfly, hand) => format!("Bu {}", hand.code()),
        ActorSpawn::Flyer(FlyerSkin::Firefly, hand) => format!("Fi {}", hand.code()),
    }
}

pub fn serialize_level(def: &LevelDef) -> String {
    let mut lines = vec![
        "Level".to_string(),
        def.amoeba.growth_rate.to_string(),
        def.amoeba.max_colony.to_string(),
        def.timer.to_string(),
        def.diamond_threshold.to_string(),
        "Grid".to_string(),
        format!("{} {}", def.width, def.height),
    ];
    lines.extend(def.tiles.chunks(def.width.max(1)).map(|row| {
        row.iter().map(|&k| tile_code(k)).collect::<Vec<_>>().join(",")
    }));

    lines.push("Player".to_string());
    let keys: Vec<String> = def.player.keys.iter().map(u32::to_string).collect();
    let key_list = if keys.is_empty() { String::new() } else { format!("{} ", keys.join(" ")) };
    lines.push(format!(
        "{} {} {} {{ {}}}",
        def.player.x, def.player.y, def.player.diamonds, key_list
    ));

    lines.push("Actor".to_string());
    let actors: Vec<String> = def
        .actors
        .iter()
        .map(|a| {
            let code = actor_code(a.kind);
            match code.split_once(' ') {
                Some((head, hand)) => format!("{head} {} {} {hand}", a.x, a.y),
                None => format!("{code} {} {}", a.x, a.y),
            }
        })
        .collect();
    lines.push(actors.join(","));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// ══════════════════════════════════════════════════════════════
// Slot operations
// ══════════════════════════════════════════════════════════════

fn slot_path(dir: &Path, slot: u8) -> PathBuf {
    dir.join(format!("save_{slot}.txt"))
}

pub fn has_slot(dir: &Path, slot: u8) -> bool {
    slot_path(dir, slot).exists()
}

/// Write the running level into a slot, creating the directory if needed.
/// A level whose player has died is not saved: its cell may already hold
/// something else.
pub fn save_slot(dir: &Path, slot: u8, level_index: usize, level: &Level) -> Result<(), SaveError> {
    if !level.player_alive() {
        return Err(SaveError::PlayerDead);
    }
    std::fs::create_dir_all(dir)?;
    let content = format!("{level_index}\n{}", serialize_level(&level.to_def()));
    let path = slot_path(dir, slot);
    std::fs::write(&path, content)?;
    log::info!("saved slot {slot} to {}", path.display());
    Ok(())
}

/// Returns the saved level index and the level as it stood.
pub fn load_slot(dir: &Path, slot: u8) -> Result<(usize, LevelDef), SaveError> {
    let text = std::fs::read_to_string(slot_path(dir, slot))?;
    let (head, body) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    let index = head.trim().parse().map_err(|_| SaveError::MissingHeader)?;
    let def = parse_level(body).map_err(|mut e| {
        // report lines as they appear in the slot file
        e.line += 1;
        e
    })?;
    log::info!("loaded slot {slot} (level {index})");
    Ok((index, def))
}

pub fn delete_slot(dir: &Path, slot: u8) -> Result<(), SaveError> {
    let path = slot_path(dir, slot);
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
