/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/cavern`. Falls back to defaults if the file is missing
/// or incomplete; a malformed file is reported and ignored.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub levels_dir: PathBuf,
    pub save_dir: PathBuf,
    pub seed: Option<u64>,
}

/// Everything the tick loop needs to know about pacing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub timer_cadence: u32,     // sub-ticks per timer second
    pub input_rate: u32,        // ticks between input reads
    pub death_grace_ticks: u32, // ticks shown after the player dies
    pub actors: ActorRates,
}

/// Per-kind tick rates: an actor acts once every `n` ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorRates {
    pub player: u32,
    pub boulder: u32,
    pub diamond: u32,
    pub amoeba: u32,
    pub frog: u32,
    pub firefly: u32,
    pub butterfly: u32,
    /// Amoeba growth interval at growth rate 1.0.
    pub amoeba_base_interval: u32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        let t = TomlConfig::default();
        speed_from(&t.speed, &t.actors)
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    actors: TomlActors,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_timer_cadence")]
    timer_cadence: u32,
    #[serde(default = "default_input_rate")]
    input_rate: u32,
    #[serde(default = "default_death_grace")]
    death_grace_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlActors {
    #[serde(default = "default_player_rate")]
    player: u32,
    #[serde(default = "default_falling_rate")]
    boulder: u32,
    #[serde(default = "default_falling_rate")]
    diamond: u32,
    #[serde(default = "default_amoeba_rate")]
    amoeba: u32,
    #[serde(default = "default_frog_rate")]
    frog: u32,
    #[serde(default = "default_firefly_rate")]
    firefly: u32,
    #[serde(default = "default_butterfly_rate")]
    butterfly: u32,
    #[serde(default = "default_amoeba_interval")]
    amoeba_base_interval: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_save_dir")]
    save_dir: String,
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 100 }
fn default_timer_cadence() -> u32 { 10 }  // one timer second per 10 ticks
fn default_input_rate() -> u32 { 2 }
fn default_death_grace() -> u32 { 10 }

fn default_player_rate() -> u32 { 2 }
fn default_falling_rate() -> u32 { 3 }
fn default_amoeba_rate() -> u32 { 1 }
fn default_frog_rate() -> u32 { 4 }
fn default_firefly_rate() -> u32 { 5 }
fn default_butterfly_rate() -> u32 { 4 }
fn default_amoeba_interval() -> u32 { 10 }

fn default_levels_dir() -> String { "levels".into() }
fn default_save_dir() -> String { "saves".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            timer_cadence: default_timer_cadence(),
            input_rate: default_input_rate(),
            death_grace_ticks: default_death_grace(),
        }
    }
}

impl Default for TomlActors {
    fn default() -> Self {
        TomlActors {
            player: default_player_rate(),
            boulder: default_falling_rate(),
            diamond: default_falling_rate(),
            amoeba: default_amoeba_rate(),
            frog: default_frog_rate(),
            firefly: default_firefly_rate(),
            butterfly: default_butterfly_rate(),
            amoeba_base_interval: default_amoeba_interval(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            save_dir: default_save_dir(),
            seed: None,
        }
    }
}

fn speed_from(s: &TomlSpeed, a: &TomlActors) -> SpeedConfig {
    SpeedConfig {
        tick_rate_ms: s.tick_rate_ms,
        timer_cadence: s.timer_cadence.max(1),
        input_rate: s.input_rate.max(1),
        death_grace_ticks: s.death_grace_ticks,
        actors: ActorRates {
            player: a.player,
            boulder: a.boulder,
            diamond: a.diamond,
            amoeba: a.amoeba,
            frog: a.frog,
            firefly: a.firefly,
            butterfly: a.butterfly,
            amoeba_base_interval: a.amoeba_base_interval,
        },
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no directory search).
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if Path::new(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            speed: speed_from(&toml_cfg.speed, &toml_cfg.actors),
            levels_dir,
            save_dir: PathBuf::from(&toml_cfg.general.save_dir),
            seed: toml_cfg.general.seed,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/cavern");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
