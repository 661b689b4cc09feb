/// Entry point and game loop.
///
/// `cavern [LEVEL_FILE | --resume]`
///
/// Without an argument the first level in the configured levels directory
/// is played, or a freshly generated cave when there is none.

mod ui;

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::event::KeyCode;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use cavern::config::GameConfig;
use cavern::error::SaveError;
use cavern::sim::cave::generate_cave;
use cavern::sim::event::GameEvent;
use cavern::sim::level::{list_levels, read_level, LevelDef};
use cavern::sim::runtime::{ExitReason, Level};
use cavern::sim::save;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const SAVE_SLOT: u8 = 1;
const CAVE_SIZE: (usize, usize) = (40, 22);
/// Ticks a notice stays on the help line.
const NOTICE_TICKS: u32 = 20;

enum Outcome {
    Finished(ExitReason),
    Saved,
    Quit,
}

fn main() {
    env_logger::init();
    let config = GameConfig::load();
    let seed = config.seed.unwrap_or_else(clock_seed);
    log::info!("seed {seed}");

    let arg = std::env::args().nth(1);
    let (index, def) = match pick_level(&config, arg.as_deref(), seed) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Level load failed: {e}");
            std::process::exit(1);
        }
    };
    let mut level = match Level::new(&def, config.speed.clone(), seed) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Level setup failed: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut level, &mut renderer, &config, index);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(Outcome::Finished(reason)) => println!("{}", describe(reason)),
        Ok(Outcome::Saved) => println!("Saved to slot {SAVE_SLOT}."),
        Ok(Outcome::Quit) => {}
        Err(e) => eprintln!("Game error: {e}"),
    }
    println!("Final score: {}", level.score());
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Level file from the command line, the saved slot, the first file in
/// the levels directory, or a generated cave, in that order.
fn pick_level(
    config: &GameConfig,
    arg: Option<&str>,
    seed: u64,
) -> Result<(usize, LevelDef), SaveError> {
    match arg {
        Some("--resume") => save::load_slot(&config.save_dir, SAVE_SLOT),
        Some(path) => Ok((0, read_level(Path::new(path))?)),
        None => match list_levels(&config.levels_dir).first() {
            Some(path) => Ok((0, read_level(path)?)),
            None => {
                let mut rng = Pcg32::seed_from_u64(seed);
                Ok((0, generate_cave(CAVE_SIZE.0, CAVE_SIZE.1, &mut rng)))
            }
        },
    }
}

fn game_loop(
    level: &mut Level,
    renderer: &mut Renderer,
    config: &GameConfig,
    index: usize,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let mut notice: Option<(&'static str, u32)> = None;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.was_pressed(KeyCode::Char('q')) || kb.was_pressed(KeyCode::Char('Q')) {
            return Ok(Outcome::Quit);
        }
        if kb.was_pressed(KeyCode::Esc) && level.player_alive() {
            save::save_slot(&config.save_dir, SAVE_SLOT, index, level)?;
            return Ok(Outcome::Saved);
        }
        if let Some(dir) = kb.direction() {
            level.push_input(dir);
        }

        if last_tick.elapsed() >= tick_rate {
            let events = level.advance_one_tick()?;
            if let Some(text) = events.iter().rev().find_map(notice_for) {
                notice = Some((text, NOTICE_TICKS));
            }
            notice = notice.and_then(|(text, left)| (left > 0).then(|| (text, left - 1)));
            last_tick = Instant::now();

            if let Some(reason) = level.exit_reason() {
                renderer.render(level, Some(describe(reason)))?;
                return Ok(Outcome::Finished(reason));
            }
        }

        renderer.render(level, notice.map(|(text, _)| text))?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

fn notice_for(event: &GameEvent) -> Option<&'static str> {
    match event {
        GameEvent::KeyCollected { .. } => Some("Picked up a key."),
        GameEvent::DoorOpened { .. } => Some("A door swings open."),
        GameEvent::AmoebaHardened { .. } => Some("The amoeba hardened into boulders!"),
        GameEvent::AmoebaCrystallised { .. } => Some("The amoeba crystallised into diamonds!"),
        GameEvent::PlayerKilled => Some("You were killed."),
        GameEvent::ExitReached => Some("Exit reached!"),
        _ => None,
    }
}

fn describe(reason: ExitReason) -> &'static str {
    match reason {
        ExitReason::PlayerDead => "You died.",
        ExitReason::TimeOut => "Out of time.",
        ExitReason::LevelComplete => "Level complete!",
    }
}
