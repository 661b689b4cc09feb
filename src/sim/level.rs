/// Level definitions and the level text parser.
///
/// `LevelDef` is the boundary tuple between level files and the running
/// simulation: tiles, the player's spawn and inventory, every other actor,
/// and the per-level amoeba/timer/threshold settings.
///
/// ## Text format
///   ```text
///   Level
///   <amoeba growth rate>        float
///   <amoeba max colony size>    int
///   <timer>                     int, timer seconds
///   <diamond threshold>         int
///   Grid
///   <width> <height>
///   <row>                       `height` rows of `width` comma-separated tile codes
///   Player
///   <x> <y> <diamonds> { <key ids> }
///   Actor
///   <code> <x> <y>[ <L|R>], ...
///   ```
///
/// ## Tile codes
///   `W` Wall   `D` Dirt   `P` Path   `M` MagicWall   `T` TitaniumWall
///   `K <id> <colour>` Key   `Do <id> <colour>` Door   `E <threshold>` Exit
///   Colours: `R` `G` `B` `Y`
///
/// ## Actor codes
///   `B` Boulder   `Di` Diamond   `A` Amoeba   `F` Frog
///   `Bu <L|R>` Butterfly   `Fi <L|R>` Firefly
///
/// Blank lines are ignored. The `Actor` section may span several lines or
/// be omitted entirely.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::entity::{FlyerSkin, Hand};
use crate::domain::tile::{Colour, TileKind};
use crate::error::{ParseError, SaveError};

/// Amoeba settings shared by every colony in a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmoebaConfig {
    pub growth_rate: f32,
    pub max_colony: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerDef {
    pub x: usize,
    pub y: usize,
    pub diamonds: u32,
    pub keys: BTreeSet<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorSpawn {
    Boulder,
    Diamond,
    Amoeba,
    Frog,
    Flyer(FlyerSkin, Hand),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorDef {
    pub kind: ActorSpawn,
    pub x: usize,
    pub y: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub amoeba: AmoebaConfig,
    pub timer: u32,
    pub diamond_threshold: u32,
    pub width: usize,
    pub height: usize,
    /// Row-major, `width * height` entries.
    pub tiles: Vec<TileKind>,
    pub player: PlayerDef,
    pub actors: Vec<ActorDef>,
}

impl LevelDef {
    pub fn tile(&self, x: usize, y: usize) -> Option<TileKind> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(y * self.width + x).copied()
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Read and parse one level file.
pub fn read_level(path: &Path) -> Result<LevelDef, SaveError> {
    let text = std::fs::read_to_string(path)?;
    let def = parse_level(&text)?;
    log::info!("loaded level {} ({}x{})", path.display(), def.width, def.height);
    Ok(def)
}

/// `.txt` files in `dir`, sorted by name. Missing directory → empty list.
pub fn list_levels(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    files.sort();
    files
}

pub fn parse_level(text: &str) -> Result<LevelDef, ParseError> {
    let mut lines = Lines::new(text);

    lines.header("Level")?;
    let growth_rate: f32 = lines.value("amoeba growth rate")?;
    let max_colony: usize = lines.value("amoeba max colony size")?;
    let timer: u32 = lines.value("timer")?;
    let diamond_threshold: u32 = lines.value("diamond threshold")?;

    lines.header("Grid")?;
    let (n, dims) = lines.next("grid size")?;
    let mut it = dims.split_whitespace();
    let width: usize = number(it.next(), n, "grid width")?;
    let height: usize = number(it.next(), n, "grid height")?;
    if width == 0 || height == 0 {
        return Err(ParseError::new(n, "grid must be at least 1x1"));
    }

    let mut tiles = Vec::with_capacity(width * height);
    for row in 0..height {
        let (n, line) = lines.next(&format!("grid row {}", row + 1))?;
        let codes: Vec<&str> = line.split(',').map(str::trim).collect();
        if codes.len() != width {
            return Err(ParseError::new(
                n,
                format!("row has {} tiles, expected {width}", codes.len()),
            ));
        }
        for code in codes {
            tiles.push(parse_tile(code, n)?);
        }
    }

    lines.header("Player")?;
    let (n, line) = lines.next("player line")?;
    let player = parse_player(line, n)?;
    check_in_bounds(player.x, player.y, width, height, n)?;

    let mut occupied = HashSet::new();
    occupied.insert((player.x, player.y));

    let mut actors = vec![];
    if lines.peek_is("Actor") {
        lines.header("Actor")?;
        while let Some((n, line)) = lines.next_opt() {
            for entry in line.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let def = parse_actor(entry, n)?;
                check_in_bounds(def.x, def.y, width, height, n)?;
                if !occupied.insert((def.x, def.y)) {
                    return Err(ParseError::new(
                        n,
                        format!("two actors at ({}, {})", def.x, def.y),
                    ));
                }
                actors.push(def);
            }
        }
    } else if let Some((n, line)) = lines.next_opt() {
        return Err(ParseError::new(n, format!("expected `Actor`, found `{line}`")));
    }

    Ok(LevelDef {
        amoeba: AmoebaConfig { growth_rate, max_colony },
        timer,
        diamond_threshold,
        width,
        height,
        tiles,
        player,
        actors,
    })
}

// ══════════════════════════════════════════════════════════════
// Line reader
// ══════════════════════════════════════════════════════════════

/// Non-blank, trimmed lines with 1-based line numbers.
struct Lines<'a> {
    inner: std::iter::Peekable<Box<dyn Iterator<Item = (usize, &'a str)> + 'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let it: Box<dyn Iterator<Item = (usize, &'a str)> + 'a> = Box::new(
            text.lines()
                .enumerate()
                .map(|(i, l)| (i + 1, l.trim()))
                .filter(|(_, l)| !l.is_empty()),
        );
        Lines { inner: it.peekable(), last: 0 }
    }

    fn next_opt(&mut self) -> Option<(usize, &'a str)> {
        let item = self.inner.next()?;
        self.last = item.0;
        Some(item)
    }

    fn next(&mut self, what: &str) -> Result<(usize, &'a str), ParseError> {
        let last = self.last;
        self.next_opt()
            .ok_or_else(|| ParseError::new(last + 1, format!("expected {what}, found end of input")))
    }

    fn peek_is(&mut self, word: &str) -> bool {
        self.inner.peek().map_or(false, |(_, l)| *l == word)
    }

    fn header(&mut self, word: &str) -> Result<(), ParseError> {
        let (n, line) = self.next(&format!("`{word}`"))?;
        if line != word {
            return Err(ParseError::new(n, format!("expected `{word}`, found `{line}`")));
        }
        Ok(())
    }

    fn value<T: FromStr>(&mut self, what: &str) -> Result<T, ParseError> {
        let (n, line) = self.next(what)?;
        line.parse()
            .map_err(|_| ParseError::new(n, format!("bad {what}: `{line}`")))
    }
}

fn number<T: FromStr>(token: Option<&str>, line: usize, what: &str) -> Result<T, ParseError> {
    let token = token.ok_or_else(|| ParseError::new(line, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| ParseError::new(line, format!("bad {what}: `{token}`")))
}

fn check_in_bounds(x: usize, y: usize, w: usize, h: usize, line: usize) -> Result<(), ParseError> {
    if x >= w || y >= h {
        return Err(ParseError::new(
            line,
            format!("({x}, {y}) lies outside the {w}x{h} grid"),
        ));
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Codes
// ══════════════════════════════════════════════════════════════

fn colour(token: Option<&str>, line: usize) -> Result<Colour, ParseError> {
    let token = token.ok_or_else(|| ParseError::new(line, "missing colour"))?;
    Colour::from_code(token).ok_or_else(|| ParseError::new(line, format!("unknown colour `{token}`")))
}

fn parse_tile(code: &str, line: usize) -> Result<TileKind, ParseError> {
    let mut t = code.split_whitespace();
    let kind = match t.next() {
        Some("W") => TileKind::Wall,
        Some("D") => TileKind::Dirt,
        Some("P") => TileKind::Path,
        Some("M") => TileKind::MagicWall,
        Some("T") => TileKind::TitaniumWall,
        Some("K") => TileKind::Key {
            id: number(t.next(), line, "key id")?,
            colour: colour(t.next(), line)?,
        },
        Some("Do") => TileKind::Door {
            id: number(t.next(), line, "door id")?,
            colour: colour(t.next(), line)?,
        },
        Some("E") => TileKind::Exit { threshold: number(t.next(), line, "exit threshold")? },
        _ => return Err(ParseError::new(line, format!("unknown tile code `{code}`"))),
    };
    if t.next().is_some() {
        return Err(ParseError::new(line, format!("trailing data in tile `{code}`")));
    }
    Ok(kind)
}

fn parse_hand(token: Option<&str>, line: usize) -> Result<Hand, ParseError> {
    match token {
        Some("L") => Ok(Hand::Left),
        Some("R") => Ok(Hand::Right),
        Some(other) => Err(ParseError::new(line, format!("unknown hand `{other}`"))),
        None => Err(ParseError::new(line, "missing hand (L or R)")),
    }
}

fn parse_actor(entry: &str, line: usize) -> Result<ActorDef, ParseError> {
    let mut t = entry.split_whitespace();
    let code = t.next().unwrap_or_default();
    let x = number(t.next(), line, "actor x")?;
    let y = number(t.next(), line, "actor y")?;
    let kind = match code {
        "B" => ActorSpawn::Boulder,
        "Di" => ActorSpawn::Diamond,
        "A" => ActorSpawn::Amoeba,
        "F" => ActorSpawn::Frog,
        "Bu" => ActorSpawn::Flyer(FlyerSkin::Butterfly, parse_hand(t.next(), line)?),
        "Fi" => ActorSpawn::Flyer(FlyerSkin::Firefly, parse_hand(t.next(), line)?),
        _ => return Err(ParseError::new(line, format!("unknown actor code `{code}`"))),
    };
    if t.next().is_some() {
        return Err(ParseError::new(line, format!("trailing data in actor `{entry}`")));
    }
    Ok(ActorDef { kind, x, y })
}

fn parse_player(line_text: &str, line: usize) -> Result<PlayerDef, ParseError> {
    let spaced = line_text.replace('{', " { ").replace('}', " } ");
    let mut t = spaced.split_whitespace();
    let x = number(t.next(), line, "player x")?;
    let y = number(t.next(), line, "player y")?;
    let diamonds = number(t.next(), line, "diamond count")?;
    if t.next() != Some("{") {
        return Err(ParseError::new(line, "expected `{` before key list"));
    }
    let mut keys = BTreeSet::new();
    loop {
        match t.next() {
            Some("}") => break,
            Some(tok) => {
                keys.insert(number(Some(tok), line, "key id")?);
            }
            None => return Err(ParseError::new(line, "unterminated key list")),
        }
    }
    if let Some(extra) = t.next() {
        return Err(ParseError::new(line, format!("unexpected `{extra}` after key list")));
    }
    Ok(PlayerDef { x, y, diamonds, keys })
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Level
1.5
20
150
3
Grid
4 3
T,T,T,T
T,P,K 7 R,Do 7 R
T,D,E 3,M
Player
1 1 2 { 4 9 }
Actor
B 1 2, Bu 2 2 L
";

    #[test]
    fn parses_sample_level() {
        let def = parse_level(SAMPLE).unwrap();
        assert_eq!(def.amoeba, AmoebaConfig { growth_rate: 1.5, max_colony: 20 });
        assert_eq!(def.timer, 150);
        assert_eq!(def.diamond_threshold, 3);
        assert_eq!((def.width, def.height), (4, 3));
        assert_eq!(def.tile(2, 1), Some(TileKind::Key { id: 7, colour: Colour::Red }));
        assert_eq!(def.tile(3, 1), Some(TileKind::Door { id: 7, colour: Colour::Red }));
        assert_eq!(def.tile(2, 2), Some(TileKind::Exit { threshold: 3 }));
        assert_eq!(def.player.diamonds, 2);
        assert_eq!(def.player.keys, BTreeSet::from([4, 9]));
        assert_eq!(
            def.actors,
            vec![
                ActorDef { kind: ActorSpawn::Boulder, x: 1, y: 2 },
                ActorDef { kind: ActorSpawn::Flyer(FlyerSkin::Butterfly, Hand::Left), x: 2, y: 2 },
            ]
        );
    }

    #[test]
    fn actor_section_is_optional() {
        let text = "Level\n1\n5\n10\n0\nGrid\n1 1\nP\nPlayer\n0 0 0 { }\n";
        let def = parse_level(text).unwrap();
        assert!(def.actors.is_empty());
        assert!(def.player.keys.is_empty());
    }

    #[test]
    fn unknown_tile_reports_line() {
        let text = SAMPLE.replace("T,D,E 3,M", "T,D,Q,M");
        let err = parse_level(&text).unwrap_err();
        assert_eq!(err.line, 10);
        assert!(err.message.contains("`Q`"));
    }

    #[test]
    fn short_row_is_rejected() {
        let text = SAMPLE.replace("T,T,T,T", "T,T,T");
        assert_eq!(parse_level(&text).unwrap_err().line, 8);
    }

    #[test]
    fn missing_section_reports_end_of_input() {
        let err = parse_level("Level\n1\n5\n").unwrap_err();
        assert_eq!(err.line, 4);
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn out_of_bounds_actor_is_rejected() {
        let text = SAMPLE.replace("B 1 2", "B 9 2");
        assert!(parse_level(&text).unwrap_err().message.contains("outside"));
    }

    #[test]
    fn stacked_actors_are_rejected() {
        let text = SAMPLE.replace("B 1 2", "B 1 1");
        assert!(parse_level(&text).unwrap_err().message.contains("two actors"));
    }

    #[test]
    fn flyers_need_a_hand() {
        let text = SAMPLE.replace("Bu 2 2 L", "Fi 2 2");
        assert!(parse_level(&text).unwrap_err().message.contains("hand"));
    }

    #[test]
    fn bad_number_is_reported() {
        let text = SAMPLE.replace("150", "lots");
        let err = parse_level(&text).unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.to_string(), "line 4: bad timer: `lots`");
    }
}
