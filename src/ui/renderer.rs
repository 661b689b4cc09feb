/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for cells that changed
///   4. Batch everything with `queue!`, flush once at the end
///   5. Swap front/back
///
/// Each grid cell is two terminal columns wide. The view scrolls to keep
/// the player centred when the cave is larger than the terminal.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use cavern::sim::runtime::Level;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Every cell gets this explicit background so row gaps match on
    /// terminals that paint them with the last cleared colour.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 14 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from every real cell, so the next flush repaints everything.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, Cell::BASE_BG));
        }
    }
}

// ── Glyphs ──

/// Two-column glyph and colours for a tile or actor image key.
fn glyph(key: &str) -> ([char; 2], Color, Color) {
    let bg = Cell::BASE_BG;
    match key {
        "wall" => (['▓', '▓'], Color::Rgb { r: 150, g: 110, b: 80 }, bg),
        "dirt" => (['░', '░'], Color::Rgb { r: 120, g: 80, b: 40 }, bg),
        "path" => ([' ', ' '], Color::White, bg),
        "magic_wall" => (['▒', '▒'], Color::Magenta, bg),
        "titanium_wall" => (['█', '█'], Color::Grey, bg),
        "exit" => (['[', ']'], Color::Green, bg),
        "key_red" => (['k', '-'], Color::Red, bg),
        "key_green" => (['k', '-'], Color::Green, bg),
        "key_blue" => (['k', '-'], Color::Blue, bg),
        "key_yellow" => (['k', '-'], Color::Yellow, bg),
        "door_red" => (['#', '#'], Color::Red, bg),
        "door_green" => (['#', '#'], Color::Green, bg),
        "door_blue" => (['#', '#'], Color::Blue, bg),
        "door_yellow" => (['#', '#'], Color::Yellow, bg),
        "player" => (['@', ' '], Color::White, bg),
        "boulder" => (['(', ')'], Color::Rgb { r: 190, g: 170, b: 140 }, bg),
        "diamond" => (['<', '>'], Color::Cyan, bg),
        "amoeba" => (['%', '%'], Color::Green, bg),
        "frog" => (['f', 'f'], Color::DarkGreen, bg),
        "firefly" => (['*', '*'], Color::DarkYellow, bg),
        "butterfly" => (['}', '{'], Color::Blue, bg),
        "explosion" => (['*', '*'], Color::Yellow, Color::DarkRed),
        _ => (['?', '?'], Color::Magenta, bg),
    }
}

// ── Renderer ──

const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size()?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Track terminal resizes; a resize forces a full repaint.
    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    pub fn render(&mut self, level: &Level, message: Option<&str>) -> io::Result<()> {
        self.sync_size()?;
        self.front.clear();
        self.compose_level(level);
        self.front.put_str(0, HUD_ROW, &level.status_line(), Color::White);
        let help_row = self.term_h.saturating_sub(1);
        let help = message.unwrap_or("arrows/WASD move  Esc save+quit  q quit");
        self.front.put_str(0, help_row, help, Color::DarkGrey);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Compose ──

    fn compose_level(&mut self, level: &Level) {
        let view_w = (self.term_w / CELL_W).min(level.width());
        let view_h = self.term_h.saturating_sub(MAP_ROW + 1).min(level.height());
        let (px, py) = level.player_pos().unwrap_or((0, 0));
        let cam_x = scroll(px, view_w, level.width());
        let cam_y = scroll(py, view_h, level.height());

        let draw = |buf: &mut FrameBuffer, gx: usize, gy: usize, key: &str| {
            if gx < cam_x || gy < cam_y || gx >= cam_x + view_w || gy >= cam_y + view_h {
                return;
            }
            let (chars, fg, bg) = glyph(key);
            let col = (gx - cam_x) * CELL_W;
            let row = MAP_ROW + gy - cam_y;
            for (i, ch) in chars.into_iter().enumerate() {
                buf.set(col + i, row, Cell::new(ch, fg, bg));
            }
        };

        for gy in 0..level.height() {
            for gx in 0..level.width() {
                if let Some(key) = level.tile_image_key(gx, gy) {
                    draw(&mut self.front, gx, gy, key);
                }
            }
        }
        for actor in level.actor_views() {
            draw(&mut self.front, actor.x, actor.y, actor.image_key);
        }
        for &(gx, gy) in level.explosion_cells() {
            draw(&mut self.front, gx, gy, "explosion");
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x = 0;
        let mut last_y = 0;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }
        self.writer.flush()
    }
}

/// First visible grid index on one axis, keeping `focus` centred but never
/// scrolling past either edge.
fn scroll(focus: usize, view: usize, size: usize) -> usize {
    if size <= view {
        return 0;
    }
    focus.saturating_sub(view / 2).min(size - view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_clamps_to_edges() {
        assert_eq!(scroll(0, 10, 40), 0);
        assert_eq!(scroll(20, 10, 40), 15);
        assert_eq!(scroll(39, 10, 40), 30);
        assert_eq!(scroll(5, 10, 8), 0);
    }

    #[test]
    fn every_image_key_has_a_glyph() {
        use cavern::domain::tile::{Colour, TileKind};
        let tiles = [
            TileKind::Wall,
            TileKind::Dirt,
            TileKind::Path,
            TileKind::MagicWall,
            TileKind::TitaniumWall,
            TileKind::Exit { threshold: 0 },
            TileKind::Key { id: 1, colour: Colour::Blue },
            TileKind::Door { id: 1, colour: Colour::Yellow },
        ];
        for t in tiles {
            assert_ne!(glyph(t.image_key()).0, ['?', '?'], "{t:?}");
        }
        for key in ["player", "boulder", "diamond", "amoeba", "frog", "firefly", "butterfly"] {
            assert_ne!(glyph(key).0, ['?', '?'], "{key}");
        }
    }
}
