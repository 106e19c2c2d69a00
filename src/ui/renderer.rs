/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads: world state, playback's in-flight positions
/// and its message log.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use rolldrop::domain::actor::{Actor, Facing};
use rolldrop::domain::collision::{CollisionCategory, EXIT_NAME};
use rolldrop::domain::grid::{Coordinate, Direction};
use rolldrop::domain::mode::GameMode;
use rolldrop::sim::world::{WorldState, PLAYER_ID};

use super::playback::Playback;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Same RGB for Clear and every cell background, so row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
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

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Glyphs ──

/// Two terminal columns per game cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

type Glyph = (char, char, Color, Color);

fn actor_glyph(actor: &Actor) -> Glyph {
    match actor.category() {
        CollisionCategory::Player => match actor.facing {
            Facing::Left  => ('◄', '@', Color::White, Color::Reset),
            Facing::Right => ('@', '►', Color::White, Color::Reset),
        },
        CollisionCategory::PlayerProjectile => ('─', '•', Color::Rgb { r: 255, g: 240, b: 120 }, Color::Reset),
        CollisionCategory::EnemyProjectile  => ('•', '─', Color::Rgb { r: 255, g: 90, b: 90 }, Color::Reset),
        CollisionCategory::Structure => ('█', '█', Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 }),
        CollisionCategory::Object if actor.body.damage_taken > 0 => {
            ('▒', '▒', Color::Rgb { r: 180, g: 120, b: 60 }, Color::Rgb { r: 60, g: 40, b: 20 })
        }
        CollisionCategory::Object => ('[', ']', Color::Rgb { r: 200, g: 140, b: 70 }, Color::Rgb { r: 100, g: 65, b: 30 }),
        CollisionCategory::Item   => ('$', ' ', Color::Rgb { r: 255, g: 215, b: 0 }, Color::Reset),
        CollisionCategory::Npc if actor.name == EXIT_NAME => {
            ('▐', '▌', Color::Rgb { r: 80, g: 255, b: 120 }, Color::Rgb { r: 0, g: 60, b: 20 })
        }
        CollisionCategory::Npc   => ('☺', ' ', Color::Rgb { r: 100, g: 200, b: 255 }, Color::Reset),
        CollisionCategory::Enemy => ('▲', '▲', Color::Rgb { r: 255, g: 80, b: 80 }, Color::Reset),
    }
}

fn arrow(dir: Direction) -> char {
    match dir {
        Direction::Up => '↑',
        Direction::Down => '↓',
        Direction::Left => '←',
        Direction::Right => '→',
    }
}

fn mode_label(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Free => "FREE",
        GameMode::Queued => "QUEUE",
        GameMode::Dialogue => "TALK",
        GameMode::Cinematic => "----",
        GameMode::Paused => "PAUSE",
    }
}

/// First visible column/row so `focus` stays centred without showing void.
fn scroll_offset(focus: i32, view: usize, total: usize) -> i32 {
    if view >= total {
        return 0;
    }
    let max = (total - view) as i32;
    (focus - view as i32 / 2).clamp(0, max)
}

// ── Renderer ──

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

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, playback: &Playback, level_label: &str) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_hud(world, level_label);
        let view_h = self.compose_map(world, playback);
        self.compose_footer(world, playback, MAP_ROW + view_h + 1);

        match world.mode.current() {
            GameMode::Paused => self.compose_pause_overlay(view_h),
            GameMode::Dialogue => {
                if let Some(line) = playback.dialogue_line() {
                    self.compose_dialogue(line, view_h);
                }
            }
            _ => {}
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

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

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState, level_label: &str) {
        let hud = w.hud();
        let queue = if hud.queue_capacity > 0 {
            let arrows: String = w.queue.commands().iter().map(|d| arrow(*d)).collect();
            format!("Queue [{:<width$}] {}/{}", arrows, hud.queue_len, hud.queue_capacity,
                width = hud.queue_capacity)
        } else {
            String::new()
        };
        let line = format!(
            " {}  Die:{}  HP:{}  Score:{:<6} {:<5}  {}",
            level_label, hud.roll, hud.health, hud.score, mode_label(hud.mode), queue,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &line, Color::White, HUD_BG);
    }

    /// Draw the map through a player-centred viewport. Returns rows used.
    fn compose_map(&mut self, w: &WorldState, playback: &Playback) -> usize {
        let reserved = MAP_ROW + 6;
        let view_w = (self.term_w / CELL_W).min(w.grid.cols);
        let view_h = self.term_h.saturating_sub(reserved).max(1).min(w.grid.rows);

        let focus = playback.display_coord(w, PLAYER_ID).unwrap_or(w.player.coord);
        let cam_x = scroll_offset(focus.col, view_w, w.grid.cols);
        let cam_y = scroll_offset(focus.row, view_h, w.grid.rows);

        let put = |front: &mut FrameBuffer, at: Coordinate, glyph: Glyph| {
            let vx = at.col - cam_x;
            let vy = at.row - cam_y;
            if vx < 0 || vy < 0 || vx as usize >= view_w || vy as usize >= view_h {
                return;
            }
            let (c0, c1, fg, bg) = glyph;
            let col = vx as usize * CELL_W;
            let row = MAP_ROW + vy as usize;
            front.set(col, row, Cell::new(c0, fg, bg));
            front.set(col + 1, row, Cell::new(c1, fg, bg));
        };

        // Intangible actors first so blockers and the player draw over them.
        let mut actors: Vec<&Actor> = w.actors.values().collect();
        actors.sort_by_key(|a| a.is_blocking());
        for actor in actors {
            let at = playback.display_coord(w, actor.id).unwrap_or(actor.coord);
            put(&mut self.front, at, actor_glyph(actor));
        }
        put(&mut self.front, focus, actor_glyph(&w.player));

        view_h
    }

    fn compose_footer(&mut self, w: &WorldState, playback: &Playback, first_row: usize) {
        let msg_c = Color::Rgb { r: 230, g: 210, b: 90 };
        for (i, msg) in playback.messages.iter().enumerate() {
            self.front.put_str(1, first_row + i, msg, msg_c, Color::Reset);
        }

        let help_row = first_row + 4;
        let help = match w.mode.current() {
            GameMode::Queued => " Arrows/WASD: queue a move  Z: shoot  P: pause",
            GameMode::Dialogue => " Z/Enter: next line  P: pause",
            _ => " Arrows/WASD: step  X/Space: jump  Z/Enter: shoot  P: pause  R: restart  Q: quit",
        };
        self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_dialogue(&mut self, line: &str, view_h: usize) {
        let panel = Color::Rgb { r: 30, g: 50, b: 70 };
        let row = MAP_ROW + view_h.saturating_sub(2);
        self.front.fill_row(row, panel);
        self.front.fill_row(row + 1, panel);
        self.front.put_str(2, row, line, Color::White, panel);
        self.front.put_str(2, row + 1, "[Z] ▼", Color::Rgb { r: 100, g: 200, b: 255 }, panel);
    }

    fn compose_pause_overlay(&mut self, view_h: usize) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };

        let box_w = 28_usize.min(self.term_w);
        let box_h = 7_usize.min(view_h.max(1));
        let box_x = self.term_w.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + view_h.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::Reset, dim));
            }
        }
        self.front.put_str(box_x + 5, box_y + 1, "╔═══════════════╗", hdr, dim);
        self.front.put_str(box_x + 5, box_y + 2, "║    PAUSED     ║", hdr, dim);
        self.front.put_str(box_x + 5, box_y + 3, "╚═══════════════╝", hdr, dim);
        self.front.put_str(box_x + 2, box_y + 5, "P/Esc Resume   Q Quit", key_c, dim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolldrop::domain::actor::ActorId;

    #[test]
    fn scroll_keeps_focus_centred_within_bounds() {
        assert_eq!(scroll_offset(3, 10, 8), 0);
        assert_eq!(scroll_offset(2, 10, 40), 0);
        assert_eq!(scroll_offset(20, 10, 40), 15);
        assert_eq!(scroll_offset(39, 10, 40), 30);
    }

    #[test]
    fn exit_and_damaged_crate_have_their_own_glyphs() {
        let exit = Actor::new(ActorId(1), EXIT_NAME, CollisionCategory::Npc, Coordinate::new(0, 0));
        let sage = Actor::new(ActorId(2), "Sage", CollisionCategory::Npc, Coordinate::new(0, 1));
        assert_ne!(actor_glyph(&exit).0, actor_glyph(&sage).0);

        let mut crate_ = Actor::new(ActorId(3), "Crate", CollisionCategory::Object, Coordinate::new(0, 2));
        let fresh = actor_glyph(&crate_).0;
        crate_.body.apply_damage(1);
        assert_ne!(actor_glyph(&crate_).0, fresh);
    }
}
