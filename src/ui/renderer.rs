/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer (grid of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!`, flush once at the end
///   5. Swap front/back
///
/// World-to-terminal mapping: one 32px tile is 2 terminal columns by
/// 1 terminal row, so a column covers 16 world px and a row covers 32.
/// Entity pixel positions are quantized onto that grid through the camera.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::PlayerMode;
use crate::domain::geom::Rect;
use crate::domain::tile::{Tile, TILE};
use crate::sim::world::{Mode, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, so the
    /// inter-row gap pixels on VTE terminals match the cell color and no
    /// horizontal seams show.
    const BASE_BG: Color = Color::Rgb { r: 16, g: 18, b: 28 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer: differs from any real
    /// cell, so every position gets re-emitted.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Terminal columns per world tile.
const CELL_W: usize = 2;
/// World pixels per terminal column / row.
const PX_PER_COL: i32 = TILE / CELL_W as i32;
const PX_PER_ROW: i32 = TILE;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_mode: Option<Mode>,
    /// Render frame counter, drives menu blinking and saw spin.
    tick: u32,
    /// True once the keyboard enhancement push was accepted.
    key_release_reporting: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_mode: None,
            tick: 0,
            key_release_reporting: false,
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

        // Ask the terminal to report key releases where supported; input
        // tracking falls back to hold timeouts otherwise.
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_release_reporting = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release_reporting {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Whether the terminal confirmed key-release reporting at init.
    pub fn reports_key_releases(&self) -> bool {
        self.key_release_reporting
    }

    pub fn render(&mut self, state: &mut WorldState) -> io::Result<()> {
        self.tick = self.tick.wrapping_add(1);

        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        // Viewport in world pixels from the terminal size
        let reserved_rows = MAP_ROW + 4; // HUD + gap + msg + help
        let map_rows = self.term_h.saturating_sub(reserved_rows).max(1);
        state.camera.view_w =
            ((self.term_w / CELL_W) as i32 * PX_PER_COL).min(state.world.pixel_width().max(TILE));
        state.camera.view_h =
            (map_rows as i32 * PX_PER_ROW).min(state.world.pixel_height().max(TILE));

        // Mode change: clear for a clean transition
        if self.last_mode != Some(state.mode) {
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
            self.last_mode = Some(state.mode);
        }

        if state.mode == Mode::Playing {
            // Re-center with the fresh viewport dimensions
            let focus = state.player.body.rect;
            state.camera.follow(
                focus.center_x(),
                focus.center_y(),
                state.world.pixel_width(),
                state.world.pixel_height(),
            );
        }

        self.front.clear();
        match state.mode {
            Mode::Menu => self.compose_menu(state),
            Mode::LevelSelect => self.compose_level_select(state),
            Mode::Playing => self.compose_game(state),
            Mode::Cinematic => self.compose_cinematic(state),
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

        // Explicit base colors at frame start; ResetColor would fall back
        // to the terminal default and cause seam artifacts.
        queue!(
            self.writer,
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

                let mut buf = [0u8; 4];
                queue!(self.writer, Print(&*cell.ch.encode_utf8(&mut buf)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── World-to-screen helpers ──

    /// Top-left terminal cell of the world pixel (px, py), camera applied.
    /// None when off-screen.
    fn to_screen(&self, cam_x: i32, cam_y: i32, px: i32, py: i32) -> Option<(usize, usize)> {
        let col = (px - cam_x) / PX_PER_COL;
        let row = (py - cam_y) / PX_PER_ROW;
        if col < 0 || row < 0 {
            return None;
        }
        let col = col as usize;
        let row = MAP_ROW + row as usize;
        if col >= self.front.width || row >= self.front.height {
            return None;
        }
        Some((col, row))
    }

    /// Paint every cell covered by a world rect.
    fn fill_rect(&mut self, cam_x: i32, cam_y: i32, r: &Rect, ch: char, fg: Color, bg: Color) {
        let c0 = (r.x - cam_x).div_euclid(PX_PER_COL);
        let c1 = (r.right() - 1 - cam_x).div_euclid(PX_PER_COL);
        let r0 = (r.y - cam_y).div_euclid(PX_PER_ROW);
        let r1 = (r.bottom() - 1 - cam_y).div_euclid(PX_PER_ROW);
        for row in r0..=r1 {
            for col in c0..=c1 {
                if col < 0 || row < 0 {
                    continue;
                }
                let (col, row) = (col as usize, MAP_ROW + row as usize);
                if col < self.front.width && row < self.front.height {
                    self.front.set(col, row, Cell::new(ch, fg, bg));
                }
            }
        }
    }

    // ── Compose: playing ──

    fn compose_game(&mut self, w: &WorldState) {
        let buf_w = self.front.width;
        let cam_x = w.camera.x;
        let cam_y = w.camera.y;

        // ── HUD row ──
        let hearts: String = (0..w.player.max_hp)
            .map(|i| if i < w.player.hp { '♥' } else { '♡' })
            .collect();
        let gauge = rewind_gauge(w.player.history_len(), w.tuning.history_cap);
        let hud = format!(
            " {}  {}  REW[{}] ",
            w.level_name, hearts, gauge,
        );
        let hud_bg = Color::Rgb { r: 20, g: 24, b: 56 };
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, hud_bg));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, hud_bg);

        // Boss health on the right of the HUD
        if let Some(boss) = &w.boss {
            let bar: String = (0..boss.max_hp)
                .map(|i| if i < boss.hp { '█' } else { '░' })
                .collect();
            let label = if boss.enraged { "RAGE" } else { "BOSS" };
            let text = format!("{} {} ", label, bar);
            let fg = if boss.enraged {
                Color::Rgb { r: 255, g: 70, b: 70 }
            } else {
                Color::Rgb { r: 220, g: 120, b: 255 }
            };
            let x = buf_w.saturating_sub(text.chars().count() + 1);
            self.front.put_str(x, HUD_ROW, &text, fg, hud_bg);
        }

        // ── Tile layer (camera snapped to the tile grid) ──
        let map_rows = (w.camera.view_h / PX_PER_ROW) as usize;
        let map_cols = (w.camera.view_w / PX_PER_COL) as usize;
        let tx0 = cam_x.div_euclid(TILE);
        let ty0 = cam_y.div_euclid(TILE);
        for vy in 0..map_rows {
            let wy = ty0 + vy as i32;
            let row = MAP_ROW + vy;
            if row >= self.front.height {
                break;
            }
            for vt in 0..(map_cols / CELL_W + 1) {
                let wx = tx0 + vt as i32;
                let col = vt * CELL_W;
                if col + 1 >= buf_w {
                    break;
                }
                self.compose_tile(w, wx, wy, col, row);
            }
        }

        // ── Dynamic layer ──
        for p in &w.platforms {
            let fg = if p.is_falling() {
                Color::Rgb { r: 230, g: 150, b: 60 }
            } else {
                Color::Rgb { r: 170, g: 120, b: 60 }
            };
            self.fill_rect(cam_x, cam_y, &p.rect, '▓', fg, Color::Rgb { r: 60, g: 40, b: 20 });
        }

        let saw_ch = if (self.tick / 4) % 2 == 0 { '✕' } else { '✛' };
        for saw in &w.saws {
            self.fill_rect(
                cam_x,
                cam_y,
                &saw.rect,
                saw_ch,
                Color::Rgb { r: 255, g: 210, b: 60 },
                Color::Reset,
            );
        }

        for e in &w.enemies {
            self.fill_rect(
                cam_x,
                cam_y,
                &e.body.rect,
                '▞',
                Color::Rgb { r: 255, g: 90, b: 90 },
                Color::Reset,
            );
        }

        if let Some(boss) = &w.boss {
            let fg = if boss.enraged {
                Color::Rgb { r: 255, g: 60, b: 60 }
            } else {
                Color::Rgb { r: 220, g: 120, b: 255 }
            };
            self.fill_rect(cam_x, cam_y, &boss.body.rect, '█', fg, Color::Reset);
        }

        // ── Player ──
        // Invincibility flashes; rewind tints; death blinks fast.
        let flashing = w.player.invincible(w.clock_ms, w.tuning.invincibility_ms)
            && (self.tick / 2) % 2 == 0;
        if !flashing {
            let fg = match w.player.mode {
                PlayerMode::Rewinding => Color::Rgb { r: 200, g: 120, b: 255 },
                PlayerMode::Dead => Color::Rgb { r: 130, g: 130, b: 130 },
                _ => Color::Rgb { r: 90, g: 220, b: 255 },
            };
            let visible = !w.player.is_dead() || (self.tick / 3) % 2 == 0;
            if visible {
                self.fill_rect(cam_x, cam_y, &w.player.body.rect, '▒', fg, Color::Reset);
                // Eye dot marks the facing side
                let r = &w.player.body.rect;
                let eye_x = match w.player.facing {
                    crate::domain::entity::Facing::Right => r.right() - 4,
                    crate::domain::entity::Facing::Left => r.x + 3,
                };
                if let Some((col, row)) = self.to_screen(cam_x, cam_y, eye_x, r.y + 4) {
                    self.front.set(col, row, Cell::new('●', Color::White, Color::Reset));
                }
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + map_rows + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            let bg = Color::Rgb { r: 200, g: 180, b: 50 };
            for x in 0..buf_w {
                self.front.set(x, msg_row, Cell::new(' ', Color::Black, bg));
            }
            self.front.put_str(0, msg_row, &msg, Color::Black, bg);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + map_rows + 3;
        if help_row < self.front.height {
            let help = " ←→/AD:Move  SPACE:Jump  ↑↓/WS:Climb  R:Rewind  X:Attack  ESC:Menu";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Two terminal cells for the static tile at world (wx, wy).
    fn compose_tile(&mut self, w: &WorldState, wx: i32, wy: i32, col: usize, row: usize) {
        let tile = if wx < 0 || wy < 0 {
            Tile::Empty
        } else {
            w.world
                .tiles
                .get(wy as usize)
                .and_then(|r| r.get(wx as usize))
                .copied()
                .unwrap_or(Tile::Empty)
        };

        let (c0, c1, fg, bg) = match tile {
            Tile::Solid => (
                '█',
                '█',
                Color::Rgb { r: 110, g: 115, b: 130 },
                Color::Rgb { r: 60, g: 64, b: 76 },
            ),
            Tile::Trap => (
                '▲',
                '▲',
                Color::Rgb { r: 255, g: 80, b: 80 },
                Color::Reset,
            ),
            Tile::Checkpoint => (
                '▸',
                '◂',
                Color::Rgb { r: 90, g: 255, b: 120 },
                Color::Reset,
            ),
            Tile::Sign => ('¶', ' ', Color::Rgb { r: 200, g: 180, b: 120 }, Color::Reset),
            Tile::Exit => (
                '◈',
                '◈',
                Color::Rgb { r: 255, g: 220, b: 60 },
                Color::Rgb { r: 50, g: 45, b: 10 },
            ),
            Tile::Ladder => (
                '╠',
                '╣',
                Color::Rgb { r: 100, g: 200, b: 255 },
                Color::Reset,
            ),
            // Spawn markers and empty space render as void; their
            // entities are drawn by the dynamic layer
            _ => (' ', ' ', Color::Reset, Color::Reset),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    // ── Compose: static screens ──

    fn compose_menu(&mut self, w: &WorldState) {
        let title = [
            r"   ___  _  _  ___  ___   _  _  ___   ___  _   _  _  _  _  _  ___  ___ ",
            r"  / __|| || || _ \/ _ \ | \| |/ _ \ | _ \| | | || \| || \| || __|| _ \",
            r" | (__ | __ ||   / (_) || .` | (_) ||   /| |_| || .` || .` || _| |   /",
            r"  \___||_||_||_|_\\___/ |_|\_|\___/ |_|_\ \___/ |_|\_||_|\_||___||_|_\",
        ];
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, gold, Color::Reset);
        }

        let subtitle = "◈◈  Turn Back Time. Outrun The Blades.  ◈◈";
        let sx = 2 + title[1].chars().count().saturating_sub(subtitle.chars().count()) / 2;
        self.front
            .put_str(sx, 7, subtitle, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);

        let menu_base = 10;
        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front
            .put_str(8, menu_base, "ENTER   Start", hi, Color::Reset);
        self.front
            .put_str(8, menu_base + 1, "  L     Level Select", Color::White, Color::Reset);
        self.front
            .put_str(8, menu_base + 2, "  Q     Quit", Color::White, Color::Reset);

        let info = format!("      {} levels loaded", w.total_levels);
        self.front
            .put_str(8, menu_base + 4, &info, Color::DarkGrey, Color::Reset);

        let help = [
            "Controls",
            "  ←→ / AD       Run           SPACE  Jump",
            "  ↑↓ / WS       Climb ladders",
            "  R (hold)      Rewind time   X      Attack",
            "  ESC           Back to menu",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { gold } else { Color::White };
            self.front
                .put_str(8, menu_base + 6 + i, line, color, Color::Reset);
        }
    }

    fn compose_level_select(&mut self, w: &WorldState) {
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        let dim = Color::DarkGrey;
        let cursor_bg = Color::Rgb { r: 30, g: 60, b: 30 };

        self.front
            .put_str(2, 1, "╔══════════════════════════╗", gold, Color::Reset);
        self.front
            .put_str(2, 2, "║      LEVEL  SELECT       ║", gold, Color::Reset);
        self.front
            .put_str(2, 3, "╚══════════════════════════╝", gold, Color::Reset);

        let list_top = 5;
        for (idx, name) in w.level_names.iter().enumerate() {
            let row = list_top + idx;
            if row >= self.front.height {
                break;
            }
            let num = format!("{:>3}.", idx + 1);
            if idx == w.select_cursor {
                let blink = (self.tick / 8) % 2 == 0;
                let arrow = if blink { "▸" } else { " " };
                for x in 0..40.min(self.front.width) {
                    self.front.set(x, row, Cell::new(' ', Color::White, cursor_bg));
                }
                self.front.put_str(2, row, arrow, hi, cursor_bg);
                self.front.put_str(3, row, &num, hi, cursor_bg);
                self.front.put_str(8, row, name, hi, cursor_bg);
            } else {
                self.front.put_str(3, row, &num, dim, Color::Reset);
                self.front.put_str(8, row, name, Color::White, Color::Reset);
            }
        }

        let footer = list_top + w.level_names.len() + 2;
        if footer < self.front.height {
            self.front.put_str(
                2,
                footer,
                "  ENTER: Start   ↑↓: Select   ESC: Back",
                dim,
                Color::Reset,
            );
        }
    }

    fn compose_cinematic(&mut self, w: &WorldState) {
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        let box_art = [
            "╔══════════════════════════════════════╗",
            "║   ★ THE CLOCKWORK TYRANT FALLS ★     ║",
            "╚══════════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, gold, Color::Reset);
        }
        let line1 = "◈ Time flows forward once more.";
        let line2 = format!("◈ All {} stages cleared.", w.total_levels);
        self.front
            .put_str(6, 9, line1, Color::White, Color::Reset);
        self.front
            .put_str(6, 10, &line2, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.put_str(
            6,
            12,
            "▸ ENTER / ESC: Back to Menu",
            Color::Rgb { r: 80, g: 255, b: 80 },
            Color::Reset,
        );
    }
}

/// Ten-segment fill meter for the rewind history buffer.
fn rewind_gauge(len: usize, cap: usize) -> String {
    let cap = cap.max(1);
    let filled = (len * 10 + cap - 1) / cap;
    (0..10).map(|i| if i < filled { '=' } else { '·' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_scales_history_to_ten_segments() {
        assert_eq!(rewind_gauge(0, 90), "··········");
        assert_eq!(rewind_gauge(90, 90), "==========");
        assert_eq!(rewind_gauge(45, 90), "=====·····");
        // Any non-empty history shows at least one segment
        assert_eq!(rewind_gauge(1, 90).chars().filter(|c| *c == '=').count(), 1);
    }
}
