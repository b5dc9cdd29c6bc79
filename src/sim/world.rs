/// World geometry and per-session state.
///
/// `TileWorld` is built once per level load: the integer grid is
/// categorized and flattened into rect lists, so the hot path never walks
/// the grid. Solids are full tiles; interaction zones (traps, checkpoints,
/// ladders) carry per-category insets so their hitboxes are forgiving.

use crate::config::Tuning;
use crate::domain::entity::{Boss, Enemy, Player};
use crate::domain::geom::{Rect, Vec2};
use crate::domain::hazard::{FallingPlatform, Saw};
use crate::domain::tile::{Tile, TILE};

// ── Tile World ──

/// Hitbox insets per interaction category, px from the tile edges.
const TRAP_INSET: (i32, i32, i32, i32) = (6, 8, -12, -10);
const CHECKPOINT_INSET: (i32, i32, i32, i32) = (6, 6, -12, -12);
const LADDER_INSET: (i32, i32, i32, i32) = (10, 0, -20, 0);

fn inset_rect(col: i32, row: i32, inset: (i32, i32, i32, i32)) -> Rect {
    Rect::new(
        col * TILE + inset.0,
        row * TILE + inset.1,
        TILE + inset.2,
        TILE + inset.3,
    )
}

/// Static level geometry, categorized. Row 0 is the top of the world.
#[derive(Clone, Debug, Default)]
pub struct TileWorld {
    pub tiles: Vec<Vec<Tile>>,
    pub cols: usize,
    pub rows: usize,
    pub solids: Vec<Rect>,
    pub traps: Vec<Rect>,
    pub checkpoints: Vec<Rect>,
    pub exits: Vec<Rect>,
    pub ladders: Vec<Rect>,
    /// Spawn tile origins (top-left), consumed at level load.
    pub enemy_spawns: Vec<Vec2>,
    pub platform_spawns: Vec<Vec2>,
    /// Saw anchors are tile CENTERS.
    pub saw_anchors: Vec<Vec2>,
    pub boss_spawns: Vec<Vec2>,
}

impl TileWorld {
    /// Categorize a row-major id grid. Short rows are treated as padded
    /// with empty tiles on the right.
    pub fn from_grid(grid: &[Vec<u32>]) -> Self {
        let rows = grid.len();
        let cols = grid.iter().map(|r| r.len()).max().unwrap_or(0);

        let mut w = TileWorld {
            cols,
            rows,
            ..TileWorld::default()
        };

        for (row, ids) in grid.iter().enumerate() {
            let mut tile_row = Vec::with_capacity(cols);
            for col in 0..cols {
                let tile = Tile::from_id(ids.get(col).copied().unwrap_or(0));
                let (c, r) = (col as i32, row as i32);
                let origin = Vec2::new(c * TILE, r * TILE);
                match tile {
                    Tile::Solid => w.solids.push(Rect::new(origin.x, origin.y, TILE, TILE)),
                    Tile::Trap => w.traps.push(inset_rect(c, r, TRAP_INSET)),
                    Tile::Checkpoint => w.checkpoints.push(inset_rect(c, r, CHECKPOINT_INSET)),
                    Tile::Exit => w.exits.push(Rect::new(origin.x, origin.y, TILE, TILE)),
                    Tile::Ladder => w.ladders.push(inset_rect(c, r, LADDER_INSET)),
                    Tile::EnemySpawn => w.enemy_spawns.push(origin),
                    Tile::PlatformSpawn => w.platform_spawns.push(origin),
                    Tile::SawSpawn => w
                        .saw_anchors
                        .push(Vec2::new(origin.x + TILE / 2, origin.y + TILE / 2)),
                    Tile::BossSpawn => w.boss_spawns.push(origin),
                    Tile::Empty | Tile::Sign => {}
                }
                tile_row.push(tile);
            }
            w.tiles.push(tile_row);
        }
        w
    }

    pub fn pixel_width(&self) -> i32 {
        self.cols as i32 * TILE
    }

    pub fn pixel_height(&self) -> i32 {
        self.rows as i32 * TILE
    }
}

// ── Camera ──

/// Pixel-space viewport that follows a focus point, clamped to the world
/// so the view never shows past the edges. No smoothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: i32,
    pub view_h: i32,
}

impl Camera {
    pub fn new(view_w: i32, view_h: i32) -> Self {
        Camera {
            x: 0,
            y: 0,
            view_w,
            view_h,
        }
    }

    pub fn follow(&mut self, focus_x: i32, focus_y: i32, world_w: i32, world_h: i32) {
        self.x = clamp_axis(focus_x - self.view_w / 2, world_w, self.view_w);
        self.y = clamp_axis(focus_y - self.view_h / 2, world_h, self.view_h);
    }
}

fn clamp_axis(want: i32, world: i32, view: i32) -> i32 {
    if world <= view {
        // World smaller than the view: pin to the start
        0
    } else {
        want.clamp(0, world - view)
    }
}

// ── Session State ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Menu,
    LevelSelect,
    Playing,
    /// Post-victory screen after the final boss falls.
    Cinematic,
}

/// Everything the simulation steps and the renderer draws.
pub struct WorldState {
    pub mode: Mode,
    pub world: TileWorld,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub saws: Vec<Saw>,
    pub platforms: Vec<FallingPlatform>,
    pub tuning: Tuning,
    pub camera: Camera,
    pub level_index: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub level_names: Vec<String>,
    /// Milliseconds of simulated time; drives the invincibility window.
    pub clock_ms: u64,
    pub select_cursor: usize,
    pub message: String,
    pub message_timer: f32,
}

impl WorldState {
    pub fn new(tuning: Tuning, view_w: i32, view_h: i32) -> Self {
        WorldState {
            mode: Mode::Menu,
            world: TileWorld::default(),
            player: Player::new(Vec2::new(0, 0), tuning.max_hp, tuning.history_cap),
            enemies: vec![],
            boss: None,
            saws: vec![],
            platforms: vec![],
            tuning,
            camera: Camera::new(view_w, view_h),
            level_index: 0,
            total_levels: 0,
            level_name: String::new(),
            level_names: vec![],
            clock_ms: 0,
            select_cursor: 0,
            message: String::new(),
            message_timer: 0.0,
        }
    }

    /// The solid set for this frame: static geometry plus every crumbling
    /// platform that still exists (falling ones keep colliding until culled).
    pub fn solids_with_platforms(&self) -> Vec<Rect> {
        let mut solids =
            Vec::with_capacity(self.world.solids.len() + self.platforms.len());
        solids.extend_from_slice(&self.world.solids);
        solids.extend(self.platforms.iter().map(|p| p.rect));
        solids
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = text.into();
        self.message_timer = 2.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> Vec<Vec<u32>> {
        vec![
            vec![0, 0, 0, 0, 0],
            vec![0, 6, 0, 10, 9],
            vec![0, 5, 8, 12, 11],
            vec![1, 2, 3, 4, 1],
        ]
    }

    #[test]
    fn grid_flattens_into_categorized_rects() {
        let w = TileWorld::from_grid(&sample_grid());
        assert_eq!(w.cols, 5);
        assert_eq!(w.rows, 4);
        assert_eq!(w.solids.len(), 5);
        assert_eq!(w.traps.len(), 1);
        assert_eq!(w.checkpoints.len(), 1);
        assert_eq!(w.exits.len(), 1);
        assert_eq!(w.ladders.len(), 1);
        assert_eq!(w.enemy_spawns.len(), 1);
        assert_eq!(w.saw_anchors.len(), 1);
        assert_eq!(w.platform_spawns.len(), 1);
        assert_eq!(w.pixel_width(), 5 * TILE);
        assert_eq!(w.pixel_height(), 4 * TILE);
    }

    #[test]
    fn interaction_zones_carry_their_insets() {
        let w = TileWorld::from_grid(&sample_grid());
        // Trap at col 1, row 2
        assert_eq!(w.traps[0], Rect::new(32 + 6, 64 + 8, 32 - 12, 32 - 10));
        // Checkpoint at col 1, row 1
        assert_eq!(w.checkpoints[0], Rect::new(32 + 6, 32 + 6, 32 - 12, 32 - 12));
        // Ladder at col 3, row 1: narrow full-height strip
        assert_eq!(w.ladders[0], Rect::new(96 + 10, 32, 32 - 20, 32));
    }

    #[test]
    fn saw_anchor_is_the_tile_center() {
        let w = TileWorld::from_grid(&sample_grid());
        assert_eq!(w.saw_anchors[0], Vec2::new(3 * 32 + 16, 2 * 32 + 16));
    }

    #[test]
    fn short_rows_read_as_empty_padding() {
        let grid = vec![vec![1, 1, 1, 1], vec![1]];
        let w = TileWorld::from_grid(&grid);
        assert_eq!(w.cols, 4);
        assert_eq!(w.solids.len(), 5);
        assert_eq!(w.tiles[1][3], Tile::Empty);
    }

    #[test]
    fn camera_clamps_to_world_bounds() {
        let mut cam = Camera::new(320, 240);
        // Focus near the left edge: clamp at 0
        cam.follow(20, 20, 1000, 800);
        assert_eq!((cam.x, cam.y), (0, 0));
        // Focus near the right/bottom edge: clamp at world - view
        cam.follow(990, 790, 1000, 800);
        assert_eq!((cam.x, cam.y), (1000 - 320, 800 - 240));
        // Mid-world: centered on the focus
        cam.follow(500, 400, 1000, 800);
        assert_eq!((cam.x, cam.y), (500 - 160, 400 - 120));
    }

    #[test]
    fn small_world_pins_camera_to_origin() {
        let mut cam = Camera::new(320, 240);
        cam.follow(50, 50, 160, 96);
        assert_eq!((cam.x, cam.y), (0, 0));
    }

    #[test]
    fn solids_include_live_platforms() {
        let mut state = WorldState::new(Tuning::default(), 320, 240);
        state.world = TileWorld::from_grid(&sample_grid());
        state
            .platforms
            .push(FallingPlatform::new(Vec2::new(128, 64)));
        let solids = state.solids_with_platforms();
        assert_eq!(solids.len(), state.world.solids.len() + 1);
        assert!(solids.contains(&Rect::new(128, 64, 32, 32)));
    }
}
