/// Level definitions and loading.
///
/// Levels come from two sources:
///   1. `.csv` files in the maps directory (comma-separated tile ids,
///      one row per line, row 0 at the top)
///   2. the embedded fallback set compiled into the binary, used whenever
///      the maps directory is missing or empty
///
/// Loading a level rebuilds the whole session: world geometry, entities,
/// hazards, and a fresh player at the spawn point.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entity::{Boss, Enemy, Player, PLAYER_H, PLAYER_W};
use crate::domain::geom::Vec2;
use crate::domain::hazard::{FallingPlatform, Saw};
use crate::sim::world::{Mode, TileWorld, WorldState};

/// Default player spawn in world pixels, used when a level places the
/// player nowhere else.
const PLAYER_SPAWN: Vec2 = Vec2 { x: 64, y: 120 };

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("level has no rows")]
    EmptyGrid,
    #[error("bad tile id {token:?} at row {row}, column {col}")]
    BadTileId {
        row: usize,
        col: usize,
        token: String,
    },
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub grid: Vec<Vec<u32>>,
}

// ── CSV Parsing ──

/// Parse comma-separated tile ids. Blank lines are skipped; short rows
/// are accepted (the world pads them with empty tiles). Any token that is
/// not a non-negative integer is an error.
pub fn parse_grid(text: &str) -> Result<Vec<Vec<u32>>, LevelError> {
    let mut grid = Vec::new();
    for (row_idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for (col_idx, token) in line.split(',').enumerate() {
            let token = token.trim();
            if token.is_empty() {
                continue; // trailing comma
            }
            let id = token.parse::<u32>().map_err(|_| LevelError::BadTileId {
                row: row_idx,
                col: col_idx,
                token: token.to_string(),
            })?;
            row.push(id);
        }
        grid.push(row);
    }
    if grid.is_empty() {
        return Err(LevelError::EmptyGrid);
    }
    Ok(grid)
}

/// Scan `dir` for `.csv` level files, sorted by file name.
pub fn load_from_directory(dir: &Path) -> Result<Vec<LevelDef>, LevelError> {
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|x| x == "csv").unwrap_or(false))
            .collect(),
        Err(_) => return Ok(vec![]),
    };
    paths.sort();

    let mut defs = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path).map_err(|source| LevelError::Io {
            path: path.clone(),
            source,
        })?;
        let grid = parse_grid(&text)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".into());
        defs.push(LevelDef { name, grid });
    }
    Ok(defs)
}

/// The level set for a session: map files when present, embedded otherwise.
pub fn load_levels(maps_dir: &Path) -> Result<Vec<LevelDef>, LevelError> {
    let from_disk = load_from_directory(maps_dir)?;
    if from_disk.is_empty() {
        Ok(embedded_levels())
    } else {
        Ok(from_disk)
    }
}

// ── Embedded Levels ──

/// Character legend for the embedded maps. One char per tile.
fn id_of(ch: char) -> u32 {
    match ch {
        '#' => 1,  // solid
        '^' => 5,  // trap
        'C' => 6,  // checkpoint
        '?' => 7,  // sign
        'E' => 8,  // enemy
        'X' => 9,  // exit
        'H' => 10, // ladder
        'F' => 11, // falling platform
        'S' => 12, // saw
        'B' => 13, // boss
        _ => 0,
    }
}

fn rows_to_ids(rows: &[&str]) -> Vec<Vec<u32>> {
    rows.iter()
        .map(|row| row.chars().map(id_of).collect())
        .collect()
}

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        LevelDef {
            name: "Training Grounds".into(),
            grid: rows_to_ids(&[
                "........................................",
                "........................................",
                "........................................",
                "..........#####.........................",
                "......H.................................",
                "......H.......F.F.......S...............",
                "......H.................................",
                "..?...H...........C...........E......X..",
                "###################..^^..###############",
                "########################################",
            ]),
        },
        LevelDef {
            name: "Saw Gallery".into(),
            grid: rows_to_ids(&[
                "................................................",
                "....................S...........S..............",
                "................................................",
                "..........####......F..F..F......####..........",
                "......H.........................................",
                "......H....C..........................C.....E...",
                "......H..#####..................#####..########.",
                "......H.........................................",
                "..........E...........S..............E........X",
                "#######......###....######....###......#########",
                "#######..^^..###....######....###..^^..#########",
                "################################################",
            ]),
        },
        LevelDef {
            name: "Clockwork Throne".into(),
            grid: rows_to_ids(&[
                "############################",
                "#..........................#",
                "#..........................#",
                "#...C...............S......#",
                "#..........................#",
                "#.....F...F...F............#",
                "#..........................#",
                "#.......................B..#",
                "#..^^..............^^......#",
                "############################",
            ]),
        },
    ]
}

// ── Session Loading ──

/// Rebuild the session for level `index` of `defs`. The player respawns
/// fresh (full health, empty history); hazards and enemies are placed
/// from the spawn markers.
pub fn load_level(state: &mut WorldState, defs: &[LevelDef], index: usize) {
    let def = &defs[index];
    let world = TileWorld::from_grid(&def.grid);

    // Clamp the fixed spawn point into the level bounds
    let spawn = Vec2::new(
        PLAYER_SPAWN.x.clamp(0, (world.pixel_width() - PLAYER_W).max(0)),
        PLAYER_SPAWN.y.clamp(0, (world.pixel_height() - PLAYER_H).max(0)),
    );

    state.player = Player::new(spawn, state.tuning.max_hp, state.tuning.history_cap);
    state.enemies = world.enemy_spawns.iter().map(|&p| Enemy::new(p)).collect();
    state.boss = world
        .boss_spawns
        .first()
        .map(|&p| Boss::new(p, state.tuning.boss_hp, state.tuning.boss_teleport_s));
    state.saws = world.saw_anchors.iter().map(|&p| Saw::new(p)).collect();
    state.platforms = world
        .platform_spawns
        .iter()
        .map(|&p| FallingPlatform::new(p))
        .collect();

    state.world = world;
    state.level_index = index;
    state.total_levels = defs.len();
    state.level_name = def.name.clone();
    state.message.clear();
    state.message_timer = 0.0;
    state.mode = Mode::Playing;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;

    #[test]
    fn parses_csv_with_blank_lines_and_short_rows() {
        let grid = parse_grid("1,2,3\n\n0,5\n").unwrap();
        assert_eq!(grid, vec![vec![1, 2, 3], vec![0, 5]]);
    }

    #[test]
    fn rejects_non_integer_token() {
        let err = parse_grid("1,2\n0,x,3").unwrap_err();
        match err {
            LevelError::BadTileId { row, col, token } => {
                assert_eq!((row, col), (1, 1));
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse_grid("\n\n"), Err(LevelError::EmptyGrid)));
    }

    #[test]
    fn legend_maps_every_marker() {
        let grid = rows_to_ids(&["#^C?EXHFSB."]);
        assert_eq!(grid[0], vec![1, 5, 6, 7, 8, 9, 10, 11, 12, 13, 0]);
    }

    #[test]
    fn embedded_levels_are_well_formed() {
        let defs = embedded_levels();
        assert_eq!(defs.len(), 3);
        for def in &defs {
            let w = TileWorld::from_grid(&def.grid);
            assert!(!w.solids.is_empty(), "{}: no ground", def.name);
            assert!(
                !w.exits.is_empty() || !w.boss_spawns.is_empty(),
                "{}: no way to finish",
                def.name
            );
        }
        // The finale has the boss
        let last = TileWorld::from_grid(&defs[2].grid);
        assert_eq!(last.boss_spawns.len(), 1);
    }

    #[test]
    fn load_level_populates_the_session() {
        let mut state = WorldState::new(Tuning::default(), 320, 240);
        let defs = embedded_levels();
        load_level(&mut state, &defs, 0);
        assert_eq!(state.mode, Mode::Playing);
        assert_eq!(state.level_name, "Training Grounds");
        assert_eq!(state.total_levels, 3);
        assert!(!state.enemies.is_empty());
        assert!(!state.saws.is_empty());
        assert!(!state.platforms.is_empty());
        assert!(state.boss.is_none());
        assert_eq!(state.player.hp, state.tuning.max_hp);
        assert_eq!(state.player.body.rect.top_left(), Vec2::new(64, 120));
    }

    #[test]
    fn boss_level_spawns_the_boss() {
        let mut state = WorldState::new(Tuning::default(), 320, 240);
        let defs = embedded_levels();
        load_level(&mut state, &defs, 2);
        let boss = state.boss.as_ref().expect("boss missing");
        assert_eq!(boss.hp, state.tuning.boss_hp);
    }

    #[test]
    fn spawn_is_clamped_into_tiny_levels() {
        let mut state = WorldState::new(Tuning::default(), 320, 240);
        let defs = vec![LevelDef {
            name: "tiny".into(),
            grid: vec![vec![0], vec![1]],
        }];
        load_level(&mut state, &defs, 0);
        let r = &state.player.body.rect;
        assert!(r.x >= 0 && r.y >= 0);
        assert!(r.x <= state.world.pixel_width());
    }
}
