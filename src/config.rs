/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Every tuning value the simulation consumes lives here, so the physics
/// feel can be adjusted without recompiling.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub maps_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct Tuning {
    pub gravity: f32,          // px/s²
    pub run_speed: f32,        // px/s
    pub jump_speed: f32,       // px/s, applied as an upward impulse
    pub climb_speed: f32,      // px/s on ladders
    pub max_hp: u32,
    pub invincibility_ms: u64, // post-hit damage immunity
    pub history_cap: usize,    // rewind buffer capacity, frames
    pub rewind_batch: usize,   // history entries consumed per rewind frame
    pub death_time_s: f32,     // delay before respawn after dying
    pub enemy_speed: f32,
    pub saw_amplitude: f32,    // px
    pub saw_speed: f32,        // rad/s
    pub platform_arm_s: f32,   // crumble arming delay
    pub boss_hp: u32,
    pub boss_speed: f32,
    pub boss_rage_multiplier: f32,
    pub boss_teleport_s: f32,  // teleport cooldown while enraged
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            gravity: default_gravity(),
            run_speed: default_run_speed(),
            jump_speed: default_jump_speed(),
            climb_speed: default_climb_speed(),
            max_hp: default_max_hp(),
            invincibility_ms: default_invincibility_ms(),
            history_cap: default_history_cap(),
            rewind_batch: default_rewind_batch(),
            death_time_s: default_death_time(),
            enemy_speed: default_enemy_speed(),
            saw_amplitude: default_saw_amplitude(),
            saw_speed: default_saw_speed(),
            platform_arm_s: default_platform_arm(),
            boss_hp: default_boss_hp(),
            boss_speed: default_boss_speed(),
            boss_rage_multiplier: default_boss_rage(),
            boss_teleport_s: default_boss_teleport(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    tuning: TomlTuning,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTuning {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_run_speed")]
    run_speed: f32,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_climb_speed")]
    climb_speed: f32,
    #[serde(default = "default_max_hp")]
    max_hp: u32,
    #[serde(default = "default_invincibility_ms")]
    invincibility_ms: u64,
    #[serde(default = "default_history_cap")]
    history_cap: usize,
    #[serde(default = "default_rewind_batch")]
    rewind_batch: usize,
    #[serde(default = "default_death_time")]
    death_time_s: f32,
    #[serde(default = "default_enemy_speed")]
    enemy_speed: f32,
    #[serde(default = "default_saw_amplitude")]
    saw_amplitude: f32,
    #[serde(default = "default_saw_speed")]
    saw_speed: f32,
    #[serde(default = "default_platform_arm")]
    platform_arm_s: f32,
    #[serde(default = "default_boss_hp")]
    boss_hp: u32,
    #[serde(default = "default_boss_speed")]
    boss_speed: f32,
    #[serde(default = "default_boss_rage")]
    boss_rage_multiplier: f32,
    #[serde(default = "default_boss_teleport")]
    boss_teleport_s: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_maps_dir")]
    maps_dir: String,
}

// ── Defaults ──

fn default_gravity() -> f32 { 980.0 }
fn default_run_speed() -> f32 { 180.0 }
fn default_jump_speed() -> f32 { 360.0 }
fn default_climb_speed() -> f32 { 120.0 }
fn default_max_hp() -> u32 { 5 }
fn default_invincibility_ms() -> u64 { 800 }
fn default_history_cap() -> usize { 90 }     // 1.5s of positions at 60 Hz
fn default_rewind_batch() -> usize { 3 }     // rewind runs at 3x real time
fn default_death_time() -> f32 { 1.1 }
fn default_enemy_speed() -> f32 { 90.0 }
fn default_saw_amplitude() -> f32 { 48.0 }
fn default_saw_speed() -> f32 { 1.3 }
fn default_platform_arm() -> f32 { 0.25 }
fn default_boss_hp() -> u32 { 6 }
fn default_boss_speed() -> f32 { 70.0 }
fn default_boss_rage() -> f32 { 1.6 }
fn default_boss_teleport() -> f32 { 3.0 }
fn default_maps_dir() -> String { "maps".into() }

impl Default for TomlTuning {
    fn default() -> Self {
        TomlTuning {
            gravity: default_gravity(),
            run_speed: default_run_speed(),
            jump_speed: default_jump_speed(),
            climb_speed: default_climb_speed(),
            max_hp: default_max_hp(),
            invincibility_ms: default_invincibility_ms(),
            history_cap: default_history_cap(),
            rewind_batch: default_rewind_batch(),
            death_time_s: default_death_time(),
            enemy_speed: default_enemy_speed(),
            saw_amplitude: default_saw_amplitude(),
            saw_speed: default_saw_speed(),
            platform_arm_s: default_platform_arm(),
            boss_hp: default_boss_hp(),
            boss_speed: default_boss_speed(),
            boss_rage_multiplier: default_boss_rage(),
            boss_teleport_s: default_boss_teleport(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            maps_dir: default_maps_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve the maps directory against the candidate dirs
        let maps_dir_str = &toml_cfg.general.maps_dir;
        let maps_dir = if PathBuf::from(maps_dir_str).is_absolute() {
            PathBuf::from(maps_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(maps_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(maps_dir_str))
        };

        let t = toml_cfg.tuning;
        GameConfig {
            tuning: Tuning {
                gravity: t.gravity,
                run_speed: t.run_speed,
                jump_speed: t.jump_speed,
                climb_speed: t.climb_speed,
                max_hp: t.max_hp,
                invincibility_ms: t.invincibility_ms,
                history_cap: t.history_cap.max(1),
                rewind_batch: t.rewind_batch.max(1),
                death_time_s: t.death_time_s,
                enemy_speed: t.enemy_speed,
                saw_amplitude: t.saw_amplitude,
                saw_speed: t.saw_speed,
                platform_arm_s: t.platform_arm_s,
                boss_hp: t.boss_hp.max(1),
                boss_speed: t.boss_speed,
                boss_rage_multiplier: t.boss_rage_multiplier,
                boss_teleport_s: t.boss_teleport_s,
            },
            maps_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data is found relative to the real binary
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
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: TomlConfig = toml::from_str(
            r#"
            [tuning]
            gravity = 600.0
            max_hp = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.tuning.gravity, 600.0);
        assert_eq!(cfg.tuning.max_hp, 3);
        assert_eq!(cfg.tuning.run_speed, default_run_speed());
        assert_eq!(cfg.tuning.invincibility_ms, default_invincibility_ms());
        assert_eq!(cfg.general.maps_dir, "maps");
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.tuning.history_cap, default_history_cap());
        assert_eq!(cfg.tuning.rewind_batch, default_rewind_batch());
    }
}
