/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::{self, LevelDef};
use sim::step::step;
use sim::world::{Mode, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;

/// Fixed simulation timestep, 60 Hz.
const SIM_DT: f32 = 1.0 / 60.0;
/// Cap on accumulated lag so a long stall doesn't spiral.
const MAX_ACCUM: f32 = 0.25;
const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let levels = match level::load_levels(&config.maps_dir) {
        Ok(defs) => defs,
        Err(e) => {
            eprintln!("Level load failed: {e}");
            return;
        }
    };

    let mut world = WorldState::new(config.tuning.clone(), 0, 0);
    world.level_names = levels.iter().map(|d| d.name.clone()).collect();
    world.total_levels = levels.len();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &levels);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Chrono Runner!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    levels: &[LevelDef],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_key_releases();
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0_f32;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, levels) {
            break;
        }

        let now = Instant::now();
        accumulator += now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        if accumulator > MAX_ACCUM {
            accumulator = MAX_ACCUM;
        }

        if world.mode == Mode::Playing {
            // The edge-triggered attack must reach exactly one sim step,
            // however many steps this frame runs.
            let mut input = kb.frame();
            while accumulator >= SIM_DT {
                accumulator -= SIM_DT;
                let events = step(world, &input, SIM_DT);
                input.attack = false;
                handle_events(world, levels, &events);
                if world.mode != Mode::Playing {
                    accumulator = 0.0;
                    break;
                }
            }
        } else {
            // Menus don't simulate; drop the lag so play resumes cleanly
            accumulator = 0.0;
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Screen-level key handling. Returns true to quit the program.
fn handle_meta(world: &mut WorldState, kb: &InputState, levels: &[LevelDef]) -> bool {
    match world.mode {
        Mode::Menu => {
            if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Esc]) {
                return true;
            }
            if kb.was_pressed(KeyCode::Enter) {
                level::load_level(world, levels, 0);
            } else if kb.was_pressed(KeyCode::Char('l')) {
                world.select_cursor = world.level_index.min(levels.len().saturating_sub(1));
                world.mode = Mode::LevelSelect;
            }
        }
        Mode::LevelSelect => {
            if kb.was_pressed(KeyCode::Esc) {
                world.mode = Mode::Menu;
            } else if kb.was_pressed(KeyCode::Up) {
                world.select_cursor = world.select_cursor.saturating_sub(1);
            } else if kb.was_pressed(KeyCode::Down) {
                world.select_cursor =
                    (world.select_cursor + 1).min(levels.len().saturating_sub(1));
            } else if kb.was_pressed(KeyCode::Enter) {
                level::load_level(world, levels, world.select_cursor);
            }
        }
        Mode::Playing => {
            if kb.was_pressed(KeyCode::Esc) {
                world.mode = Mode::Menu;
            }
        }
        Mode::Cinematic => {
            if kb.any_pressed(&[KeyCode::Enter, KeyCode::Esc, KeyCode::Char(' ')]) {
                world.mode = Mode::Menu;
            }
        }
    }
    false
}

/// Turn simulation events into messages and screen transitions.
fn handle_events(world: &mut WorldState, levels: &[LevelDef], events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::CheckpointReached { .. } => {
                world.set_message("Checkpoint!");
            }
            GameEvent::VoidFall => {
                world.set_message("Back to the checkpoint...");
            }
            GameEvent::PlayerRespawned => {
                world.set_message("Try again!");
            }
            GameEvent::BossEnraged => {
                world.set_message("The tyrant is enraged!");
            }
            GameEvent::BossDefeated => {
                world.mode = Mode::Cinematic;
                return;
            }
            GameEvent::LevelComplete => {
                let next = world.level_index + 1;
                if next < levels.len() {
                    level::load_level(world, levels, next);
                } else {
                    world.mode = Mode::Cinematic;
                }
                return;
            }
            GameEvent::PlayerDamaged { .. }
            | GameEvent::PlayerDied
            | GameEvent::PlatformTriggered { .. }
            | GameEvent::BossHit { .. }
            | GameEvent::BossTeleported => {}
        }
    }
}
