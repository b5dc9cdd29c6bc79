/// One fixed simulation step.
///
/// Frame order is fixed and single-threaded; every subsystem sees the
/// same world the previous one left behind:
///   hazards -> player -> platform triggers -> enemies -> combat ->
///   zone triggers -> boss -> camera
///
/// The step returns the events it produced; the caller decides what they
/// mean (messages, level advance, the victory screen).

use crate::domain::ai::{boss_update, patrol};
use crate::domain::combat::{contact, HazardKind};
use crate::domain::entity::{Facing, InputFrame, PlayerMode};
use crate::domain::geom::{Rect, Vec2};
use crate::domain::tile::TILE;
use crate::sim::event::GameEvent;
use crate::sim::world::WorldState;

/// Melee attack reach in front of the player, px.
const ATTACK_W: i32 = 24;
const ATTACK_H: i32 = 20;

pub fn step(state: &mut WorldState, input: &InputFrame, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    state.clock_ms += (dt * 1000.0).round() as u64;
    if state.message_timer > 0.0 {
        state.message_timer -= dt;
        if state.message_timer <= 0.0 {
            state.message.clear();
        }
    }

    resolve_hazards(state, dt);
    let solids = state.solids_with_platforms();

    resolve_player(state, input, dt, &solids, &mut events);
    resolve_platform_triggers(state, &mut events);
    resolve_enemies(state, dt, &solids);
    resolve_combat(state, input, &mut events);
    resolve_zones(state, &mut events);
    resolve_boss(state, dt, &solids, &mut events);

    let focus = state.player.body.rect;
    state.camera.follow(
        focus.center_x(),
        focus.center_y(),
        state.world.pixel_width(),
        state.world.pixel_height(),
    );

    events
}

// ── Hazards ──

fn resolve_hazards(state: &mut WorldState, dt: f32) {
    let t = state.tuning.clone();
    for saw in &mut state.saws {
        saw.update(dt, t.saw_amplitude, t.saw_speed);
    }
    for p in &mut state.platforms {
        p.update(dt, t.gravity, t.platform_arm_s);
    }
    // Platforms that fell out of the world stop existing
    let floor = state.world.pixel_height() + TILE;
    state.platforms.retain(|p| p.rect.y <= floor);
}

// ── Player ──

fn resolve_player(
    state: &mut WorldState,
    input: &InputFrame,
    dt: f32,
    solids: &[Rect],
    events: &mut Vec<GameEvent>,
) {
    let t = state.tuning.clone();
    let world_h = state.world.pixel_height();
    let player = &mut state.player;

    // Death cycle: freeze until the timer runs, then respawn at the
    // checkpoint.
    if player.is_dead() {
        player.death_timer += dt;
        if player.death_timer >= t.death_time_s {
            let at = player.checkpoint;
            player.respawn(at);
            events.push(GameEvent::PlayerRespawned);
        }
        return;
    }

    // Rewind preempts everything: teleport back through history, no
    // physics, no recording.
    if input.rewind && player.history_len() > 0 {
        player.mode = PlayerMode::Rewinding;
        player.rewind(t.rewind_batch);
        return;
    }

    // Ladder climbing: direct movement, gravity suspended. Entered by
    // pressing up/down while overlapping a ladder; left by jumping or by
    // leaving the ladder strip.
    let on_ladder = player.body.rect.overlaps_any(&state.world.ladders);
    if player.mode == PlayerMode::Climbing {
        if !on_ladder || input.jump {
            player.mode = PlayerMode::Normal;
            if input.jump {
                player.body.vy = -t.jump_speed;
            }
        }
    } else if on_ladder && (input.up || input.down) {
        player.mode = PlayerMode::Climbing;
        player.body.stop();
    }

    if player.mode == PlayerMode::Climbing {
        player.push_history();
        player.body.vx = 0.0;
        player.body.vy = axis(input.up, input.down) * t.climb_speed;
        // Direct movement: ladders override solid collision entirely, and
        // the ground flag is left as-is.
        player.body.rect.y += (player.body.vy * dt) as i32;
        return;
    }

    player.mode = PlayerMode::Normal;
    player.push_history();

    let dir = axis(input.left, input.right);
    player.body.vx = dir * t.run_speed;
    if dir < 0.0 {
        player.facing = Facing::Left;
    } else if dir > 0.0 {
        player.facing = Facing::Right;
    }

    if input.jump && player.body.on_ground {
        player.body.vy = -t.jump_speed;
    }
    player.body.vy += t.gravity * dt;
    player.body.move_and_collide(dt, solids);

    // Falling past the bottom of the level is an instant reset, not a
    // death: back to the checkpoint with history cleared.
    if player.body.rect.y > world_h {
        let at = player.checkpoint;
        player.respawn(at);
        events.push(GameEvent::VoidFall);
    }
}

fn axis(neg: bool, pos: bool) -> f32 {
    match (neg, pos) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

// ── Platform triggers ──

/// Standing on a crumbling platform arms it: probe one pixel below the
/// player's feet.
fn resolve_platform_triggers(state: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !state.player.body.on_ground {
        return;
    }
    let probe = state.player.body.rect.translated(0, 1);
    for p in &mut state.platforms {
        if !p.is_falling() && probe.intersects(&p.rect) {
            p.trigger();
            events.push(GameEvent::PlatformTriggered {
                x: p.rect.x,
                y: p.rect.y,
            });
        }
    }
}

// ── Enemies ──

fn resolve_enemies(state: &mut WorldState, dt: f32, solids: &[Rect]) {
    let speed = state.tuning.enemy_speed;
    let gravity = state.tuning.gravity;
    for e in &mut state.enemies {
        patrol(&mut e.body, &mut e.facing, speed, gravity, dt, solids);
    }
}

// ── Combat ──

fn resolve_combat(state: &mut WorldState, input: &InputFrame, events: &mut Vec<GameEvent>) {
    let now = state.clock_ms;
    let window = state.tuning.invincibility_ms;
    let player = &mut state.player;
    let was_dead = player.is_dead();

    let mut hit = false;
    for trap in &state.world.traps {
        hit |= contact(player, HazardKind::Trap, trap, now, window);
    }
    for saw in &state.saws {
        hit |= contact(player, HazardKind::Saw, &saw.rect, now, window);
    }
    for enemy in &state.enemies {
        hit |= contact(player, HazardKind::Enemy, &enemy.body.rect, now, window);
    }
    if let Some(boss) = &state.boss {
        hit |= contact(player, HazardKind::Boss, &boss.body.rect, now, window);
    }

    if hit {
        events.push(GameEvent::PlayerDamaged { hp: player.hp });
        if player.is_dead() && !was_dead {
            events.push(GameEvent::PlayerDied);
        }
    }

    // Player melee: a short box in front of the facing edge, boss only.
    if input.attack && !player.is_dead() {
        let r = player.body.rect;
        let swing = Rect::new(
            match player.facing {
                Facing::Right => r.right(),
                Facing::Left => r.x - ATTACK_W,
            },
            r.y + (r.h - ATTACK_H) / 2,
            ATTACK_W,
            ATTACK_H,
        );
        if let Some(boss) = &mut state.boss {
            if swing.intersects(&boss.body.rect) {
                boss.hp = boss.hp.saturating_sub(1);
                events.push(GameEvent::BossHit { hp: boss.hp });
                if boss.is_defeated() {
                    events.push(GameEvent::BossDefeated);
                }
            }
        }
        if state.boss.as_ref().map(|b| b.is_defeated()).unwrap_or(false) {
            state.boss = None;
        }
    }
}

// ── Zone triggers ──

fn resolve_zones(state: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player = &mut state.player;
    if player.is_dead() {
        return;
    }

    for zone in &state.world.checkpoints {
        if player.body.rect.intersects(zone) {
            // The zone rect is inset for forgiving contact; respawn from
            // the flag's tile origin, one tile up, so the player lands
            // square on the flag.
            let tile_x = zone.x - zone.x.rem_euclid(TILE);
            let tile_y = zone.y - zone.y.rem_euclid(TILE);
            let point = Vec2::new(tile_x, tile_y - TILE);
            if player.checkpoint != point {
                player.checkpoint = point;
                events.push(GameEvent::CheckpointReached {
                    x: zone.x,
                    y: zone.y,
                });
            }
        }
    }

    if player.body.rect.overlaps_any(&state.world.exits) {
        events.push(GameEvent::LevelComplete);
    }
}

// ── Boss ──

fn resolve_boss(
    state: &mut WorldState,
    dt: f32,
    solids: &[Rect],
    events: &mut Vec<GameEvent>,
) {
    let t = &state.tuning;
    if let Some(boss) = &mut state.boss {
        let out = boss_update(
            boss,
            &state.player.body.rect,
            dt,
            solids,
            t.gravity,
            t.boss_speed,
            t.boss_rage_multiplier,
            t.boss_teleport_s,
        );
        if out.just_enraged {
            events.push(GameEvent::BossEnraged);
        }
        if out.teleported {
            events.push(GameEvent::BossTeleported);
        }
    }
}
