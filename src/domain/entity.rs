/// Entities: Player, Enemy, Boss.
///
/// The player carries the two mechanics this game is built around:
///   - a damage/invincibility gate keyed on a wall-clock millisecond
///     timestamp (two hits inside the window count as one)
///   - a bounded position-history ring buffer consumed by the rewind

use std::collections::VecDeque;

use super::body::Body;
use super::geom::{Rect, Vec2};
use super::tile::TILE;

pub const PLAYER_W: i32 = 26;
pub const PLAYER_H: i32 = 30;
pub const ENEMY_SIZE: i32 = 26;
pub const BOSS_W: i32 = 36;
pub const BOSS_H: i32 = 44;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn dx(self) -> i32 {
        match self {
            Facing::Left => -1,
            Facing::Right => 1,
        }
    }

    pub fn flip(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Player state machine. Climbing and Rewinding are re-resolved every
/// frame from input + world overlap; Dead is sticky until its timer runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerMode {
    Normal,
    Climbing,
    Rewinding,
    Dead,
}

/// Per-frame input snapshot handed to the simulation by the UI layer.
/// Movement/jump/rewind are level-triggered (held); attack is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    pub rewind: bool,
    pub attack: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub facing: Facing,
    pub mode: PlayerMode,
    pub hp: u32,
    pub max_hp: u32,
    /// Timestamp of the last hit that landed; None until first damage.
    pub last_hit_ms: Option<u64>,
    /// Seconds spent in Dead so far.
    pub death_timer: f32,
    pub spawn: Vec2,
    pub checkpoint: Vec2,
    history: VecDeque<Vec2>,
    history_cap: usize,
}

impl Player {
    pub fn new(spawn: Vec2, max_hp: u32, history_cap: usize) -> Self {
        Player {
            body: Body::new(Rect::new(spawn.x, spawn.y, PLAYER_W, PLAYER_H)),
            facing: Facing::Right,
            mode: PlayerMode::Normal,
            hp: max_hp,
            max_hp,
            last_hit_ms: None,
            death_timer: 0.0,
            spawn,
            checkpoint: spawn,
            history: VecDeque::with_capacity(history_cap),
            history_cap,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.mode == PlayerMode::Dead
    }

    /// Is the post-hit invincibility window still open at `now_ms`?
    pub fn invincible(&self, now_ms: u64, window_ms: u64) -> bool {
        match self.last_hit_ms {
            Some(t) => now_ms.saturating_sub(t) < window_ms,
            None => false,
        }
    }

    /// Apply damage with knockback. Gated: a no-op while dead or inside
    /// the invincibility window. Returns true if the hit landed.
    /// Reaching 0 health transitions to Dead with the timer reset.
    pub fn take_damage(
        &mut self,
        amount: u32,
        now_ms: u64,
        window_ms: u64,
        knockback: (f32, f32),
    ) -> bool {
        if self.is_dead() || self.invincible(now_ms, window_ms) {
            return false;
        }
        self.last_hit_ms = Some(now_ms);
        self.hp = self.hp.saturating_sub(amount);
        self.body.vx += knockback.0;
        self.body.vy += knockback.1;
        if self.hp == 0 {
            self.mode = PlayerMode::Dead;
            self.death_timer = 0.0;
        }
        true
    }

    // ── Position history (rewind) ──

    /// Record the current position. Oldest entry is evicted at capacity.
    pub fn push_history(&mut self) {
        if self.history.len() == self.history_cap {
            self.history.pop_front();
        }
        self.history.push_back(self.body.rect.top_left());
    }

    /// Consume up to `batch` history entries, most recent first, landing
    /// on the last one popped. Teleportation, not physics: velocities are
    /// zeroed. Returns false when the history was already empty (no-op).
    pub fn rewind(&mut self, batch: usize) -> bool {
        let mut moved = false;
        for _ in 0..batch {
            match self.history.pop_back() {
                Some(p) => {
                    self.body.rect.set_top_left(p);
                    moved = true;
                }
                None => break,
            }
        }
        if moved {
            self.body.stop();
        }
        moved
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Place the player at `at` with full health, cleared history and no
    /// motion. Used by both the death cycle and the void-fall respawn.
    pub fn respawn(&mut self, at: Vec2) {
        self.hp = self.max_hp;
        self.mode = PlayerMode::Normal;
        self.death_timer = 0.0;
        self.body.rect.set_top_left(at);
        self.body.stop();
        self.body.on_ground = false;
        self.history.clear();
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub body: Body,
    pub facing: Facing,
}

impl Enemy {
    /// `tile_origin` is the top-left of the spawn tile; the body sits
    /// slightly inset so it doesn't clip the neighboring tiles.
    pub fn new(tile_origin: Vec2) -> Self {
        Enemy {
            body: Body::new(Rect::new(
                tile_origin.x + 3,
                tile_origin.y + 6,
                ENEMY_SIZE,
                ENEMY_SIZE,
            )),
            facing: Facing::Right,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Boss {
    pub body: Body,
    pub facing: Facing,
    pub hp: u32,
    pub max_hp: u32,
    pub enraged: bool,
    /// Seconds until the next teleport while enraged.
    pub teleport_timer: f32,
}

impl Boss {
    pub fn new(tile_origin: Vec2, hp: u32, teleport_cooldown: f32) -> Self {
        Boss {
            body: Body::new(Rect::new(
                tile_origin.x - (BOSS_W - TILE) / 2,
                tile_origin.y + TILE - BOSS_H,
                BOSS_W,
                BOSS_H,
            )),
            facing: Facing::Left,
            hp,
            max_hp: hp,
            enraged: false,
            teleport_timer: teleport_cooldown,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(Vec2::new(64, 120), 5, 90)
    }

    // ── Damage / invincibility ──

    #[test]
    fn second_hit_inside_window_is_ignored() {
        let mut p = player();
        assert!(p.take_damage(1, 1000, 800, (0.0, 0.0)));
        assert!(!p.take_damage(1, 1500, 800, (0.0, 0.0)));
        assert_eq!(p.hp, 4);
    }

    #[test]
    fn hit_after_window_lands() {
        let mut p = player();
        assert!(p.take_damage(1, 1000, 800, (0.0, 0.0)));
        assert!(p.take_damage(1, 1800, 800, (0.0, 0.0)));
        assert_eq!(p.hp, 3);
    }

    #[test]
    fn knockback_adds_to_velocity() {
        let mut p = player();
        p.body.vx = 10.0;
        p.take_damage(1, 0, 800, (-200.0, -220.0));
        assert_eq!(p.body.vx, -190.0);
        assert_eq!(p.body.vy, -220.0);
    }

    #[test]
    fn lethal_hit_transitions_to_dead() {
        let mut p = player();
        p.hp = 1;
        p.take_damage(1, 0, 800, (0.0, 0.0));
        assert!(p.is_dead());
        assert_eq!(p.death_timer, 0.0);
    }

    #[test]
    fn dead_player_takes_no_damage() {
        let mut p = player();
        p.hp = 1;
        p.take_damage(1, 0, 800, (0.0, 0.0));
        assert!(!p.take_damage(1, 10_000, 800, (0.0, 0.0)));
        assert_eq!(p.hp, 0);
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut p = player();
        p.hp = 2;
        p.take_damage(5, 0, 800, (0.0, 0.0));
        assert_eq!(p.hp, 0);
        assert!(p.is_dead());
    }

    // ── History / rewind ──

    #[test]
    fn history_evicts_oldest_at_capacity() {
        let mut p = Player::new(Vec2::new(0, 0), 5, 4);
        for i in 0..10 {
            p.body.rect.x = i;
            p.push_history();
        }
        assert_eq!(p.history_len(), 4);
        // Rewinding all the way lands on the oldest surviving entry (x=6)
        p.rewind(4);
        assert_eq!(p.body.rect.x, 6);
    }

    #[test]
    fn rewind_pops_a_batch_and_lands_on_the_last() {
        let mut p = player();
        for i in 0..10 {
            p.body.rect.x = i * 10;
            p.push_history();
        }
        p.body.vx = 50.0;
        assert!(p.rewind(3));
        // Entries 90, 80, 70 popped; position is the third one back
        assert_eq!(p.body.rect.x, 70);
        assert_eq!(p.body.vx, 0.0);
        assert_eq!(p.history_len(), 7);
    }

    #[test]
    fn rewind_exhausts_to_oldest_available() {
        let mut p = player();
        for i in 0..2 {
            p.body.rect.x = 100 + i;
            p.push_history();
        }
        assert!(p.rewind(3));
        assert_eq!(p.body.rect.x, 100);
        assert_eq!(p.history_len(), 0);
    }

    #[test]
    fn rewind_on_empty_history_is_a_noop() {
        let mut p = player();
        p.body.rect.x = 42;
        assert!(!p.rewind(3));
        assert_eq!(p.body.rect.x, 42);
    }

    // ── Respawn ──

    #[test]
    fn respawn_restores_health_and_clears_history() {
        let mut p = player();
        p.push_history();
        p.take_damage(3, 0, 800, (50.0, -100.0));
        p.respawn(Vec2::new(200, 300));
        assert_eq!(p.hp, 5);
        assert_eq!(p.mode, PlayerMode::Normal);
        assert_eq!(p.body.rect.top_left(), Vec2::new(200, 300));
        assert_eq!(p.body.vx, 0.0);
        assert_eq!(p.history_len(), 0);
    }
}
