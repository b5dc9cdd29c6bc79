/// Damage resolution: hazard-vs-player contact with one shared gate.
///
/// Damage sources are a small set of tagged variants, not a type
/// hierarchy — traps, saws, enemies and the boss all funnel through the
/// same `contact` call, and the player's invincibility window collapses
/// any number of simultaneous overlaps into a single health decrement.

use super::entity::Player;
use super::geom::Rect;

/// Every hit takes one heart.
pub const CONTACT_DAMAGE: u32 = 1;

/// Knockback magnitudes, px/s.
const KNOCKBACK_X: f32 = 200.0;
const KNOCKBACK_Y: f32 = -220.0;
const TRAP_KNOCKBACK_Y: f32 = -240.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HazardKind {
    Trap,
    Saw,
    Enemy,
    Boss,
}

/// Knockback for a hit. Traps push straight up; everything else pushes
/// the player horizontally away from the hazard's center.
pub fn knockback(kind: HazardKind, player_cx: i32, hazard_cx: i32) -> (f32, f32) {
    match kind {
        HazardKind::Trap => (0.0, TRAP_KNOCKBACK_Y),
        _ => {
            let away = if player_cx < hazard_cx { -1.0 } else { 1.0 };
            (KNOCKBACK_X * away, KNOCKBACK_Y)
        }
    }
}

/// Test overlap and attempt the hit. Returns true only when damage
/// actually landed (overlap AND the invincibility gate was open).
pub fn contact(
    player: &mut Player,
    kind: HazardKind,
    hazard: &Rect,
    now_ms: u64,
    window_ms: u64,
) -> bool {
    if !player.body.rect.intersects(hazard) {
        return false;
    }
    let kb = knockback(kind, player.body.rect.center_x(), hazard.center_x());
    player.take_damage(CONTACT_DAMAGE, now_ms, window_ms, kb)
}
