/// Moving hazards: the oscillating saw and the crumbling platform.
///
/// Saws are purely kinematic — they never collide with world geometry,
/// they are only read by damage resolution. Falling platforms are solid
/// terrain until triggered; after a fixed arming delay they free-fall
/// under gravity (the crumbling-platform trope).

use super::geom::{Rect, Vec2};
use super::tile::TILE;

pub const SAW_SIZE: i32 = 26;

#[derive(Clone, Debug)]
pub struct Saw {
    /// Center of the oscillation, fixed at load.
    pub anchor: Vec2,
    pub rect: Rect,
    phase: f32,
}

impl Saw {
    /// `anchor` is the center of the spawn tile.
    pub fn new(anchor: Vec2) -> Self {
        Saw {
            anchor,
            rect: Rect::new(
                anchor.x - SAW_SIZE / 2,
                anchor.y - SAW_SIZE / 2,
                SAW_SIZE,
                SAW_SIZE,
            ),
            phase: 0.0,
        }
    }

    /// `x = anchor.x + amplitude * sin(phase * angular_speed)`
    pub fn update(&mut self, dt: f32, amplitude: f32, angular_speed: f32) {
        self.phase += dt;
        let offset = (self.phase * angular_speed).sin() * amplitude;
        self.rect.x = self.anchor.x - SAW_SIZE / 2 + offset as i32;
    }
}

#[derive(Clone, Debug)]
pub struct FallingPlatform {
    pub rect: Rect,
    falling: bool,
    timer: f32,
    vy: f32,
}

impl FallingPlatform {
    pub fn new(tile_origin: Vec2) -> Self {
        FallingPlatform {
            rect: Rect::new(tile_origin.x, tile_origin.y, TILE, TILE),
            falling: false,
            timer: 0.0,
            vy: 0.0,
        }
    }

    /// Start the crumble. Idempotent: re-triggering while falling is a no-op.
    pub fn trigger(&mut self) {
        if !self.falling {
            self.falling = true;
            self.timer = 0.0;
            self.vy = 0.0;
        }
    }

    pub fn is_falling(&self) -> bool {
        self.falling
    }

    /// No displacement until the arming delay has fully elapsed; after
    /// that, the platform falls from rest under gravity. It never moves
    /// upward.
    pub fn update(&mut self, dt: f32, gravity: f32, arm_delay: f32) {
        if !self.falling {
            return;
        }
        self.timer += dt;
        if self.timer > arm_delay {
            self.vy += gravity * dt;
            self.rect.y += (self.vy * dt) as i32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAVITY: f32 = 980.0;
    const ARM: f32 = 0.25;

    #[test]
    fn saw_oscillation_stays_within_amplitude() {
        let mut saw = Saw::new(Vec2::new(160, 160));
        let min_x = 160 - SAW_SIZE / 2 - 48;
        let max_x = 160 - SAW_SIZE / 2 + 48;
        for _ in 0..600 {
            saw.update(1.0 / 60.0, 48.0, 1.3);
            assert!(saw.rect.x >= min_x && saw.rect.x <= max_x);
        }
    }

    #[test]
    fn saw_returns_toward_anchor() {
        let mut saw = Saw::new(Vec2::new(160, 160));
        // One full period of sin(1.3 t) is ~4.83s
        for _ in 0..290 {
            saw.update(1.0 / 60.0, 48.0, 1.3);
        }
        let dist = (saw.rect.x - (160 - SAW_SIZE / 2)).abs();
        assert!(dist < 8, "saw should be near anchor after a full period, off by {dist}");
    }

    #[test]
    fn untriggered_platform_never_moves() {
        let mut fp = FallingPlatform::new(Vec2::new(64, 96));
        for _ in 0..120 {
            fp.update(1.0 / 60.0, GRAVITY, ARM);
        }
        assert_eq!(fp.rect.y, 96);
        assert!(!fp.is_falling());
    }

    #[test]
    fn arming_delay_produces_zero_displacement() {
        let mut fp = FallingPlatform::new(Vec2::new(64, 96));
        fp.trigger();
        // Exactly the arming delay of elapsed time: still no movement
        for _ in 0..15 {
            fp.update(ARM / 15.0, GRAVITY, ARM);
        }
        assert_eq!(fp.rect.y, 96);
    }

    #[test]
    fn displacement_increases_after_arming() {
        let mut fp = FallingPlatform::new(Vec2::new(64, 96));
        fp.trigger();
        fp.update(ARM, GRAVITY, ARM);
        assert_eq!(fp.rect.y, 96);

        let mut last_y = fp.rect.y;
        let mut descended = false;
        for _ in 0..30 {
            fp.update(1.0 / 30.0, GRAVITY, ARM);
            assert!(fp.rect.y >= last_y);
            if fp.rect.y > last_y {
                descended = true;
            }
            last_y = fp.rect.y;
        }
        assert!(descended);
    }

    #[test]
    fn platform_never_rises_after_triggering() {
        let mut fp = FallingPlatform::new(Vec2::new(64, 96));
        fp.trigger();
        fp.update(ARM, GRAVITY, ARM);
        fp.update(1.0 / 30.0, GRAVITY, ARM);
        assert!(
            fp.rect.y >= 96,
            "first post-arm frame moved up: y = {}",
            fp.rect.y
        );
        let mut last_y = fp.rect.y;
        for _ in 0..120 {
            fp.update(1.0 / 60.0, GRAVITY, ARM);
            assert!(fp.rect.y >= last_y);
            last_y = fp.rect.y;
        }
    }

    #[test]
    fn retrigger_while_falling_is_a_noop() {
        let mut fp = FallingPlatform::new(Vec2::new(64, 96));
        fp.trigger();
        for _ in 0..60 {
            fp.update(1.0 / 60.0, GRAVITY, ARM);
        }
        let y = fp.rect.y;
        let vy = fp.vy;
        fp.trigger(); // must not reset timer or velocity
        assert_eq!(fp.vy, vy);
        fp.update(1.0 / 60.0, GRAVITY, ARM);
        assert!(fp.rect.y >= y);
    }
}
