/// Kinematic bodies and axis-separated collision stepping.
///
/// ## Why unit stepping
///
/// A body moves one pixel at a time along a single axis, testing overlap
/// against the solid set after every pixel. On the first overlap the last
/// pixel is undone and the move stops. This guarantees:
///   - no tunneling through thin solids, whatever the per-frame delta
///   - a deterministic resting contact exactly adjacent to the solid
///
/// Cost is O(|delta|) per axis, bounded by max velocity / 60 Hz (a handful
/// of pixels), so the loop is always short.
///
/// ## Axis separation
///
/// X is stepped first, then Y, each resolved independently, so sliding
/// along a wall or floor is unaffected by the other axis's collision.
/// A downward Y collision is a landing: it sets `on_ground` and zeroes
/// vertical velocity. A horizontal collision leaves velocity untouched —
/// the caller decides how to react (the patrol AI reverses direction).

use super::geom::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
}

/// Outcome of one frame of `move_and_collide`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepResult {
    pub hit_x: bool,
    pub hit_y: bool,
    /// True when the Y collision happened while moving downward.
    pub landed: bool,
}

/// Move `rect` by `delta` pixels along `axis`, one pixel at a time.
/// Stops one pixel short of the first solid hit. Returns true on collision.
pub fn step_axis(rect: &mut Rect, delta: i32, axis: Axis, solids: &[Rect]) -> bool {
    if delta == 0 {
        return false;
    }
    let sign = if delta > 0 { 1 } else { -1 };
    for _ in 0..delta.abs() {
        match axis {
            Axis::X => rect.x += sign,
            Axis::Y => rect.y += sign,
        }
        if rect.overlaps_any(solids) {
            match axis {
                Axis::X => rect.x -= sign,
                Axis::Y => rect.y -= sign,
            }
            return true;
        }
    }
    false
}

/// A moving entity: bounding box, float velocity, ground contact flag.
/// Owned exclusively by its entity (player, enemy, boss).
#[derive(Clone, Debug)]
pub struct Body {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
}

impl Body {
    pub fn new(rect: Rect) -> Self {
        Body {
            rect,
            vx: 0.0,
            vy: 0.0,
            on_ground: false,
        }
    }

    /// Integrate one frame: X step, then Y step, against `solids`.
    /// `on_ground` is cleared before the vertical step and re-set only by
    /// a downward collision, so walking off a ledge drops the flag the
    /// same frame. Any vertical collision (landing or head bump) zeroes vy.
    pub fn move_and_collide(&mut self, dt: f32, solids: &[Rect]) -> StepResult {
        let dx = (self.vx * dt) as i32;
        let dy = (self.vy * dt) as i32;

        let hit_x = step_axis(&mut self.rect, dx, Axis::X, solids);
        self.on_ground = false;
        let hit_y = step_axis(&mut self.rect, dy, Axis::Y, solids);

        let landed = hit_y && dy > 0;
        if hit_y {
            if landed {
                self.on_ground = true;
            }
            self.vy = 0.0;
        }
        StepResult { hit_x, hit_y, landed }
    }

    /// Halt all motion. Used by rewind (teleport, not physics).
    pub fn stop(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geom::Rect;

    fn wall() -> Vec<Rect> {
        vec![Rect::new(100, 0, 32, 128)]
    }

    #[test]
    fn free_move_covers_full_delta() {
        let mut r = Rect::new(0, 0, 26, 30);
        let hit = step_axis(&mut r, 40, Axis::X, &wall());
        assert!(!hit);
        assert_eq!(r.x, 40);
    }

    #[test]
    fn stops_adjacent_to_solid_without_overlap() {
        let solids = wall();
        let mut r = Rect::new(0, 0, 26, 30);
        let hit = step_axis(&mut r, 200, Axis::X, &solids);
        assert!(hit);
        assert_eq!(r.right(), 100); // flush against the wall
        assert!(!r.overlaps_any(&solids));
    }

    #[test]
    fn never_tunnels_through_thin_solid() {
        // 1px-thin floor; a huge delta must not pass through it
        let solids = vec![Rect::new(0, 50, 200, 1)];
        let mut r = Rect::new(10, 0, 26, 30);
        let hit = step_axis(&mut r, 10_000, Axis::Y, &solids);
        assert!(hit);
        assert_eq!(r.bottom(), 50);
        assert!(!r.overlaps_any(&solids));
    }

    #[test]
    fn negative_delta_steps_leftward() {
        let solids = vec![Rect::new(0, 0, 10, 100)];
        let mut r = Rect::new(50, 0, 26, 30);
        let hit = step_axis(&mut r, -100, Axis::X, &solids);
        assert!(hit);
        assert_eq!(r.x, 10);
    }

    #[test]
    fn landing_sets_on_ground_and_zeroes_vy() {
        let solids = vec![Rect::new(0, 64, 200, 32)];
        let mut body = Body::new(Rect::new(10, 0, 26, 30));
        body.vy = 600.0;
        let res = body.move_and_collide(0.1, &solids); // dy = 60, floor at 34
        assert!(res.landed);
        assert!(body.on_ground);
        assert_eq!(body.vy, 0.0);
        assert_eq!(body.rect.bottom(), 64);
    }

    #[test]
    fn head_bump_zeroes_vy_but_not_grounded() {
        let solids = vec![Rect::new(0, 0, 200, 10)];
        let mut body = Body::new(Rect::new(10, 40, 26, 30));
        body.vy = -600.0;
        let res = body.move_and_collide(0.1, &solids);
        assert!(res.hit_y);
        assert!(!res.landed);
        assert!(!body.on_ground);
        assert_eq!(body.vy, 0.0);
    }

    #[test]
    fn walking_off_ledge_clears_on_ground() {
        let mut body = Body::new(Rect::new(10, 0, 26, 30));
        body.on_ground = true;
        body.vx = 100.0;
        let res = body.move_and_collide(0.05, &[]);
        assert!(!res.hit_x && !res.hit_y);
        assert!(!body.on_ground);
    }

    #[test]
    fn horizontal_hit_preserves_velocity() {
        let solids = wall();
        let mut body = Body::new(Rect::new(60, 0, 26, 30));
        body.vx = 300.0;
        let res = body.move_and_collide(0.1, &solids);
        assert!(res.hit_x);
        assert_eq!(body.vx, 300.0);
    }
}
