/// Integer pixel geometry.
///
/// All collision shapes in the game are axis-aligned rectangles in world
/// pixel space. Positions are whole pixels; velocities are floats and get
/// truncated to pixel deltas once per frame (see body.rs).

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Vec2 { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_top_left(&mut self, p: Vec2) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Strict AABB overlap. Edge-touching rects do NOT intersect, which is
    /// what makes "standing exactly on top of a floor" a non-collision.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn overlaps_any(&self, rects: &[Rect]) -> bool {
        rects.iter().any(|r| self.intersects(r))
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn edge_touching_rects_do_not_intersect() {
        let floor = Rect::new(0, 32, 32, 32);
        let body = Rect::new(0, 2, 26, 30); // bottom == 32 == floor top
        assert!(!body.intersects(&floor));
        // One pixel lower and they collide
        assert!(body.translated(0, 1).intersects(&floor));
    }

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 0, 10, 10);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn overlaps_any_scans_the_list() {
        let a = Rect::new(0, 0, 10, 10);
        let list = [Rect::new(100, 0, 5, 5), Rect::new(8, 8, 5, 5)];
        assert!(a.overlaps_any(&list));
        assert!(!a.overlaps_any(&list[..1]));
    }
}
