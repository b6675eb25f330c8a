//! Axis-aligned bounding boxes in block units.

use blockpilot_types::Vec3;

/// Player box half-width on X and Z.
pub const PLAYER_HALF_WIDTH: f64 = 0.3;
/// Player box height.
pub const PLAYER_HEIGHT: f64 = 1.8;

/// An axis-aligned bounding box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a bounding box from its two opposite corners.
    ///
    /// The constructor normalises the corners so that `min ≤ max` per axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// The box of a player whose feet are at `feet`.
    pub fn player(feet: Vec3) -> Self {
        Self::column(feet, PLAYER_HALF_WIDTH, PLAYER_HEIGHT)
    }

    /// A box centred on `feet` horizontally and rising `height` above it.
    pub fn column(feet: Vec3, half_width: f64, height: f64) -> Self {
        Self {
            min: Vec3::new(feet.x - half_width, feet.y, feet.z - half_width),
            max: Vec3::new(feet.x + half_width, feet.y + height, feet.z + half_width),
        }
    }

    pub fn offset(&self, d: Vec3) -> Self {
        Self {
            min: self.min + d,
            max: self.max + d,
        }
    }

    /// Shift along a single axis.
    pub fn offset_axis(&self, axis: usize, d: f64) -> Self {
        let mut delta = Vec3::ZERO;
        delta.set_axis(axis, d);
        self.offset(delta)
    }

    /// True when `other` overlaps this box with positive volume.  Touching faces
    /// do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Return the centre point of the box.
    pub fn centre(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_box_extents() {
        let b = Aabb::player(Vec3::new(0.5, 64.0, 0.5));
        assert_eq!(b.min, Vec3::new(0.2, 64.0, 0.2));
        assert!((b.max.y - 65.8).abs() < 1e-12);
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = a.offset(Vec3::new(1.0, 0.0, 0.0));
        assert!(!a.intersects(&b));
        let c = a.offset(Vec3::new(0.5, 0.0, 0.0));
        assert!(a.intersects(&c));
    }

    #[test]
    fn new_normalises_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(b.centre(), Vec3::new(0.0, 0.0, 1.0));
    }
}
