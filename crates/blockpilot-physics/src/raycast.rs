//! Line-of-sight queries by fixed-step ray marching.

use blockpilot_types::{BlockOracle, BlockPos, Vec3};

/// Distance between samples along the ray.
pub const RAY_STEP: f64 = 0.05;

/// First solid cell met by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub pos: BlockPos,
    /// Distance from the ray origin to the sample that entered `pos`.
    pub distance: f64,
}

/// March from `from` to `to` and report the first solid cell on the way.
///
/// The cell containing `from` is skipped so a ray can leave a block the eye
/// happens to clip.
pub fn first_solid(oracle: &dyn BlockOracle, from: Vec3, to: Vec3) -> Option<RayHit> {
    let delta = to - from;
    let length = delta.length();
    if length < f64::EPSILON {
        return None;
    }
    let dir = delta * (1.0 / length);
    let origin = BlockPos::containing(from);
    let steps = (length / RAY_STEP).ceil() as usize;

    let mut last = origin;
    for i in 1..=steps {
        let t = (i as f64 * RAY_STEP).min(length);
        let cell = BlockPos::containing(from + dir * t);
        if cell == last {
            continue;
        }
        last = cell;
        if oracle.is_solid_at(cell) {
            return Some(RayHit {
                pos: cell,
                distance: t,
            });
        }
    }
    None
}

/// True when no solid cell lies between the two points.
pub fn line_of_sight(oracle: &dyn BlockOracle, from: Vec3, to: Vec3) -> bool {
    first_solid(oracle, from, to).is_none()
}

/// True when the first solid cell on the way to `pos`'s centre is `pos` itself
/// (or nothing is hit at all).
pub fn block_visible(oracle: &dyn BlockOracle, eye: Vec3, pos: BlockPos) -> bool {
    match first_solid(oracle, eye, pos.center()) {
        Some(hit) => hit.pos == pos,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWorld;

    #[test]
    fn ray_stops_at_first_block() {
        let world = SimWorld::new()
            .with_solid(BlockPos::new(3, 1, 0))
            .with_solid(BlockPos::new(5, 1, 0));
        let hit = first_solid(&world, Vec3::new(0.5, 1.5, 0.5), Vec3::new(8.5, 1.5, 0.5)).unwrap();
        assert_eq!(hit.pos, BlockPos::new(3, 1, 0));
        assert!((hit.distance - 2.5).abs() <= RAY_STEP + 1e-9);
    }

    #[test]
    fn clear_ray_has_line_of_sight() {
        let world = SimWorld::flat(0);
        assert!(line_of_sight(&world, Vec3::new(0.5, 1.6, 0.5), Vec3::new(6.5, 1.6, 3.5)));
    }

    #[test]
    fn target_block_is_visible_but_not_through_a_wall() {
        let world = SimWorld::new()
            .with_solid(BlockPos::new(4, 1, 0))
            .with_solid(BlockPos::new(2, 1, 0));
        let eye = Vec3::new(0.5, 1.5, 0.5);
        assert!(block_visible(&world, eye, BlockPos::new(2, 1, 0)));
        assert!(!block_visible(&world, eye, BlockPos::new(4, 1, 0)));
    }
}
