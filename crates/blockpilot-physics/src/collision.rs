//! Axis-separated sweep collision against the block oracle.
//!
//! A move is resolved one axis at a time (Y, then X, then Z).  For each axis
//! the box is swept through the voxel layers it would enter, and the
//! displacement is clamped to the face of the first layer containing a solid
//! block that overlaps the box on the other two axes.  Faces that merely touch
//! the box are not collisions.

use blockpilot_types::{BlockOracle, Vec3};

use crate::aabb::Aabb;

/// Tolerance used for face contact and "did the axis get clamped" decisions.
pub const EPSILON: f64 = 1e-7;

/// Resolution order of the axes.
const AXIS_ORDER: [usize; 3] = [1, 0, 2];

/// Inclusive range of voxel indices that overlap `[min, max]` with positive
/// length.
fn cell_range(min: f64, max: f64) -> (i32, i32) {
    (
        (min + EPSILON).floor() as i32,
        (max - EPSILON).ceil() as i32 - 1,
    )
}

fn other_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

fn layer_blocked(
    oracle: &dyn BlockOracle,
    axis: usize,
    layer: i32,
    first: (usize, (i32, i32)),
    second: (usize, (i32, i32)),
) -> bool {
    let (a1, (lo1, hi1)) = first;
    let (a2, (lo2, hi2)) = second;
    for i in lo1..=hi1 {
        for j in lo2..=hi2 {
            let mut cell = [0i32; 3];
            cell[axis] = layer;
            cell[a1] = i;
            cell[a2] = j;
            if oracle.is_solid(cell[0], cell[1], cell[2]) {
                return true;
            }
        }
    }
    false
}

/// How far `aabb` may travel along `axis` when it asks for `delta`.
///
/// The result has the same sign as `delta` and a magnitude no greater than it.
pub fn sweep_axis(oracle: &dyn BlockOracle, aabb: &Aabb, axis: usize, delta: f64) -> f64 {
    if delta.abs() < EPSILON {
        return delta;
    }
    let (a1, a2) = other_axes(axis);
    let first = (a1, cell_range(aabb.min.axis(a1), aabb.max.axis(a1)));
    let second = (a2, cell_range(aabb.min.axis(a2), aabb.max.axis(a2)));

    if delta > 0.0 {
        let edge = aabb.max.axis(axis);
        let from = (edge - EPSILON).ceil() as i32;
        let to = (edge + delta - EPSILON).ceil() as i32 - 1;
        for layer in from..=to {
            if layer_blocked(oracle, axis, layer, first, second) {
                let allowed = (layer as f64 - edge).max(0.0);
                return if allowed < EPSILON { 0.0 } else { allowed };
            }
        }
    } else {
        let edge = aabb.min.axis(axis);
        let from = (edge + EPSILON).floor() as i32 - 1;
        let to = (edge + delta + EPSILON).floor() as i32;
        for layer in (to..=from).rev() {
            if layer_blocked(oracle, axis, layer, first, second) {
                let allowed = ((layer + 1) as f64 - edge).min(0.0);
                return if allowed > -EPSILON { 0.0 } else { allowed };
            }
        }
    }
    delta
}

/// Resolve a whole displacement, returning what was actually travelled.
///
/// Without an oracle nothing collides.
pub fn resolve_move(oracle: Option<&dyn BlockOracle>, aabb: Aabb, delta: Vec3) -> Vec3 {
    let Some(oracle) = oracle else {
        return delta;
    };
    let mut moved = Vec3::ZERO;
    let mut current = aabb;
    for axis in AXIS_ORDER {
        let d = sweep_axis(oracle, &current, axis, delta.axis(axis));
        current = current.offset_axis(axis, d);
        moved.set_axis(axis, d);
    }
    moved
}

/// True when any solid voxel overlaps `aabb`.
pub fn any_solid(oracle: &dyn BlockOracle, aabb: &Aabb) -> bool {
    let (x0, x1) = cell_range(aabb.min.x, aabb.max.x);
    let (y0, y1) = cell_range(aabb.min.y, aabb.max.y);
    let (z0, z1) = cell_range(aabb.min.z, aabb.max.z);
    for x in x0..=x1 {
        for y in y0..=y1 {
            for z in z0..=z1 {
                if oracle.is_solid(x, y, z) {
                    return true;
                }
            }
        }
    }
    false
}

/// Probe a thin slab of depth `probe` directly under the feet.
pub fn probe_ground(oracle: Option<&dyn BlockOracle>, feet: Vec3, half_width: f64, probe: f64) -> bool {
    let Some(oracle) = oracle else {
        return false;
    };
    let slab = Aabb {
        min: Vec3::new(feet.x - half_width, feet.y - probe, feet.z - half_width),
        max: Vec3::new(feet.x + half_width, feet.y, feet.z + half_width),
    };
    any_solid(oracle, &slab)
}
