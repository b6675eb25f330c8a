//! Where an agent can stand.

use blockpilot_types::{BlockOracle, BlockPos, Vec3};

/// A cell is walkable when it and the cell above are open and the cell below
/// is solid.
pub fn is_walkable(oracle: &dyn BlockOracle, pos: BlockPos) -> bool {
    !oracle.is_solid_at(pos) && !oracle.is_solid_at(pos.up()) && oracle.is_solid_at(pos.down())
}

/// Snap `pos` to a nearby walkable cell: the cell itself, then up to two cells
/// up, then up to three cells down.
pub fn normalize(oracle: &dyn BlockOracle, pos: BlockPos) -> Option<BlockPos> {
    [0, 1, 2, -1, -2, -3]
        .into_iter()
        .map(|dy| pos.offset(0, dy, 0))
        .find(|candidate| is_walkable(oracle, *candidate))
}

/// The walkable cell within a cube of `radius` around `center` that is closest
/// to `toward`.  Ties keep the first cell in x, y, z scan order.
pub fn nearest_walkable(
    oracle: &dyn BlockOracle,
    center: BlockPos,
    radius: i32,
    toward: BlockPos,
) -> Option<BlockPos> {
    let mut best: Option<(f64, BlockPos)> = None;
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            for dz in -radius..=radius {
                let candidate = center.offset(dx, dy, dz);
                if !is_walkable(oracle, candidate) {
                    continue;
                }
                let d = candidate.distance(toward);
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, candidate));
                }
            }
        }
    }
    best.map(|(_, pos)| pos)
}

/// Pick a walkable cell to stand in while working on `focus`.
///
/// Candidates lie within `radius` (horizontal) of `focus`, from three cells
/// below to two cells above it, and are not listed in `exclude`.  The one
/// nearest `from` wins.
pub fn approach_cell(
    oracle: &dyn BlockOracle,
    focus: Vec3,
    radius: f64,
    from: Vec3,
    exclude: &[BlockPos],
) -> Option<BlockPos> {
    let center = BlockPos::containing(focus);
    let r = radius.ceil() as i32;
    let mut best: Option<(f64, BlockPos)> = None;
    for dx in -r..=r {
        for dz in -r..=r {
            for dy in -3..=2 {
                let candidate = center.offset(dx, dy, dz);
                let feet = candidate.foot_center();
                if feet.horizontal_distance(focus) > radius || exclude.contains(&candidate) {
                    continue;
                }
                if !is_walkable(oracle, candidate) {
                    continue;
                }
                let d = feet.distance(from);
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, candidate));
                }
            }
        }
    }
    best.map(|(_, pos)| pos)
}
