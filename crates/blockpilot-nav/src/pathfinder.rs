//! Grid A* over standable voxel cells.
//!
//! Nodes are walkable cells (see [`crate::walkability`]).  From each node the
//! four cardinal neighbours are tried at the same height, as a one-block step
//! up, or as a drop of up to three blocks.  When the goal cannot be reached the
//! search returns the best partial path it found, so callers can keep moving
//! toward the target and replan from closer in.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use blockpilot_types::{BlockOracle, BlockPos};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::walkability::{is_walkable, nearest_walkable, normalize};

/// Default cap on expanded nodes per search.
pub const DEFAULT_MAX_NODES: usize = 20_000;

const STEP_COST: u32 = 10;
const UP_PENALTY: u32 = 8;
const DOWN_PENALTY: u32 = 4;
const MAX_DROP: i32 = 3;
/// Radius of the cube searched when the goal itself is not standable.
const GOAL_FALLBACK_RADIUS: i32 = 2;

const CARDINALS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Outcome of one search.  `complete` is true only when the last waypoint is
/// the (normalised) goal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathResult {
    pub waypoints: Vec<BlockPos>,
    pub complete: bool,
}

impl PathResult {
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn last(&self) -> Option<BlockPos> {
        self.waypoints.last().copied()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Open list
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: u32,
    g: u32,
    tie: u64,
    pos: BlockPos,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, u64) {
        (self.f, self.g, self.tie)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key().cmp(&self.key())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pathfinder
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Pathfinder {
    max_nodes: usize,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NODES)
    }
}

impl Pathfinder {
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes }
    }

    /// Search from `start` to `goal`, never leaving the Chebyshev radius
    /// `max_radius` around the normalised start.
    pub fn search(
        &self,
        start: BlockPos,
        goal: BlockPos,
        oracle: Option<&dyn BlockOracle>,
        max_radius: i32,
    ) -> PathResult {
        let Some(oracle) = oracle else {
            return PathResult::default();
        };
        let Some(start) = normalize(oracle, start) else {
            debug!(%start, "path search: start is not standable");
            return PathResult::default();
        };
        let goal = normalize(oracle, goal)
            .or_else(|| nearest_walkable(oracle, goal, GOAL_FALLBACK_RADIUS, start))
            .unwrap_or(goal);

        let mut open = BinaryHeap::new();
        let mut g_score: HashMap<BlockPos, u32> = HashMap::new();
        let mut came_from: HashMap<BlockPos, BlockPos> = HashMap::new();
        let mut closed: HashSet<BlockPos> = HashSet::new();
        let mut tie: u64 = 0;

        let h0 = heuristic(start, goal);
        g_score.insert(start, 0);
        open.push(OpenNode {
            f: h0,
            g: 0,
            tie,
            pos: start,
        });
        tie += 1;

        // (h, g, pos) of the expanded node closest to the goal.
        let mut best = (h0, 0, start);

        while let Some(node) = open.pop() {
            if node.pos == goal {
                let waypoints = reconstruct(&came_from, goal);
                debug!(%start, %goal, len = waypoints.len(), expanded = closed.len(), "path found");
                return PathResult {
                    waypoints,
                    complete: true,
                };
            }
            if g_score.get(&node.pos).is_some_and(|g| node.g > *g) {
                // Stale heap entry.
                continue;
            }
            if !closed.insert(node.pos) {
                continue;
            }
            if closed.len() > self.max_nodes {
                debug!(max_nodes = self.max_nodes, "path search: node budget spent");
                break;
            }

            let h = heuristic(node.pos, goal);
            if (h, node.g) < (best.0, best.1) {
                best = (h, node.g, node.pos);
            }

            for (next, cost) in successors(oracle, node.pos) {
                if next.chebyshev(start) > max_radius || closed.contains(&next) {
                    continue;
                }
                let g = node.g + cost;
                if g < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                    g_score.insert(next, g);
                    came_from.insert(next, node.pos);
                    open.push(OpenNode {
                        f: g.saturating_add(heuristic(next, goal)),
                        g,
                        tie,
                        pos: next,
                    });
                    tie += 1;
                }
            }
        }

        let (_, _, closest) = best;
        if closest == start {
            debug!(%start, %goal, "path search: no progress possible");
            return PathResult::default();
        }
        let waypoints = reconstruct(&came_from, closest);
        debug!(%start, %goal, %closest, len = waypoints.len(), "partial path");
        PathResult {
            waypoints,
            complete: false,
        }
    }
}

/// Admissible-ish estimate: vertical moves count double.  Saturates for
/// cells far enough apart to overflow `u32`.
pub fn heuristic(a: BlockPos, b: BlockPos) -> u32 {
    let dx = u64::from(a.x.abs_diff(b.x));
    let dy = u64::from(a.y.abs_diff(b.y));
    let dz = u64::from(a.z.abs_diff(b.z));
    let h = u64::from(STEP_COST) * (dx + dz + 2 * dy);
    u32::try_from(h).unwrap_or(u32::MAX)
}

/// Standable neighbours of `pos` and the cost of moving there.
fn successors(oracle: &dyn BlockOracle, pos: BlockPos) -> Vec<(BlockPos, u32)> {
    let mut out = Vec::with_capacity(4);
    let headroom = !oracle.is_solid_at(pos.offset(0, 2, 0));

    for (dx, dz) in CARDINALS {
        let side = pos.offset(dx, 0, dz);
        if is_walkable(oracle, side) {
            out.push((side, STEP_COST));
            continue;
        }
        let up = side.up();
        if headroom && is_walkable(oracle, up) {
            out.push((up, STEP_COST + UP_PENALTY));
            continue;
        }
        if oracle.is_solid_at(side) || oracle.is_solid_at(side.up()) {
            continue;
        }
        for depth in 1..=MAX_DROP {
            let below = side.offset(0, -depth, 0);
            if oracle.is_solid_at(below) {
                break;
            }
            if is_walkable(oracle, below) {
                out.push((below, STEP_COST + DOWN_PENALTY));
                break;
            }
        }
    }
    out
}

fn reconstruct(came_from: &HashMap<BlockPos, BlockPos>, end: BlockPos) -> Vec<BlockPos> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(prev) = came_from.get(&current) {
        path.push(*prev);
        current = *prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpilot_physics::SimWorld;

    fn assert_connected(path: &[BlockPos]) {
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!((a.x - b.x).abs() + (a.z - b.z).abs(), 1, "{a} -> {b}");
            assert!((a.y - b.y).abs() <= MAX_DROP, "{a} -> {b}");
        }
    }

    #[test]
    fn straight_path_both_ways() {
        let world = SimWorld::flat(0);
        let finder = Pathfinder::default();
        let a = BlockPos::new(0, 1, 0);
        let b = BlockPos::new(6, 1, 3);

        let there = finder.search(a, b, Some(&world), 32);
        let back = finder.search(b, a, Some(&world), 32);
        assert!(there.complete && back.complete);
        assert_eq!(there.waypoints.first(), Some(&a));
        assert_eq!(there.last(), Some(b));
        assert_eq!(back.last(), Some(a));
        assert_eq!(there.waypoints.len(), 10);
        assert_eq!(back.waypoints.len(), there.waypoints.len());
        assert_connected(&there.waypoints);
    }

    #[test]
    fn detours_around_a_wall() {
        let world = SimWorld::flat(0).with_fill(BlockPos::new(2, 1, -1), BlockPos::new(2, 3, 1), "stone");
        let path = Pathfinder::default().search(
            BlockPos::new(0, 1, 0),
            BlockPos::new(5, 1, 0),
            Some(&world),
            16,
        );
        assert!(path.complete);
        assert_eq!(path.waypoints.first(), Some(&BlockPos::new(0, 1, 0)));
        assert_eq!(path.last(), Some(BlockPos::new(5, 1, 0)));
        assert_connected(&path.waypoints);
        assert!(path.waypoints.iter().all(|p| !(p.x == 2 && p.z.abs() <= 1)));
        assert!(path.waypoints.iter().any(|p| p.z != 0));
    }

    #[test]
    fn heuristic_saturates_for_far_cells() {
        let far = heuristic(BlockPos::new(-1_000_000_000, 0, 0), BlockPos::new(1_000_000_000, 0, 0));
        assert_eq!(far, u32::MAX);
        let extreme = heuristic(BlockPos::new(i32::MIN, i32::MIN, i32::MIN), BlockPos::new(i32::MAX, i32::MAX, i32::MAX));
        assert_eq!(extreme, u32::MAX);
        assert_eq!(heuristic(BlockPos::new(0, 1, 0), BlockPos::new(3, 2, -1)), 60);
    }

    #[test]
    fn distant_goal_yields_a_partial_path() {
        let world = SimWorld::flat(0);
        let start = BlockPos::new(0, 1, 0);
        let path = Pathfinder::default().search(start, BlockPos::new(1_000_000_000, 1, 0), Some(&world), 8);
        assert!(!path.complete);
        assert_eq!(path.last(), Some(BlockPos::new(8, 1, 0)));
    }

    #[test]
    fn partial_path_stays_inside_radius() {
        let world = SimWorld::flat(0);
        let start = BlockPos::new(0, 1, 0);
        let path = Pathfinder::default().search(start, BlockPos::new(100, 1, 0), Some(&world), 10);
        assert!(!path.complete);
        assert!(path.waypoints.iter().all(|p| p.chebyshev(start) <= 10));
        assert_eq!(path.last(), Some(BlockPos::new(10, 1, 0)));
    }

    #[test]
    fn steps_up_onto_a_platform() {
        let world = SimWorld::flat(0).with_fill(BlockPos::new(2, 1, -2), BlockPos::new(6, 1, 2), "stone");
        let path = Pathfinder::default().search(
            BlockPos::new(0, 1, 0),
            BlockPos::new(4, 2, 0),
            Some(&world),
            16,
        );
        assert!(path.complete);
        assert_connected(&path.waypoints);
        assert!(path.waypoints.contains(&BlockPos::new(2, 2, 0)));
    }

    #[test]
    fn drops_off_a_two_block_ledge() {
        let world = SimWorld::flat(0).with_fill(BlockPos::new(-4, 1, -2), BlockPos::new(0, 2, 2), "stone");
        let path = Pathfinder::default().search(
            BlockPos::new(0, 3, 0),
            BlockPos::new(3, 1, 0),
            Some(&world),
            16,
        );
        assert!(path.complete);
        assert_eq!(path.waypoints[..2], [BlockPos::new(0, 3, 0), BlockPos::new(1, 1, 0)]);
    }

    #[test]
    fn cannot_climb_two_blocks() {
        let world = SimWorld::flat(0).with_fill(BlockPos::new(2, 1, -20), BlockPos::new(40, 2, 20), "stone");
        let path = Pathfinder::default().search(
            BlockPos::new(0, 1, 0),
            BlockPos::new(5, 3, 0),
            Some(&world),
            8,
        );
        assert!(!path.complete);
        assert!(path.waypoints.iter().all(|p| p.y == 1));
    }

    #[test]
    fn unstandable_start_or_missing_oracle_is_empty() {
        let world = SimWorld::new();
        let finder = Pathfinder::default();
        let result = finder.search(BlockPos::new(0, 10, 0), BlockPos::new(3, 10, 0), Some(&world), 8);
        assert_eq!(result, PathResult::default());
        let result = finder.search(BlockPos::new(0, 1, 0), BlockPos::new(3, 1, 0), None, 8);
        assert!(result.is_empty() && !result.complete);
    }

    #[test]
    fn buried_goal_falls_back_to_nearby_cell() {
        let world = SimWorld::flat(0).with_fill(BlockPos::new(5, 1, -1), BlockPos::new(7, 6, 1), "stone");
        let path = Pathfinder::default().search(
            BlockPos::new(0, 1, 0),
            BlockPos::new(6, 3, 0),
            Some(&world),
            16,
        );
        assert!(path.complete);
        assert_eq!(path.last(), Some(BlockPos::new(4, 1, 0)));
    }

    #[test]
    fn goal_equal_to_start() {
        let world = SimWorld::flat(0);
        let path = Pathfinder::default().search(BlockPos::new(1, 1, 1), BlockPos::new(1, 1, 1), Some(&world), 4);
        assert!(path.complete);
        assert_eq!(path.waypoints, vec![BlockPos::new(1, 1, 1)]);
    }
}
