//! In-memory voxel world for tests and headless demos.
//!
//! [`SimWorld`] implements [`BlockOracle`] over a sparse block map with an
//! optional infinite floor layer.  It also understands the hand pulses of an
//! [`InputFrame`], so digging and placing can be exercised end to end without a
//! game server.
//!
//! # Example
//!
//! ```rust
//! use blockpilot_physics::SimWorld;
//! use blockpilot_types::{BlockOracle, BlockPos};
//!
//! let world = SimWorld::new()
//!     .with_floor(0)
//!     .with_solid(BlockPos::new(3, 1, 0));
//!
//! assert!(world.is_solid(10, 0, -4));
//! assert!(world.is_solid(3, 1, 0));
//! assert!(!world.is_solid(3, 2, 0));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use blockpilot_types::{BlockOracle, BlockPos, BreakStage, InputFrame, is_air_name};
use tracing::debug;

const AIR: u32 = 0;
const STONE: u32 = 1;

/// Sparse block store.  Explicit entries override the floor layer.
pub struct SimWorld {
    blocks: RwLock<HashMap<BlockPos, u32>>,
    unloaded: RwLock<HashSet<BlockPos>>,
    palette: RwLock<Vec<String>>,
    floor: Option<i32>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// An empty world: air everywhere.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
            unloaded: RwLock::new(HashSet::new()),
            palette: RwLock::new(vec!["air".to_string(), "stone".to_string()]),
            floor: None,
        }
    }

    /// Stone at every cell with `y == floor_y`.
    pub fn flat(floor_y: i32) -> Self {
        Self::new().with_floor(floor_y)
    }

    pub fn with_floor(mut self, floor_y: i32) -> Self {
        self.floor = Some(floor_y);
        self
    }

    pub fn with_solid(self, pos: BlockPos) -> Self {
        self.set_solid(pos);
        self
    }

    pub fn with_block(self, pos: BlockPos, name: &str) -> Self {
        self.set_block(pos, name);
        self
    }

    /// Fill the inclusive box spanned by `a` and `b` with `name`.
    pub fn with_fill(self, a: BlockPos, b: BlockPos, name: &str) -> Self {
        self.fill(a, b, name);
        self
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    pub fn set_block(&self, pos: BlockPos, name: &str) {
        let id = self.state_for(name);
        write(&self.blocks).insert(pos, id);
        write(&self.unloaded).remove(&pos);
    }

    pub fn set_solid(&self, pos: BlockPos) {
        write(&self.blocks).insert(pos, STONE);
        write(&self.unloaded).remove(&pos);
    }

    pub fn clear_block(&self, pos: BlockPos) {
        write(&self.blocks).insert(pos, AIR);
        write(&self.unloaded).remove(&pos);
    }

    pub fn fill(&self, a: BlockPos, b: BlockPos, name: &str) {
        let id = self.state_for(name);
        let mut blocks = write(&self.blocks);
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    blocks.insert(BlockPos::new(x, y, z), id);
                }
            }
        }
    }

    /// Make `pos` unknown: not solid and without a state id.
    pub fn unload(&self, pos: BlockPos) {
        write(&self.blocks).remove(&pos);
        write(&self.unloaded).insert(pos);
    }

    /// Name of the block at `pos`, `None` when unloaded.
    pub fn block_at(&self, pos: BlockPos) -> Option<String> {
        let id = self.block_state_id(pos.x, pos.y, pos.z)?;
        self.block_name(id)
    }

    /// Apply the hand pulses of `frame` to the world.
    ///
    /// A `Finish` break turns the target into air; a place target that is
    /// currently air becomes stone.  Returns true when any block changed.
    pub fn apply_hands(&self, frame: &InputFrame) -> bool {
        let mut changed = false;
        if let Some(target) = frame.break_target
            && target.stage == BreakStage::Finish
            && self.is_solid_at(target.pos)
        {
            debug!(pos = %target.pos, "sim: block broken");
            self.clear_block(target.pos);
            changed = true;
        }
        if let Some(target) = frame.place_target
            && !self.is_solid_at(target.pos)
        {
            debug!(pos = %target.pos, face = ?target.face, "sim: block placed");
            self.set_solid(target.pos);
            changed = true;
        }
        changed
    }

    fn state_for(&self, name: &str) -> u32 {
        let mut palette = write(&self.palette);
        if let Some(i) = palette.iter().position(|n| n == name) {
            return i as u32;
        }
        palette.push(name.to_string());
        (palette.len() - 1) as u32
    }

    fn lookup(&self, pos: BlockPos) -> Option<u32> {
        if read(&self.unloaded).contains(&pos) {
            return None;
        }
        if let Some(id) = read(&self.blocks).get(&pos) {
            return Some(*id);
        }
        match self.floor {
            Some(y) if pos.y == y => Some(STONE),
            _ => Some(AIR),
        }
    }
}

impl BlockOracle for SimWorld {
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        match self.lookup(BlockPos::new(x, y, z)) {
            Some(id) => self
                .block_name(id)
                .is_some_and(|name| !is_air_name(&name)),
            None => false,
        }
    }

    fn block_state_id(&self, x: i32, y: i32, z: i32) -> Option<u32> {
        self.lookup(BlockPos::new(x, y, z))
    }

    fn block_name(&self, state_id: u32) -> Option<String> {
        read(&self.palette).get(state_id as usize).cloned()
    }
}

// A poisoned lock only means a test panicked mid-write; the map is still usable.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
