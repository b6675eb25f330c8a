//! What the core reads about the world: snapshots and the block oracle.

use serde::{Deserialize, Serialize};

use crate::geometry::{BlockPos, Vec3};

/// Protocol-level entity identifier.
pub type EntityId = i32;

/// Height of the player's eyes above its feet.
pub const EYE_HEIGHT: f64 = 1.62;

/// A nearby entity as reported by the snapshot source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub id: EntityId,
    #[serde(default)]
    pub kind: String,
    /// Feet position.
    pub position: Vec3,
    #[serde(default = "default_entity_width")]
    pub width: f64,
    #[serde(default = "default_entity_height")]
    pub height: f64,
}

fn default_entity_width() -> f64 {
    0.6
}

fn default_entity_height() -> f64 {
    1.8
}

impl EntityInfo {
    pub fn new(id: EntityId, position: Vec3) -> Self {
        Self {
            id,
            kind: String::new(),
            position,
            width: default_entity_width(),
            height: default_entity_height(),
        }
    }

    /// Centre of the entity's bounding box.
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.height * 0.5, 0.0)
    }
}

/// Everything a behavior sees for one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f64,
    pub pitch: f64,
    pub grounded: bool,
    #[serde(default)]
    pub selected_slot: u8,
    #[serde(default)]
    pub entities: Vec<EntityInfo>,
}

impl WorldSnapshot {
    pub fn entity(&self, id: EntityId) -> Option<&EntityInfo> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, EYE_HEIGHT, 0.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block oracle
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only block access supplied by whoever owns the world mirror.
///
/// Unloaded positions report `false` from [`is_solid`][Self::is_solid] and
/// `None` from [`block_state_id`][Self::block_state_id].
pub trait BlockOracle: Send + Sync {
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool;

    fn block_state_id(&self, x: i32, y: i32, z: i32) -> Option<u32>;

    fn block_name(&self, state_id: u32) -> Option<String>;

    fn is_solid_at(&self, pos: BlockPos) -> bool {
        self.is_solid(pos.x, pos.y, pos.z)
    }
}

/// True for every spelling of the air blocks: `air`, `cave_air`, `void_air`,
/// with spaces instead of underscores, optionally namespaced.
pub fn is_air_name(name: &str) -> bool {
    let bare = name.rsplit(':').next().unwrap_or(name);
    let normalized = bare.trim().to_ascii_lowercase().replace(' ', "_");
    matches!(normalized.as_str(), "air" | "cave_air" | "void_air")
}

/// Whether `pos` currently reads as air.  `None` when the oracle does not know
/// the block (unloaded chunk or unnamed state); callers must not treat that as
/// air.
pub fn read_air(oracle: &dyn BlockOracle, pos: BlockPos) -> Option<bool> {
    let state = oracle.block_state_id(pos.x, pos.y, pos.z)?;
    let name = oracle.block_name(state)?;
    Some(is_air_name(&name))
}
