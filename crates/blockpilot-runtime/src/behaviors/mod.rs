//! The stock behaviors and what they share.
//!
//! Every behavior here implements [`Behavior`][blockpilot_kernel::Behavior]:
//! it waits for a snapshot, emits a partial actuation for its granted
//! channels, and repeats until it is done or cancelled.
//!
//! | Behavior | Channels | Needs oracle |
//! |---|---|---|
//! | [`Idle`] | legs, head | no |
//! | [`GoTo`] | legs, head | yes |
//! | [`Follow`] | legs, head | yes |
//! | [`LookAt`] | head | no |
//! | [`Attack`] | all | yes |
//! | [`Mine`] | all | yes |
//! | [`PlaceBlock`] | all | yes |
//! | [`UseItem`] | hands | no |
//! | [`SwitchSlot`] | hands | no |

pub mod aim;
pub mod attack;
pub mod follow;
pub mod goto;
pub mod hands;
pub mod idle;
pub mod look;
pub mod mine;
pub mod place;

use std::sync::Arc;

use blockpilot_nav::{NavConfig, NavStep, Navigator};
use blockpilot_types::{
    BlockOracle, BlockPos, BotError, HandsActuation, HeadActuation, LegsActuation,
    PartialActuation, Vec3,
};
use serde::{Deserialize, Serialize};

pub use attack::Attack;
pub use follow::Follow;
pub use goto::GoTo;
pub use hands::{SwitchSlot, UseItem};
pub use idle::Idle;
pub use look::{LookAt, LookTarget};
pub use mine::{Digger, Mine};
pub use place::PlaceBlock;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning shared by the behaviors.  Distances in blocks, durations in ticks,
/// angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub attack_range: f64,
    pub attack_cooldown: u32,
    pub reach: f64,
    pub dig_ticks: u32,
    pub mine_timeout: u32,
    pub place_interval: u32,
    pub place_timeout: u32,
    pub look_tolerance: f64,
    pub look_budget: u32,
    pub max_turn: f64,
    pub follow_distance: f64,
    pub idle_turn_rate: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            attack_range: 2.8,
            attack_cooldown: 10,
            reach: 4.5,
            dig_ticks: 20,
            mine_timeout: 1200,
            place_interval: 8,
            place_timeout: 80,
            look_tolerance: 3.0,
            look_budget: 100,
            max_turn: 45.0,
            follow_distance: 2.0,
            idle_turn_rate: 4.0,
        }
    }
}

/// Everything a behavior constructor may need.
#[derive(Clone, Default)]
pub struct BehaviorEnv {
    pub oracle: Option<Arc<dyn BlockOracle>>,
    pub behavior: BehaviorConfig,
    pub nav: NavConfig,
    /// Seed for [`Idle`]; `None` seeds from the OS.
    pub idle_seed: Option<u64>,
}

impl BehaviorEnv {
    pub fn new(oracle: Option<Arc<dyn BlockOracle>>) -> Self {
        Self {
            oracle,
            ..Default::default()
        }
    }

    /// The block oracle, or [`BotError::MissingBlockOracle`].
    pub fn require_oracle(&self) -> Result<Arc<dyn BlockOracle>, BotError> {
        self.oracle.clone().ok_or(BotError::MissingBlockOracle)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Release every movement key and look at `(yaw, pitch)`.
pub(crate) fn stand_looking(yaw: f64, pitch: f64) -> PartialActuation {
    PartialActuation {
        legs: LegsActuation::stop(),
        head: HeadActuation::look(yaw, pitch),
        hands: HandsActuation::default(),
    }
}

/// A navigator whose target can move.
pub(crate) struct Approach {
    config: NavConfig,
    nav: Option<Navigator>,
}

impl Approach {
    pub(crate) fn new(config: NavConfig) -> Self {
        Self { config, nav: None }
    }

    pub(crate) fn target(&self) -> Option<BlockPos> {
        self.nav.as_ref().map(|n| n.target())
    }

    pub(crate) fn toward(&mut self, cell: BlockPos) {
        match &mut self.nav {
            Some(nav) => nav.set_target(cell),
            None => self.nav = Some(Navigator::new(cell, self.config)),
        }
    }

    pub(crate) fn arrived(&self, position: Vec3) -> bool {
        self.nav.as_ref().is_some_and(|n| n.arrived(position))
    }

    pub(crate) fn clear(&mut self) {
        self.nav = None;
    }

    /// Step toward the current target.  Without one the agent counts as
    /// arrived.
    pub(crate) fn step(&mut self, position: Vec3, oracle: &dyn BlockOracle) -> Result<NavStep, BotError> {
        match &mut self.nav {
            Some(nav) => nav.step(position, oracle),
            None => Ok(NavStep::Arrived),
        }
    }
}
