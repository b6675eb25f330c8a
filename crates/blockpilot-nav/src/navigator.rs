//! [`Navigator`] – per-tick steering toward a target cell.
//!
//! The navigator owns the current path and decides, each tick, whether it is
//! still usable.  Replanning is rate-limited by a cooldown, and a
//! [`StallGuard`] ends navigation toward targets that repeated partial paths
//! never get closer to.

use blockpilot_types::{BlockOracle, BlockPos, BotError, HeadActuation, LegsActuation, PartialActuation, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pathfinder::{DEFAULT_MAX_NODES, Pathfinder};
use crate::stall_guard::StallGuard;
use crate::walkability::{is_walkable, normalize};

/// Maximum height difference for a waypoint to count as reached.
const ARRIVAL_HEIGHT: f64 = 1.0;
/// Jump when the next waypoint is this far above the feet...
const JUMP_RISE: f64 = 0.5;
/// ...and horizontally closer than this.
const JUMP_REACH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Horizontal distance at which a cell counts as reached.
    pub arrival_radius: f64,
    /// Ticks without displacement before the path is abandoned.
    pub stuck_ticks: u32,
    /// Horizontal displacement per tick below which the agent counts as stuck.
    pub stuck_epsilon: f64,
    /// Minimum ticks between two searches.
    pub replan_cooldown: u32,
    /// Non-improving partial replans tolerated before giving up.
    pub stall_limit: u32,
    /// Chebyshev radius of each search.
    pub search_radius: i32,
    pub max_nodes: usize,
    pub sprint: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            arrival_radius: 0.5,
            stuck_ticks: 10,
            stuck_epsilon: 0.02,
            replan_cooldown: 4,
            stall_limit: 3,
            search_radius: 48,
            max_nodes: DEFAULT_MAX_NODES,
            sprint: false,
        }
    }
}

/// Movement for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Degrees, same convention as the body.
    pub yaw: f64,
    pub forward: bool,
    pub jump: bool,
    pub sprint: bool,
}

impl Steering {
    /// Legs and head updates that carry out this steering.  Every movement key
    /// is set explicitly so stale keys never linger in the frame.
    pub fn actuation(&self) -> PartialActuation {
        PartialActuation {
            legs: LegsActuation {
                forward: Some(self.forward),
                jump: Some(self.jump),
                sprint: Some(self.sprint && self.forward),
                ..LegsActuation::stop()
            },
            head: HeadActuation {
                yaw: Some(self.yaw),
                pitch: None,
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavStep {
    Arrived,
    Steer(Steering),
}

/// Yaw in degrees that faces from `from` toward `to`.
pub fn yaw_toward(from: Vec3, to: Vec3) -> f64 {
    (-(to.x - from.x)).atan2(to.z - from.z).to_degrees()
}

pub struct Navigator {
    config: NavConfig,
    pathfinder: Pathfinder,
    target: BlockPos,
    resolved: bool,
    path: Vec<BlockPos>,
    cursor: usize,
    cooldown: u32,
    stuck: u32,
    last_position: Option<Vec3>,
    stall: StallGuard,
    replans: u32,
}

impl Navigator {
    pub fn new(target: BlockPos, config: NavConfig) -> Self {
        Self {
            pathfinder: Pathfinder::new(config.max_nodes),
            target,
            resolved: false,
            path: Vec::new(),
            cursor: 0,
            cooldown: 0,
            stuck: 0,
            last_position: None,
            stall: StallGuard::new(config.stall_limit),
            replans: 0,
            config,
        }
    }

    pub fn target(&self) -> BlockPos {
        self.target
    }

    /// Point at a new target.  Discards the path and all progress tracking.
    pub fn set_target(&mut self, target: BlockPos) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.resolved = false;
        self.path.clear();
        self.cursor = 0;
        self.cooldown = 0;
        self.stuck = 0;
        self.stall.reset();
    }

    pub fn replans(&self) -> u32 {
        self.replans
    }

    pub fn path(&self) -> &[BlockPos] {
        &self.path
    }

    /// True when `position` is within the arrival radius of the target.
    pub fn arrived(&self, position: Vec3) -> bool {
        self.within(position, self.target)
    }

    /// Decide this tick's movement.
    ///
    /// # Errors
    ///
    /// [`BotError::Unreachable`] once the stall limit is reached.
    pub fn step(&mut self, position: Vec3, oracle: &dyn BlockOracle) -> Result<NavStep, BotError> {
        if !self.resolved {
            // A target given as the ground block resolves to the cell above it.
            if let Some(standable) = normalize(oracle, self.target) {
                self.target = standable;
            }
            self.resolved = true;
        }
        if self.arrived(position) {
            return Ok(NavStep::Arrived);
        }

        match self.last_position {
            Some(last) if position.horizontal_distance(last) > self.config.stuck_epsilon => {
                self.stuck = 0;
            }
            Some(_) => self.stuck += 1,
            None => {}
        }
        self.last_position = Some(position);
        self.cooldown = self.cooldown.saturating_sub(1);

        if self.needs_replan(oracle) && self.cooldown == 0 {
            self.replan(position, oracle)?;
        }

        while self.cursor < self.path.len() && self.within(position, self.path[self.cursor]) {
            self.cursor += 1;
        }

        let Some(next) = self.path.get(self.cursor).copied() else {
            return Ok(NavStep::Steer(Steering {
                yaw: yaw_toward(position, self.target.foot_center()),
                forward: false,
                jump: false,
                sprint: false,
            }));
        };

        let aim = next.foot_center();
        let horizontal = position.horizontal_distance(aim);
        Ok(NavStep::Steer(Steering {
            yaw: yaw_toward(position, aim),
            forward: horizontal >= self.config.arrival_radius,
            jump: next.y as f64 > position.y + JUMP_RISE && horizontal < JUMP_REACH,
            sprint: self.config.sprint,
        }))
    }

    fn needs_replan(&self, oracle: &dyn BlockOracle) -> bool {
        match self.path.get(self.cursor) {
            None => true,
            Some(next) => self.stuck >= self.config.stuck_ticks || !is_walkable(oracle, *next),
        }
    }

    fn replan(&mut self, position: Vec3, oracle: &dyn BlockOracle) -> Result<(), BotError> {
        let from = BlockPos::containing(position);
        let result = self
            .pathfinder
            .search(from, self.target, Some(oracle), self.config.search_radius);
        self.replans += 1;
        self.cooldown = self.config.replan_cooldown;
        self.stuck = 0;

        // A complete path to a stand-in cell (the target itself is not
        // standable) still has to earn its keep against the stall limit.
        let endpoint = result.last().unwrap_or(from);
        if result.complete && endpoint == self.target {
            self.stall.reset();
        } else {
            let remaining = endpoint.foot_center().distance(self.target.foot_center());
            if self.stall.record(remaining) {
                info!(goal = %self.target, replans = self.replans, "navigation stalled");
                return Err(BotError::Unreachable {
                    target: self.target,
                });
            }
        }
        debug!(
            from = %from,
            goal = %self.target,
            len = result.waypoints.len(),
            complete = result.complete,
            "replanned"
        );
        self.path = result.waypoints;
        self.cursor = 0;
        Ok(())
    }

    fn within(&self, position: Vec3, cell: BlockPos) -> bool {
        let feet = cell.foot_center();
        position.horizontal_distance(feet) < self.config.arrival_radius
            && (position.y - feet.y).abs() < ARRIVAL_HEIGHT
    }
}
