//! Per-tick body simulation: movement intent, gravity, collision and drag.
//!
//! [`Physics::tick`] is a pure function of the previous [`PhysicsState`], the
//! movement part of the merged frame, the block oracle and nearby entities.
//! The same inputs always produce the same output.

use blockpilot_types::{BlockOracle, EntityInfo, InputFrame, MovementControls, Vec3};
use serde::{Deserialize, Serialize};

use crate::aabb::{Aabb, PLAYER_HALF_WIDTH, PLAYER_HEIGHT};
use crate::collision::{EPSILON, probe_ground, resolve_move, sweep_axis};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Physics constants.  The defaults reproduce the vanilla player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Horizontal speed in blocks per tick while walking.
    pub walk_speed: f64,
    pub sprint_multiplier: f64,
    pub sneak_multiplier: f64,
    /// Subtracted from the vertical velocity every tick.
    pub gravity: f64,
    /// Vertical velocity set by a jump from the ground.
    pub jump_velocity: f64,
    /// Vertical velocity multiplier applied after the move.
    pub vertical_drag: f64,
    /// Horizontal velocity multiplier applied after the move.
    pub horizontal_drag: f64,
    /// Extra horizontal multiplier while grounded.
    pub ground_friction: f64,
    /// Depth of the slab probed under the feet for ground contact.
    pub ground_probe: f64,
    pub half_width: f64,
    pub height: f64,
    /// Largest push a single entity can apply in one tick.
    pub push_per_entity: f64,
    /// Largest total push in one tick.
    pub push_total: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            walk_speed: 0.2158,
            sprint_multiplier: 1.3,
            sneak_multiplier: 0.7,
            gravity: 0.08,
            jump_velocity: 0.42,
            vertical_drag: 0.98,
            horizontal_drag: 0.91,
            ground_friction: 0.6,
            ground_probe: 0.001,
            half_width: PLAYER_HALF_WIDTH,
            height: PLAYER_HEIGHT,
            push_per_entity: 0.08,
            push_total: 0.12,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State and inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Authoritative body state after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhysicsState {
    /// Feet position.
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
}

impl PhysicsState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// The part of an [`InputFrame`] physics cares about.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementInput {
    pub controls: MovementControls,
    /// Degrees; 0 faces +Z, −90 faces +X.
    pub yaw: f64,
}

impl From<&InputFrame> for MovementInput {
    fn from(frame: &InputFrame) -> Self {
        Self {
            controls: frame.controls,
            yaw: frame.yaw,
        }
    }
}

/// A vertical cylinder that pushes the player away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Bottom centre.
    pub position: Vec3,
    pub half_width: f64,
    pub height: f64,
}

impl From<&EntityInfo> for Collider {
    fn from(entity: &EntityInfo) -> Self {
        Self {
            position: entity.position,
            half_width: entity.width * 0.5,
            height: entity.height,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Physics
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct Physics {
    config: PhysicsConfig,
}

impl Physics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advance `state` by one tick.
    pub fn tick(
        &self,
        state: &PhysicsState,
        input: &MovementInput,
        oracle: Option<&dyn BlockOracle>,
        colliders: &[Collider],
    ) -> PhysicsState {
        let cfg = &self.config;
        let mut velocity = state.velocity;

        if let Some((vx, vz)) = self.desired_horizontal(input) {
            velocity.x = vx;
            velocity.z = vz;
        }

        if state.grounded && input.controls.jump {
            velocity.y = cfg.jump_velocity;
        } else {
            velocity.y -= cfg.gravity;
        }

        let body = Aabb::column(state.position, cfg.half_width, cfg.height);
        let moved = resolve_move(oracle, body, velocity);
        for axis in 0..3 {
            if (moved.axis(axis) - velocity.axis(axis)).abs() > EPSILON {
                velocity.set_axis(axis, 0.0);
            }
        }
        let mut position = state.position + moved;
        let grounded = probe_ground(oracle, position, cfg.half_width, cfg.ground_probe);

        velocity.y *= cfg.vertical_drag;
        let horizontal = if grounded {
            cfg.horizontal_drag * cfg.ground_friction
        } else {
            cfg.horizontal_drag
        };
        velocity.x *= horizontal;
        velocity.z *= horizontal;

        if !colliders.is_empty() {
            position = self.push_apart(position, oracle, colliders);
        }

        PhysicsState {
            position,
            velocity,
            grounded,
        }
    }

    /// Push the player at `position` out of overlapping entity cylinders.
    ///
    /// The push is horizontal, capped per entity and in aggregate, and swept
    /// through the oracle so it never ends inside a block.
    pub fn push_apart(
        &self,
        position: Vec3,
        oracle: Option<&dyn BlockOracle>,
        colliders: &[Collider],
    ) -> Vec3 {
        let cfg = &self.config;
        let (mut px, mut pz) = (0.0, 0.0);

        for collider in colliders {
            let overlaps_vertically = position.y < collider.position.y + collider.height
                && position.y + cfg.height > collider.position.y;
            if !overlaps_vertically {
                continue;
            }
            let dx = position.x - collider.position.x;
            let dz = position.z - collider.position.z;
            let distance = dx.hypot(dz);
            let reach = cfg.half_width + collider.half_width;
            if distance >= reach {
                continue;
            }
            let magnitude = (reach - distance).min(cfg.push_per_entity);
            // Coincident centres push along +X.
            let (nx, nz) = if distance < EPSILON {
                (1.0, 0.0)
            } else {
                (dx / distance, dz / distance)
            };
            px += nx * magnitude;
            pz += nz * magnitude;
        }

        let total = px.hypot(pz);
        if total < EPSILON {
            return position;
        }
        if total > cfg.push_total {
            let scale = cfg.push_total / total;
            px *= scale;
            pz *= scale;
        }

        let Some(oracle) = oracle else {
            return position + Vec3::new(px, 0.0, pz);
        };
        let mut body = Aabb::column(position, cfg.half_width, cfg.height);
        let dx = sweep_axis(oracle, &body, 0, px);
        body = body.offset_axis(0, dx);
        let dz = sweep_axis(oracle, &body, 2, pz);
        position + Vec3::new(dx, 0.0, dz)
    }

    fn desired_horizontal(&self, input: &MovementInput) -> Option<(f64, f64)> {
        let c = &input.controls;
        let strafe = axis_value(c.left, c.right);
        let forward = axis_value(c.forward, c.back);
        if strafe == 0.0 && forward == 0.0 {
            return None;
        }
        let norm = strafe.hypot(forward);
        let (strafe, forward) = (strafe / norm, forward / norm);

        let cfg = &self.config;
        let mut speed = cfg.walk_speed;
        if c.sprint {
            speed *= cfg.sprint_multiplier;
        }
        if c.sneak {
            speed *= cfg.sneak_multiplier;
        }
        let speed = speed.max(0.0);

        let (sin, cos) = input.yaw.to_radians().sin_cos();
        let vx = (-sin * forward + cos * strafe) * speed;
        let vz = (cos * forward + sin * strafe) * speed;
        Some((vx, vz))
    }
}

fn axis_value(positive: bool, negative: bool) -> f64 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWorld;
    use blockpilot_types::BlockPos;

    fn walk(yaw: f64) -> MovementInput {
        MovementInput {
            controls: MovementControls {
                forward: true,
                ..Default::default()
            },
            yaw,
        }
    }

    fn standing(x: f64, y: f64, z: f64) -> PhysicsState {
        PhysicsState {
            position: Vec3::new(x, y, z),
            velocity: Vec3::ZERO,
            grounded: true,
        }
    }

    #[test]
    fn free_fall_first_tick() {
        let physics = Physics::default();
        let world = SimWorld::new();
        let next = physics.tick(
            &PhysicsState::at(Vec3::new(0.5, 10.0, 0.5)),
            &MovementInput::default(),
            Some(&world),
            &[],
        );
        assert!((next.position.y - 9.92).abs() < 1e-9);
        assert!((next.velocity.y - (-0.0784)).abs() < 1e-9);
        assert!(!next.grounded);
    }

    #[test]
    fn player_against_wall_does_not_move() {
        let physics = Physics::default();
        let world = SimWorld::flat(-1)
            .with_solid(BlockPos::new(1, 0, 0))
            .with_solid(BlockPos::new(1, 1, 0));
        let mut state = standing(0.7, 0.0, 0.5);
        for _ in 0..20 {
            state = physics.tick(&state, &walk(-90.0), Some(&world), &[]);
            assert_eq!(state.position, Vec3::new(0.7, 0.0, 0.5));
            assert_eq!(state.velocity.x, 0.0);
            assert!(state.grounded);
        }
    }

    #[test]
    fn walking_into_a_step_without_jump_stays_low() {
        let physics = Physics::default();
        let world = SimWorld::flat(-1).with_solid(BlockPos::new(2, 0, 0));
        let mut state = standing(0.5, 0.0, 0.5);
        for _ in 0..20 {
            state = physics.tick(&state, &walk(-90.0), Some(&world), &[]);
            assert!(state.position.y < 0.5);
            // Near face of the step minus the half-width.
            assert!(state.position.x <= 1.7 + 1e-6, "x {}", state.position.x);
        }
        assert!(state.position.x > 1.0);
    }

    #[test]
    fn jump_apex_height() {
        let physics = Physics::default();
        let world = SimWorld::flat(-1);
        let mut state = standing(0.5, 0.0, 0.5);
        let jump = MovementInput {
            controls: MovementControls {
                jump: true,
                ..Default::default()
            },
            yaw: 0.0,
        };
        let mut apex: f64 = 0.0;
        state = physics.tick(&state, &jump, Some(&world), &[]);
        apex = apex.max(state.position.y);
        for _ in 0..40 {
            state = physics.tick(&state, &MovementInput::default(), Some(&world), &[]);
            apex = apex.max(state.position.y);
        }
        assert!(apex > 1.15 && apex < 1.25, "apex {apex}");
        assert!(state.grounded);
        assert_eq!(state.position.y, 0.0);
    }

    #[test]
    fn no_oracle_is_free_flight() {
        let physics = Physics::default();
        let mut state = standing(0.0, 0.0, 0.0);
        for _ in 0..5 {
            state = physics.tick(&state, &MovementInput::default(), None, &[]);
            assert!(!state.grounded);
        }
        assert!(state.position.y < 0.0);
    }

    #[test]
    fn yaw_convention() {
        let physics = Physics::default();
        let next = physics.tick(&standing(0.0, 10.0, 0.0), &walk(0.0), None, &[]);
        assert!(next.position.z > 0.2 && next.position.x.abs() < 1e-9);
        let next = physics.tick(&standing(0.0, 10.0, 0.0), &walk(-90.0), None, &[]);
        assert!(next.position.x > 0.2 && next.position.z.abs() < 1e-9);
    }

    #[test]
    fn sprint_and_sneak_scale_speed() {
        let physics = Physics::default();
        let base = physics.tick(&standing(0.0, 10.0, 0.0), &walk(0.0), None, &[]);
        let mut input = walk(0.0);
        input.controls.sprint = true;
        let sprint = physics.tick(&standing(0.0, 10.0, 0.0), &input, None, &[]);
        input.controls.sprint = false;
        input.controls.sneak = true;
        let sneak = physics.tick(&standing(0.0, 10.0, 0.0), &input, None, &[]);
        assert!((sprint.position.z / base.position.z - 1.3).abs() < 1e-9);
        assert!((sneak.position.z / base.position.z - 0.7).abs() < 1e-9);
    }

    #[test]
    fn overlapping_entities_separate() {
        let physics = Physics::default();
        let world = SimWorld::flat(-1);
        let collider = Collider {
            position: Vec3::new(0.6, 0.0, 0.5),
            half_width: 0.3,
            height: 1.8,
        };
        let mut state = standing(0.5, 0.0, 0.5);
        let mut previous = state.position.horizontal_distance(collider.position);
        for _ in 0..20 {
            state = physics.tick(&state, &MovementInput::default(), Some(&world), &[collider]);
            let d = state.position.horizontal_distance(collider.position);
            assert!(d >= previous - 1e-12);
            assert!(d - previous <= 0.08 + 1e-9);
            previous = d;
        }
        assert!(previous >= 0.6 - 1e-9);
    }

    #[test]
    fn coincident_entities_push_along_x() {
        let physics = Physics::default();
        let collider = Collider {
            position: Vec3::ZERO,
            half_width: 0.3,
            height: 1.8,
        };
        let pushed = physics.push_apart(Vec3::ZERO, None, &[collider]);
        assert_eq!(pushed, Vec3::new(0.08, 0.0, 0.0));
    }

    #[test]
    fn aggregate_push_is_capped() {
        let physics = Physics::default();
        let behind = Collider {
            position: Vec3::new(-0.1, 0.0, 0.0),
            half_width: 0.3,
            height: 1.8,
        };
        let pushed = physics.push_apart(Vec3::ZERO, None, &[behind, behind, behind]);
        assert!((pushed.x - 0.12).abs() < 1e-12);
        assert_eq!(pushed.z, 0.0);
    }

    #[test]
    fn push_does_not_enter_blocks() {
        let physics = Physics::default();
        let world = SimWorld::new().with_solid(BlockPos::new(1, 0, 0));
        let collider = Collider {
            position: Vec3::new(0.5, 0.0, 0.5),
            half_width: 0.3,
            height: 1.8,
        };
        let pushed = physics.push_apart(Vec3::new(0.7, 0.0, 0.5), Some(&world), &[collider]);
        assert_eq!(pushed.x, 0.7);
    }

    #[test]
    fn entities_above_head_do_not_push() {
        let physics = Physics::default();
        let collider = Collider {
            position: Vec3::new(0.0, 2.0, 0.0),
            half_width: 0.3,
            height: 1.8,
        };
        assert_eq!(physics.push_apart(Vec3::ZERO, None, &[collider]), Vec3::ZERO);
    }
}
