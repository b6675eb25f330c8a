//! [`BodyController`] – the one owner of the authoritative body state.

use std::sync::RwLock;

use blockpilot_types::{BlockOracle, InputFrame, Vec3};
use tracing::trace;

use crate::body::{Collider, MovementInput, Physics, PhysicsState};

/// Applies merged frames to the body, one tick at a time.
///
/// Writes happen once per tick from the agent loop; any number of readers may
/// call [`state`][Self::state] concurrently.
pub struct BodyController {
    physics: Physics,
    state: RwLock<PhysicsState>,
}

impl BodyController {
    pub fn new(physics: Physics, initial: PhysicsState) -> Self {
        Self {
            physics,
            state: RwLock::new(initial),
        }
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Advance the body by one tick using `frame`'s movement keys and yaw.
    pub fn apply(
        &self,
        frame: &InputFrame,
        oracle: Option<&dyn BlockOracle>,
        colliders: &[Collider],
    ) -> PhysicsState {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        let next = self
            .physics
            .tick(&guard, &MovementInput::from(frame), oracle, colliders);
        trace!(
            x = next.position.x,
            y = next.position.y,
            z = next.position.z,
            grounded = next.grounded,
            "body advanced"
        );
        *guard = next;
        next
    }

    pub fn state(&self) -> PhysicsState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Move the body to `position` and drop all momentum.
    pub fn teleport(&self, position: Vec3) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        *guard = PhysicsState::at(position);
    }
}
