//! `blockpilot-physics` – deterministic body simulation for the voxel world.
//!
//! - [`aabb`] – bounding boxes in block units.
//! - [`collision`] – axis-separated sweep against a [`BlockOracle`].
//! - [`body`] – [`Physics::tick`]: intent, gravity, sweep, ground probe, drag,
//!   entity pushing.
//! - [`controller`] – [`BodyController`], the shared authoritative state.
//! - [`raycast`] – line-of-sight ray marching.
//! - [`sim`] – [`SimWorld`], an in-memory oracle for tests and demos.
//!
//! [`BlockOracle`]: blockpilot_types::BlockOracle

pub mod aabb;
pub mod body;
pub mod collision;
pub mod controller;
pub mod raycast;
pub mod sim;

pub use aabb::{Aabb, PLAYER_HALF_WIDTH, PLAYER_HEIGHT};
pub use body::{Collider, MovementInput, Physics, PhysicsConfig, PhysicsState};
pub use controller::BodyController;
pub use raycast::{RayHit, block_visible, first_solid, line_of_sight};
pub use sim::SimWorld;
