//! `blockpilot-types` – shared vocabulary of the agent core.
//!
//! - [`geometry`] – [`Vec3`], [`BlockPos`], [`Face`].
//! - [`actuation`] – [`Channel`], [`PartialActuation`], [`InputFrame`].
//! - [`world`] – [`WorldSnapshot`], [`EntityInfo`], the [`BlockOracle`] trait.
//! - [`error`] – [`BotError`], the one error type used across the workspace.

pub mod actuation;
pub mod error;
pub mod geometry;
pub mod world;

pub use actuation::{
    BreakStage, BreakTarget, Channel, ChannelSet, HandsActuation, HeadActuation, InputFrame,
    LegsActuation, MovementControls, PartialActuation, PlaceTarget,
};
pub use error::BotError;
pub use geometry::{BlockPos, Face, Vec3};
pub use world::{
    BlockOracle, EYE_HEIGHT, EntityId, EntityInfo, WorldSnapshot, is_air_name, read_air,
};
