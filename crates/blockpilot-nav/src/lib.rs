//! `blockpilot-nav` – where to stand and how to get there.
//!
//! - [`walkability`] – standable cells, normalisation, approach cells.
//! - [`pathfinder`] – grid A* with step-up, drop-down and partial results.
//! - [`stall_guard`] – [`StallGuard`], non-converging replan detection.
//! - [`navigator`] – [`Navigator`], per-tick steering with replanning.

pub mod navigator;
pub mod pathfinder;
pub mod stall_guard;
pub mod walkability;

pub use navigator::{NavConfig, NavStep, Navigator, Steering, yaw_toward};
pub use pathfinder::{DEFAULT_MAX_NODES, PathResult, Pathfinder};
pub use stall_guard::StallGuard;
pub use walkability::{approach_cell, is_walkable, nearest_walkable, normalize};
