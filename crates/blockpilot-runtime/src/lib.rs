//! `blockpilot-runtime` – behaviors, intents, and the agent loop.
//!
//! # Modules
//!
//! - [`behaviors`] – the stock [`Behavior`][blockpilot_kernel::Behavior]
//!   implementations (idle, go-to, follow, look, attack, mine, place, hands).
//! - [`intent`] – [`Intent`]: the command vocabulary, its word and JSON forms,
//!   validation, and the dispatch table.
//! - [`agent_loop`] – [`AgentLoop`]: snapshot → scheduler → physics, once per
//!   tick.
//! - [`config`] – [`BotConfig`], the serde tree of every tunable.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: log format,
//!   filter, and optional OTLP export.

pub mod agent_loop;
pub mod behaviors;
pub mod config;
pub mod intent;
pub mod telemetry;

pub use agent_loop::{AgentLoop, TickReport};
pub use behaviors::{BehaviorConfig, BehaviorEnv};
pub use config::BotConfig;
pub use intent::{Intent, Launch};
