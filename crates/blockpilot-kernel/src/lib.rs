//! `blockpilot-kernel` – behavior scheduling and actuation arbitration.
//!
//! # Modules
//!
//! - [`scheduler`] – [`Scheduler`]: starts behaviors as tokio tasks,
//!   preempts lower-priority channel holders, merges per-tick outputs into one
//!   [`InputFrame`][blockpilot_types::InputFrame], and posts exactly one
//!   [`BehaviorEnded`] per run.
//! - [`behavior`] – the [`Behavior`] trait and its [`RunContext`].
//! - [`ledger`] – [`ChannelLedger`][ledger::ChannelLedger]: channel → owner
//!   bookkeeping and the strict-priority admission check.
//! - [`mailbox`] – [`Mailbox`][mailbox::Mailbox]: single-slot overwrite-newest
//!   handoff between the scheduler and a task.
//! - [`control`] – per-run cancellation and lifecycle types.

pub mod behavior;
pub mod control;
pub mod ledger;
pub mod mailbox;
pub mod scheduler;

pub use behavior::{Behavior, RunContext, RunPort};
pub use control::{BehaviorEnded, EndReason, RunControl, RunId};
pub use scheduler::{RunInfo, Scheduler};
