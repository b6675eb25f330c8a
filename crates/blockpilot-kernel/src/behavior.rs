//! The [`Behavior`] trait and the [`RunContext`] a running behavior talks
//! through.
//!
//! A behavior is an independent task.  Its only suspension point is
//! [`RunContext::emit`] (or [`RunContext::next_snapshot`] before its first
//! output): it posts a partial actuation for the current tick and waits for
//! the next world snapshot.  Cancellation is observed there and surfaces as
//! [`BotError::Interrupted`].

use std::sync::Arc;

use async_trait::async_trait;
use blockpilot_types::{BotError, ChannelSet, PartialActuation, WorldSnapshot};

use crate::control::{EndReason, RunControl, RunId};
use crate::mailbox::Mailbox;

#[async_trait]
pub trait Behavior: Send {
    /// Drive the behavior to completion.  Returning `Err` ends the run; the
    /// error is logged by the scheduler.
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError>;
}

/// Handle a running behavior uses to read snapshots and post actuation.
pub struct RunContext {
    name: String,
    run_id: RunId,
    channels: ChannelSet,
    inbox: Arc<Mailbox<Arc<WorldSnapshot>>>,
    outbox: Arc<Mailbox<PartialActuation>>,
    control: Arc<RunControl>,
}

impl RunContext {
    pub(crate) fn new(
        name: String,
        run_id: RunId,
        channels: ChannelSet,
        inbox: Arc<Mailbox<Arc<WorldSnapshot>>>,
        outbox: Arc<Mailbox<PartialActuation>>,
        control: Arc<RunControl>,
    ) -> Self {
        Self {
            name,
            run_id,
            channels,
            inbox,
            outbox,
            control,
        }
    }

    /// A context wired to a [`RunPort`] instead of a scheduler, for driving a
    /// single behavior by hand.
    pub fn standalone(name: impl Into<String>, channels: ChannelSet) -> (RunContext, RunPort) {
        let inbox = Arc::new(Mailbox::new());
        let outbox = Arc::new(Mailbox::new());
        let control = Arc::new(RunControl::new());
        let port = RunPort {
            inbox: Arc::clone(&inbox),
            outbox: Arc::clone(&outbox),
            control: Arc::clone(&control),
        };
        (
            RunContext::new(name.into(), 0, channels, inbox, outbox, control),
            port,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn channels(&self) -> ChannelSet {
        self.channels
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    /// Wait for the next snapshot without posting anything.
    pub async fn next_snapshot(&self) -> Result<Arc<WorldSnapshot>, BotError> {
        tokio::select! {
            biased;
            _ = self.control.cancelled() => Err(BotError::Interrupted),
            snapshot = self.inbox.recv() => Ok(snapshot),
        }
    }

    /// Post `partial` for this tick and wait for the next snapshot.
    ///
    /// Groups for channels this run was not granted are dropped.
    pub async fn emit(&self, partial: PartialActuation) -> Result<Arc<WorldSnapshot>, BotError> {
        if self.control.is_cancelled() {
            return Err(BotError::Interrupted);
        }
        self.outbox.put(partial.restricted_to(self.channels));
        self.next_snapshot().await
    }
}

/// The scheduler side of a [`RunContext::standalone`] context.
pub struct RunPort {
    inbox: Arc<Mailbox<Arc<WorldSnapshot>>>,
    outbox: Arc<Mailbox<PartialActuation>>,
    control: Arc<RunControl>,
}

impl RunPort {
    pub fn deliver(&self, snapshot: impl Into<Arc<WorldSnapshot>>) {
        self.inbox.put(snapshot.into());
    }

    pub fn take_output(&self) -> Option<PartialActuation> {
        self.outbox.take()
    }

    pub fn cancel(&self) {
        self.control.request(EndReason::Cancelled);
    }
}
