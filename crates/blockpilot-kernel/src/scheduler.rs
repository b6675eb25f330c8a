//! [`Scheduler`] – concurrent behaviors, channel arbitration, per-tick merge.
//!
//! Every started behavior runs as its own tokio task.  Once per tick the
//! caller hands the scheduler a snapshot through [`Scheduler::advance`]; the
//! scheduler fans it out to every active run, collects the newest partial
//! actuation each run has posted, and merges them into one [`InputFrame`]
//! according to channel ownership.
//!
//! Termination is handled by a guard owned by the run's task.  However the
//! task ends (return, error, cancellation, runtime shutdown), dropping the
//! guard removes the run's record if it is still the registered one, releases
//! whatever channels it still holds, and posts exactly one [`BehaviorEnded`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use blockpilot_types::{BotError, Channel, ChannelSet, InputFrame, PartialActuation, WorldSnapshot};
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::behavior::{Behavior, RunContext};
use crate::control::{BehaviorEnded, EndReason, RunControl, RunId};
use crate::ledger::{ChannelLedger, Owner};
use crate::mailbox::Mailbox;

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

struct RunRecord {
    run_id: RunId,
    priority: i32,
    channels: ChannelSet,
    inbox: Arc<Mailbox<Arc<WorldSnapshot>>>,
    outbox: Arc<Mailbox<PartialActuation>>,
    control: Arc<RunControl>,
}

#[derive(Default)]
struct Registry {
    runs: BTreeMap<String, RunRecord>,
    ledger: ChannelLedger,
    next_run_id: RunId,
}

impl Registry {
    /// Unregister `name`, free its channels, and ask its task to stop.
    fn evict(&mut self, name: &str, reason: EndReason) -> bool {
        let Some(record) = self.runs.remove(name) else {
            return false;
        };
        self.ledger.release(record.run_id);
        record.control.request(reason);
        true
    }
}

#[derive(Default)]
struct Output {
    frame: InputFrame,
    last_owner: [Option<RunId>; 3],
}

struct Shared {
    registry: Mutex<Registry>,
    output: Mutex<Output>,
    events: mpsc::UnboundedSender<BehaviorEnded>,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Public view of an active run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub name: String,
    pub run_id: RunId,
    pub priority: i32,
    pub channels: ChannelSet,
}

// ─────────────────────────────────────────────────────────────────────────────
// Run guard
// ─────────────────────────────────────────────────────────────────────────────

struct RunGuard {
    shared: Arc<Shared>,
    name: String,
    run_id: RunId,
    control: Arc<RunControl>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let reason = self.control.reason().unwrap_or(EndReason::Completed);
        {
            let mut registry = self.shared.registry();
            if registry
                .runs
                .get(&self.name)
                .is_some_and(|r| r.run_id == self.run_id)
            {
                registry.runs.remove(&self.name);
            }
            registry.ledger.release(self.run_id);
        }
        info!(run = %self.name, run_id = self.run_id, %reason, "behavior ended");
        // A closed receiver only means nobody is listening any more.
        let _ = self.shared.events.send(BehaviorEnded {
            name: std::mem::take(&mut self.name),
            run_id: self.run_id,
            reason,
            ended_at: Utc::now(),
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// Create a scheduler and the receiver its lifecycle events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BehaviorEnded>) {
        let (events, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            registry: Mutex::new(Registry::default()),
            output: Mutex::new(Output::default()),
            events,
        });
        (Self { shared }, rx)
    }

    /// Register `behavior` under `name` and spawn it on the current tokio
    /// runtime.
    ///
    /// Runs holding any of `channels` at a strictly lower priority are
    /// preempted.  On error nothing changes.
    ///
    /// # Errors
    ///
    /// - [`BotError::NoRuntime`] – called outside a tokio runtime.
    /// - [`BotError::AlreadyRunning`] – a run named `name` is active.
    /// - [`BotError::ChannelBusy`] – a requested channel is held at equal or
    ///   higher priority.
    pub fn start(
        &self,
        name: impl Into<String>,
        behavior: Box<dyn Behavior>,
        channels: ChannelSet,
        priority: i32,
    ) -> Result<RunId, BotError> {
        let name = name.into();
        let handle = Handle::try_current().map_err(|_| BotError::NoRuntime)?;

        let (ctx, guard) = {
            let mut registry = self.shared.registry();
            if registry.runs.contains_key(&name) {
                return Err(BotError::AlreadyRunning(name));
            }
            let victims = registry.ledger.check(channels, priority)?;
            for victim in victims {
                let victim_name = registry
                    .runs
                    .iter()
                    .find(|(_, r)| r.run_id == victim)
                    .map(|(n, _)| n.clone());
                if let Some(victim_name) = victim_name {
                    info!(run = %victim_name, by = %name, "behavior preempted");
                    registry.evict(&victim_name, EndReason::Preempted);
                }
            }

            registry.next_run_id += 1;
            let run_id = registry.next_run_id;
            let record = RunRecord {
                run_id,
                priority,
                channels,
                inbox: Arc::new(Mailbox::new()),
                outbox: Arc::new(Mailbox::new()),
                control: Arc::new(RunControl::new()),
            };
            registry.ledger.grant(
                channels,
                Owner {
                    run_id,
                    name: name.clone(),
                    priority,
                },
            );
            let ctx = RunContext::new(
                name.clone(),
                run_id,
                channels,
                Arc::clone(&record.inbox),
                Arc::clone(&record.outbox),
                Arc::clone(&record.control),
            );
            let guard = RunGuard {
                shared: Arc::clone(&self.shared),
                name: name.clone(),
                run_id,
                control: Arc::clone(&record.control),
            };
            registry.runs.insert(name.clone(), record);
            (ctx, guard)
        };

        let run_id = guard.run_id;
        info!(run = %name, run_id, priority, ?channels, "behavior started");
        handle.spawn(async move {
            let guard = guard;
            match behavior.run(ctx).await {
                Ok(()) => info!(run = %guard.name, run_id = guard.run_id, "behavior finished"),
                Err(BotError::Interrupted) => {
                    debug!(run = %guard.name, run_id = guard.run_id, "behavior interrupted")
                }
                Err(e) => warn!(run = %guard.name, run_id = guard.run_id, error = %e, "behavior failed"),
            }
        });
        Ok(run_id)
    }

    /// Cancel the run named `name`.  Returns false when no such run is active.
    pub fn cancel(&self, name: &str) -> bool {
        let cancelled = self.shared.registry().evict(name, EndReason::Cancelled);
        if cancelled {
            info!(run = %name, "behavior cancelled");
        }
        cancelled
    }

    /// Cancel every active run.  Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut registry = self.shared.registry();
        let names: Vec<String> = registry.runs.keys().cloned().collect();
        for name in &names {
            registry.evict(name, EndReason::Cancelled);
        }
        if !names.is_empty() {
            info!(count = names.len(), "all behaviors cancelled");
        }
        names.len()
    }

    /// Deliver `snapshot` to every active run and merge their newest outputs.
    pub fn advance(&self, snapshot: impl Into<Arc<WorldSnapshot>>) -> InputFrame {
        let snapshot = snapshot.into();

        let (participants, owners) = {
            let registry = self.shared.registry();
            let participants: Vec<(String, RunId, i32, Arc<Mailbox<Arc<WorldSnapshot>>>, Arc<Mailbox<PartialActuation>>)> =
                registry
                    .runs
                    .iter()
                    .map(|(name, r)| {
                        (
                            name.clone(),
                            r.run_id,
                            r.priority,
                            Arc::clone(&r.inbox),
                            Arc::clone(&r.outbox),
                        )
                    })
                    .collect();
            (participants, registry.ledger.owner_ids())
        };

        for (_, _, _, inbox, _) in &participants {
            inbox.put(Arc::clone(&snapshot));
        }

        let mut outputs: Vec<(i32, String, RunId, PartialActuation)> = participants
            .into_iter()
            .filter_map(|(name, run_id, priority, _, outbox)| {
                outbox.take().map(|partial| (priority, name, run_id, partial))
            })
            .collect();
        outputs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut output = self.shared.output.lock().unwrap_or_else(|e| e.into_inner());
        output.frame.clear_pulses();
        for channel in Channel::ALL {
            let owner = owners[channel.index()];
            if owner.is_none() || owner != output.last_owner[channel.index()] {
                output.frame.reset(channel);
            }
            output.last_owner[channel.index()] = owner;
        }
        for (_, name, run_id, partial) in &outputs {
            let written = partial.channels();
            for channel in Channel::ALL {
                if written.contains(channel) && owners[channel.index()] == Some(*run_id) {
                    output.frame.apply(channel, partial);
                } else if written.contains(channel) {
                    debug!(run = %name, %channel, "dropped output for channel not owned");
                }
            }
        }
        debug!(tick = snapshot.tick, runs = outputs.len(), "frame merged");
        output.frame
    }

    /// The last merged frame.
    pub fn frame(&self) -> InputFrame {
        self.shared.output.lock().unwrap_or_else(|e| e.into_inner()).frame
    }

    pub fn active_runs(&self) -> Vec<RunInfo> {
        self.shared
            .registry()
            .runs
            .iter()
            .map(|(name, r)| RunInfo {
                name: name.clone(),
                run_id: r.run_id,
                priority: r.priority,
                channels: r.channels,
            })
            .collect()
    }

    /// Name of the run holding `channel`.
    pub fn owner_of(&self, channel: Channel) -> Option<String> {
        self.shared
            .registry()
            .ledger
            .owner(channel)
            .map(|o| o.name.clone())
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.shared.registry().runs.contains_key(name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
