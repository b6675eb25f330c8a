//! [`ChannelLedger`] – who holds which actuation channel.
//!
//! Before a run is registered, call [`ChannelLedger::check`] to learn whether
//! the channels it asks for are free or held only by lower-priority runs.  A
//! held channel whose owner has equal or higher priority yields a
//! [`BotError::ChannelBusy`] and nothing may be changed.

use blockpilot_types::{BotError, Channel, ChannelSet};

use crate::RunId;

/// Current holder of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub run_id: RunId,
    pub name: String,
    pub priority: i32,
}

/// Channel → owner table.
///
/// # Example
///
/// ```
/// use blockpilot_kernel::ledger::{ChannelLedger, Owner};
/// use blockpilot_types::{Channel, ChannelSet};
///
/// let mut ledger = ChannelLedger::new();
/// ledger.grant(Channel::Legs.into(), Owner { run_id: 1, name: "go_to".into(), priority: 20 });
///
/// assert!(ledger.check(Channel::Legs.into(), 20).is_err());
/// assert_eq!(ledger.check(Channel::Legs.into(), 30).unwrap(), vec![1]);
/// assert!(ledger.check(Channel::Head.into(), 0).unwrap().is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct ChannelLedger {
    owners: [Option<Owner>; 3],
}

impl ChannelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self, channel: Channel) -> Option<&Owner> {
        self.owners[channel.index()].as_ref()
    }

    /// Run ids that would have to be preempted for a run at `priority` to take
    /// `channels`, or [`BotError::ChannelBusy`] for the first channel held at
    /// equal or higher priority.
    pub fn check(&self, channels: ChannelSet, priority: i32) -> Result<Vec<RunId>, BotError> {
        let mut victims = Vec::new();
        for channel in channels.iter() {
            let Some(owner) = self.owner(channel) else {
                continue;
            };
            if owner.priority >= priority {
                return Err(BotError::ChannelBusy {
                    channel,
                    owner: owner.name.clone(),
                    priority: owner.priority,
                });
            }
            if !victims.contains(&owner.run_id) {
                victims.push(owner.run_id);
            }
        }
        Ok(victims)
    }

    /// Record `owner` as the holder of every channel in `channels`.
    pub fn grant(&mut self, channels: ChannelSet, owner: Owner) {
        for channel in channels.iter() {
            self.owners[channel.index()] = Some(owner.clone());
        }
    }

    /// Free every channel held by `run_id`.  Channels held by anyone else are
    /// untouched, so releasing twice or after a newer grant is harmless.
    pub fn release(&mut self, run_id: RunId) -> ChannelSet {
        let mut freed = ChannelSet::EMPTY;
        for channel in Channel::ALL {
            let slot = &mut self.owners[channel.index()];
            if slot.as_ref().is_some_and(|o| o.run_id == run_id) {
                *slot = None;
                freed.insert(channel);
            }
        }
        freed
    }

    /// Owning run id per channel, indexed by [`Channel::index`].
    pub fn owner_ids(&self) -> [Option<RunId>; 3] {
        [0, 1, 2].map(|i| self.owners[i].as_ref().map(|o| o.run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(run_id: RunId, priority: i32) -> Owner {
        Owner {
            run_id,
            name: format!("run{run_id}"),
            priority,
        }
    }

    #[test]
    fn free_channels_need_no_victims() {
        let ledger = ChannelLedger::new();
        assert_eq!(ledger.check(ChannelSet::ALL, -5).unwrap(), Vec::<RunId>::new());
    }

    #[test]
    fn equal_priority_is_busy() {
        let mut ledger = ChannelLedger::new();
        ledger.grant(Channel::Head.into(), owner(4, 10));
        let err = ledger.check(ChannelSet::ALL, 10).unwrap_err();
        assert_eq!(
            err,
            BotError::ChannelBusy {
                channel: Channel::Head,
                owner: "run4".into(),
                priority: 10
            }
        );
    }

    #[test]
    fn victims_are_deduplicated() {
        let mut ledger = ChannelLedger::new();
        ledger.grant(ChannelSet::of(&[Channel::Legs, Channel::Head]), owner(1, 5));
        ledger.grant(Channel::Hands.into(), owner(2, 5));
        assert_eq!(ledger.check(ChannelSet::ALL, 6).unwrap(), vec![1, 2]);
    }

    #[test]
    fn release_only_frees_own_channels() {
        let mut ledger = ChannelLedger::new();
        ledger.grant(Channel::Legs.into(), owner(1, 0));
        ledger.grant(Channel::Legs.into(), owner(2, 9));
        assert!(ledger.release(1).is_empty());
        assert_eq!(ledger.owner(Channel::Legs).map(|o| o.run_id), Some(2));
        assert_eq!(ledger.release(2), ChannelSet::from(Channel::Legs));
        assert_eq!(ledger.owner_ids(), [None, None, None]);
    }
}
