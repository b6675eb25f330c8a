//! Hands-only behaviors: holding use and changing the hotbar slot.

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_types::{BotError, HandsActuation, PartialActuation};
use tracing::debug;

/// Highest hotbar slot index.
pub const MAX_SLOT: u8 = 8;

fn check_slot(slot: u8) -> Result<u8, BotError> {
    if slot > MAX_SLOT {
        return Err(BotError::InvalidIntent(format!(
            "hotbar slot {slot} is out of range 0..={MAX_SLOT}"
        )));
    }
    Ok(slot)
}

fn hands(hands: HandsActuation) -> PartialActuation {
    PartialActuation {
        hands,
        ..Default::default()
    }
}

/// Hold use-item, optionally for a fixed number of ticks.
pub struct UseItem {
    slot: Option<u8>,
    ticks: Option<u32>,
}

impl UseItem {
    pub fn new(slot: Option<u8>, ticks: Option<u32>) -> Result<Self, BotError> {
        let slot = slot.map(check_slot).transpose()?;
        Ok(Self { slot, ticks })
    }
}

#[async_trait]
impl Behavior for UseItem {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let mut pending_slot = self.slot;
        let mut held = 0u32;
        ctx.next_snapshot().await?;
        loop {
            if let Some(limit) = self.ticks
                && held >= limit
            {
                debug!(run = %ctx.name(), held, "use: released");
                ctx.emit(hands(HandsActuation {
                    use_item: Some(false),
                    ..Default::default()
                }))
                .await?;
                return Ok(());
            }
            held += 1;
            ctx.emit(hands(HandsActuation {
                use_item: Some(true),
                hotbar_slot: pending_slot.take(),
                ..Default::default()
            }))
            .await?;
        }
    }
}

/// Select a hotbar slot and finish.
pub struct SwitchSlot {
    slot: u8,
}

impl SwitchSlot {
    pub fn new(slot: u8) -> Result<Self, BotError> {
        Ok(Self {
            slot: check_slot(slot)?,
        })
    }
}

#[async_trait]
impl Behavior for SwitchSlot {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        ctx.next_snapshot().await?;
        ctx.emit(hands(HandsActuation {
            hotbar_slot: Some(self.slot),
            ..Default::default()
        }))
        .await?;
        Ok(())
    }
}
