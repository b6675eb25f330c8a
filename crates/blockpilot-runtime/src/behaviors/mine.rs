//! Break one block.
//!
//! The agent walks until the block is within reach and in sight, then holds
//! attack while [`Digger`] walks the break stages.  When the stand cell it
//! reached leaves the block hidden, the blocks in the way are dug first.  Completion is read from the
//! world, never assumed: the run ends only once the cell reads as air.

use std::sync::Arc;

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_nav::{NavStep, approach_cell};
use blockpilot_physics::{block_visible, first_solid};
use blockpilot_types::{
    BlockOracle, BlockPos, BotError, BreakStage, BreakTarget, HandsActuation, PartialActuation,
    Vec3, read_air,
};
use tracing::{debug, info};

use super::aim::look_angles;
use super::{Approach, BehaviorEnv, stand_looking};

/// Break-stage sequencer: `Start`, then `Continue` until the dig time is up,
/// then `Finish`.  Switching to another block starts over.
#[derive(Debug, Clone)]
pub struct Digger {
    dig_ticks: u32,
    progress: u32,
    target: Option<BlockPos>,
}

impl Digger {
    pub fn new(dig_ticks: u32) -> Self {
        Self {
            dig_ticks: dig_ticks.max(1),
            progress: 0,
            target: None,
        }
    }

    pub fn tick(&mut self, pos: BlockPos) -> BreakStage {
        if self.target != Some(pos) {
            self.target = Some(pos);
            self.progress = 0;
        }
        self.progress += 1;
        if self.progress >= self.dig_ticks {
            // A block that survives Finish gets a fresh attempt.
            self.progress = 0;
            BreakStage::Finish
        } else if self.progress == 1 {
            BreakStage::Start
        } else {
            BreakStage::Continue
        }
    }

    pub fn reset(&mut self) {
        self.progress = 0;
        self.target = None;
    }
}

pub struct Mine {
    oracle: Arc<dyn BlockOracle>,
    pos: BlockPos,
    slot: Option<u8>,
    reach: f64,
    timeout: u32,
    approach: Approach,
    digger: Digger,
}

impl Mine {
    pub fn new(env: &BehaviorEnv, pos: BlockPos, slot: Option<u8>) -> Result<Self, BotError> {
        Ok(Self {
            oracle: env.require_oracle()?,
            pos,
            slot,
            reach: env.behavior.reach,
            timeout: env.behavior.mine_timeout,
            approach: Approach::new(env.nav),
            digger: Digger::new(env.behavior.dig_ticks),
        })
    }
}

impl Mine {
    /// Hold attack on `cell` and advance its break stage.
    fn dig(&mut self, cell: BlockPos, eye: Vec3) -> PartialActuation {
        let stage = self.digger.tick(cell);
        let (yaw, pitch) = look_angles(eye, cell.center());
        PartialActuation {
            hands: HandsActuation {
                attack: Some(true),
                break_target: Some(BreakTarget { pos: cell, stage }),
                ..Default::default()
            },
            ..stand_looking(yaw, pitch)
        }
    }
}

#[async_trait]
impl Behavior for Mine {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let mut this = *self;
        let oracle = Arc::clone(&this.oracle);
        let pos = this.pos;
        let mut snapshot = ctx.next_snapshot().await?;
        let mut pending_slot = this.slot;
        let mut rejected: Vec<BlockPos> = Vec::new();
        let mut elapsed = 0u32;

        loop {
            if read_air(oracle.as_ref(), pos) == Some(true) {
                info!(run = %ctx.name(), pos = %pos, ticks = elapsed, "block mined");
                return Ok(());
            }
            if elapsed >= this.timeout {
                return Err(BotError::Timeout {
                    what: format!("mining {pos}"),
                    ticks: elapsed,
                });
            }
            elapsed += 1;

            let eye = snapshot.eye_position();
            let within = eye.distance(pos.center()) <= this.reach;
            let visible = within && block_visible(oracle.as_ref(), eye, pos);
            // The first solid cell hiding the target, when it can be dug from here.
            let blocker = if within && !visible {
                first_solid(oracle.as_ref(), eye, pos.center())
                    .map(|hit| hit.pos)
                    .filter(|cell| *cell != pos && eye.distance(cell.center()) <= this.reach)
            } else {
                None
            };
            let dig_at = if visible {
                Some(pos)
            } else if this.approach.arrived(snapshot.position) {
                blocker
            } else {
                None
            };

            let mut partial = match dig_at {
                Some(cell) => this.dig(cell, eye),
                None => {
                    if this.approach.target().is_none() {
                        let stand = approach_cell(
                            oracle.as_ref(),
                            pos.center(),
                            this.reach - 1.0,
                            snapshot.position,
                            &rejected,
                        )
                        .ok_or(BotError::NoApproachCell)?;
                        debug!(pos = %pos, stand = %stand, "mine: approaching");
                        this.approach.toward(stand);
                    }
                    match this.approach.step(snapshot.position, oracle.as_ref())? {
                        NavStep::Steer(steering) => {
                            this.digger.reset();
                            let mut partial = steering.actuation();
                            partial.hands.attack = Some(false);
                            partial
                        }
                        NavStep::Arrived => match blocker {
                            Some(cell) => {
                                debug!(pos = %pos, blocker = %cell, "mine: digging toward the target");
                                this.dig(cell, eye)
                            }
                            None => {
                                // Standing here neither reaches nor sees the block.
                                if let Some(stand) = this.approach.target() {
                                    rejected.push(stand);
                                }
                                this.approach.clear();
                                this.digger.reset();
                                let (yaw, pitch) = look_angles(eye, pos.center());
                                let mut partial = stand_looking(yaw, pitch);
                                partial.hands.attack = Some(false);
                                partial
                            }
                        },
                    }
                }
            };
            if let Some(slot) = pending_slot.take() {
                partial.hands.hotbar_slot = Some(slot);
            }
            snapshot = ctx.emit(partial).await?;
        }
    }
}
