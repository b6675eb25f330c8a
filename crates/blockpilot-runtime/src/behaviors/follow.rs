//! Keep within a distance of a moving entity.

use std::sync::Arc;

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_nav::{NavStep, approach_cell};
use blockpilot_types::{BlockOracle, BlockPos, BotError, EntityId};
use tracing::{debug, info};

use super::aim::look_angles;
use super::{Approach, BehaviorEnv, stand_looking};

pub struct Follow {
    oracle: Arc<dyn BlockOracle>,
    entity: EntityId,
    distance: f64,
    approach: Approach,
    /// Entity cell the current approach was computed for.
    tracked: Option<BlockPos>,
    /// Entity cell from which the last approach proved unreachable.
    blocked: Option<BlockPos>,
}

impl Follow {
    pub fn new(env: &BehaviorEnv, entity: EntityId, distance: f64) -> Result<Self, BotError> {
        Ok(Self {
            oracle: env.require_oracle()?,
            entity,
            distance,
            approach: Approach::new(env.nav),
            tracked: None,
            blocked: None,
        })
    }
}

#[async_trait]
impl Behavior for Follow {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let mut this = *self;
        let mut snapshot = ctx.next_snapshot().await?;
        loop {
            let Some(entity) = snapshot.entity(this.entity) else {
                info!(run = %ctx.name(), entity = this.entity, "followed entity is gone");
                return Ok(());
            };
            let (yaw, pitch) = look_angles(snapshot.eye_position(), entity.center());

            let partial = if snapshot.position.distance(entity.position) <= this.distance {
                this.approach.clear();
                this.tracked = None;
                stand_looking(yaw, pitch)
            } else {
                let cell = BlockPos::containing(entity.position);
                if this.blocked == Some(cell) {
                    stand_looking(yaw, pitch)
                } else {
                    if this.tracked != Some(cell) {
                        this.tracked = Some(cell);
                        this.blocked = None;
                        let stand = approach_cell(
                            this.oracle.as_ref(),
                            entity.position,
                            this.distance,
                            snapshot.position,
                            &[],
                        )
                        .unwrap_or(cell);
                        debug!(entity = this.entity, stand = %stand, "follow: new approach");
                        this.approach.toward(stand);
                    }
                    match this.approach.step(snapshot.position, this.oracle.as_ref()) {
                        Ok(NavStep::Arrived) => stand_looking(yaw, pitch),
                        Ok(NavStep::Steer(steering)) => steering.actuation(),
                        Err(BotError::Unreachable { .. }) => {
                            debug!(entity = this.entity, "follow: unreachable, waiting for it to move");
                            this.blocked = Some(cell);
                            this.tracked = None;
                            this.approach.clear();
                            stand_looking(yaw, pitch)
                        }
                        Err(e) => return Err(e),
                    }
                }
            };
            snapshot = ctx.emit(partial).await?;
        }
    }
}
