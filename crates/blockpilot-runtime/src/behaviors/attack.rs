//! Chase and hit an entity, digging through whatever is in the way.

use std::sync::Arc;

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_nav::{NavStep, approach_cell};
use blockpilot_physics::first_solid;
use blockpilot_types::{
    BlockOracle, BlockPos, BotError, BreakTarget, EntityId, EntityInfo, HandsActuation,
    PartialActuation, Vec3,
};
use tracing::{debug, info};

use super::aim::look_angles;
use super::mine::Digger;
use super::{Approach, BehaviorEnv, stand_looking};

/// What the crosshair lands on first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimTarget {
    Entity { distance: f64 },
    Block { pos: BlockPos, distance: f64 },
}

/// The nearer of the entity and the first solid block on the line of sight to
/// its centre.
pub fn aim_query(oracle: &dyn BlockOracle, eye: Vec3, entity: &EntityInfo) -> AimTarget {
    let center = entity.center();
    let to_entity = eye.distance(center);
    match first_solid(oracle, eye, center) {
        Some(hit) if hit.distance < to_entity => AimTarget::Block {
            pos: hit.pos,
            distance: eye.distance(hit.pos.center()),
        },
        _ => AimTarget::Entity {
            distance: to_entity,
        },
    }
}

pub struct Attack {
    oracle: Arc<dyn BlockOracle>,
    entity: EntityId,
    range: f64,
    cooldown: u32,
    reach: f64,
    approach: Approach,
    digger: Digger,
}

impl Attack {
    pub fn new(env: &BehaviorEnv, entity: EntityId) -> Result<Self, BotError> {
        let cfg = &env.behavior;
        Ok(Self {
            oracle: env.require_oracle()?,
            entity,
            range: cfg.attack_range,
            cooldown: cfg.attack_cooldown,
            reach: cfg.reach,
            approach: Approach::new(env.nav),
            digger: Digger::new(cfg.dig_ticks),
        })
    }
}

#[async_trait]
impl Behavior for Attack {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let mut this = *self;
        let oracle = Arc::clone(&this.oracle);
        let mut snapshot = ctx.next_snapshot().await?;
        let mut ready_in = 0u32;
        let mut tracked: Option<BlockPos> = None;
        let mut hits = 0u32;

        loop {
            let Some(entity) = snapshot.entity(this.entity) else {
                info!(run = %ctx.name(), entity = this.entity, hits, "attack target gone");
                return Ok(());
            };
            ready_in = ready_in.saturating_sub(1);
            let eye = snapshot.eye_position();
            let (yaw, pitch) = look_angles(eye, entity.center());

            let partial = match aim_query(oracle.as_ref(), eye, entity) {
                AimTarget::Block { pos, distance } if distance <= this.reach => {
                    let stage = this.digger.tick(pos);
                    let (yaw, pitch) = look_angles(eye, pos.center());
                    PartialActuation {
                        hands: HandsActuation {
                            attack: Some(true),
                            break_target: Some(BreakTarget { pos, stage }),
                            ..Default::default()
                        },
                        ..stand_looking(yaw, pitch)
                    }
                }
                AimTarget::Entity { distance } if distance <= this.range => {
                    this.digger.reset();
                    let mut partial = stand_looking(yaw, pitch);
                    partial.hands.attack = Some(false);
                    if ready_in == 0 {
                        partial.hands.attack_target = Some(this.entity);
                        ready_in = this.cooldown;
                        hits += 1;
                    }
                    partial
                }
                _ => {
                    this.digger.reset();
                    let cell = BlockPos::containing(entity.position);
                    if tracked != Some(cell) {
                        tracked = Some(cell);
                        let stand = approach_cell(
                            oracle.as_ref(),
                            entity.position,
                            (this.range - 0.5).max(1.0),
                            snapshot.position,
                            &[],
                        )
                        .unwrap_or(cell);
                        debug!(entity = this.entity, stand = %stand, "attack: closing in");
                        this.approach.toward(stand);
                    }
                    let mut partial = match this.approach.step(snapshot.position, oracle.as_ref()) {
                        Ok(NavStep::Steer(steering)) => steering.actuation(),
                        Ok(NavStep::Arrived) => stand_looking(yaw, pitch),
                        Err(BotError::Unreachable { .. }) => {
                            // Wait for the entity to change cells.
                            this.approach.clear();
                            stand_looking(yaw, pitch)
                        }
                        Err(e) => return Err(e),
                    };
                    partial.hands.attack = Some(false);
                    partial
                }
            };
            snapshot = ctx.emit(partial).await?;
        }
    }
}
