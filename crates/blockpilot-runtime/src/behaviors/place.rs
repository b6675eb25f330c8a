//! Put a block into an empty cell.
//!
//! The click goes against `face` of the supporting block, the neighbour of the
//! target cell opposite the face normal.  Success is read back from the world:
//! the run ends once the target cell stops reading as air.

use std::sync::Arc;

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_nav::{NavStep, approach_cell, yaw_toward};
use blockpilot_physics::Aabb;
use blockpilot_types::{
    BlockOracle, BlockPos, BotError, Face, HeadActuation, LegsActuation, PartialActuation,
    PlaceTarget, Vec3, read_air,
};
use tracing::{debug, info};

use super::aim::look_angles;
use super::{Approach, BehaviorEnv, stand_looking};

pub struct PlaceBlock {
    oracle: Arc<dyn BlockOracle>,
    pos: BlockPos,
    face: Face,
    slot: Option<u8>,
    interval: u32,
    budget: u32,
    reach: f64,
    approach: Approach,
}

impl PlaceBlock {
    pub fn new(
        env: &BehaviorEnv,
        pos: BlockPos,
        face: Face,
        slot: Option<u8>,
    ) -> Result<Self, BotError> {
        Ok(Self {
            oracle: env.require_oracle()?,
            pos,
            face,
            slot,
            interval: env.behavior.place_interval.max(1),
            budget: env.behavior.place_timeout,
            reach: env.behavior.reach,
            approach: Approach::new(env.nav),
        })
    }

    /// Override the confirmation budget.
    pub fn with_budget(mut self, ticks: u32) -> Self {
        self.budget = ticks;
        self
    }

    /// Centre of the face that gets clicked.
    fn aim_point(&self) -> Vec3 {
        let (nx, ny, nz) = self.face.normal();
        let support = self.pos.offset(-nx, -ny, -nz);
        support.center() + Vec3::new(nx as f64, ny as f64, nz as f64) * 0.5
    }

    fn body_overlaps(&self, feet: Vec3) -> bool {
        let p = self.pos;
        let cell = Aabb::new(
            Vec3::new(p.x as f64, p.y as f64, p.z as f64),
            Vec3::new(p.x as f64 + 1.0, p.y as f64 + 1.0, p.z as f64 + 1.0),
        );
        Aabb::player(feet).intersects(&cell)
    }
}

#[async_trait]
impl Behavior for PlaceBlock {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let mut this = *self;
        let oracle = Arc::clone(&this.oracle);
        let pos = this.pos;
        let aim = this.aim_point();
        let excluded = [pos, pos.down()];
        let mut rejected: Vec<BlockPos> = excluded.to_vec();
        let mut pending_slot = this.slot;
        // Ticks since the first attempt, and since the latest one.
        let mut since_first: Option<u32> = None;
        let mut since_pulse: Option<u32> = None;
        let mut snapshot = ctx.next_snapshot().await?;

        loop {
            if read_air(oracle.as_ref(), pos) == Some(false) {
                info!(run = %ctx.name(), pos = %pos, "block placed");
                return Ok(());
            }
            if let Some(ticks) = since_first
                && ticks >= this.budget
            {
                return Err(BotError::PlacementTimeout { pos, ticks });
            }

            let eye = snapshot.eye_position();
            let (yaw, pitch) = look_angles(eye, aim);
            let overlaps = this.body_overlaps(snapshot.position);

            let mut partial = if !overlaps && eye.distance(aim) <= this.reach {
                let mut partial = stand_looking(yaw, pitch);
                if since_pulse.is_none_or(|t| t >= this.interval) {
                    partial.hands.place_target = Some(PlaceTarget { pos, face: this.face });
                    since_pulse = Some(0);
                    since_first.get_or_insert(0);
                }
                partial
            } else {
                if this.approach.target().is_none() {
                    let stand = approach_cell(
                        oracle.as_ref(),
                        aim,
                        this.reach - 1.0,
                        snapshot.position,
                        &rejected,
                    )
                    .ok_or(BotError::NoApproachCell)?;
                    debug!(pos = %pos, stand = %stand, "place: approaching");
                    this.approach.toward(stand);
                }
                match this.approach.step(snapshot.position, oracle.as_ref())? {
                    NavStep::Steer(steering) => steering.actuation(),
                    NavStep::Arrived => match this.approach.target() {
                        // Close enough for the navigator, but still in the way.
                        Some(stand) if overlaps => PartialActuation {
                            legs: LegsActuation {
                                forward: Some(true),
                                ..LegsActuation::stop()
                            },
                            head: HeadActuation {
                                yaw: Some(yaw_toward(snapshot.position, stand.foot_center())),
                                pitch: None,
                            },
                            ..Default::default()
                        },
                        Some(stand) => {
                            rejected.push(stand);
                            this.approach.clear();
                            stand_looking(yaw, pitch)
                        }
                        None => stand_looking(yaw, pitch),
                    },
                }
            };
            if let Some(slot) = pending_slot.take() {
                partial.hands.hotbar_slot = Some(slot);
            }
            snapshot = ctx.emit(partial).await?;
            for counter in [&mut since_first, &mut since_pulse].into_iter().flatten() {
                *counter += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::testing::{Rig, env, flat_world};
    use blockpilot_types::ChannelSet;

    #[test]
    fn aims_at_the_support_face() {
        let world = flat_world();
        let place = PlaceBlock::new(&env(&world), BlockPos::new(2, 1, 0), Face::Up, None).unwrap();
        assert_eq!(place.aim_point(), Vec3::new(2.5, 1.0, 0.5));

        let side = PlaceBlock::new(&env(&world), BlockPos::new(2, 1, 0), Face::West, None).unwrap();
        assert_eq!(side.aim_point(), Vec3::new(3.0, 1.5, 0.5));
    }

    #[test]
    fn needs_an_oracle() {
        let result = PlaceBlock::new(&BehaviorEnv::default(), BlockPos::new(0, 1, 0), Face::Up, None);
        assert!(matches!(result, Err(BotError::MissingBlockOracle)));
    }

    #[tokio::test]
    async fn succeeds_once_the_cell_fills() {
        let world = flat_world();
        let target = BlockPos::new(2, 1, 0);
        let place = PlaceBlock::new(&env(&world), target, Face::Up, Some(1)).unwrap();
        let mut rig = Rig::spawn(world.clone(), Vec3::new(0.5, 1.0, 0.5), ChannelSet::ALL, Box::new(place));

        let first = rig.step().await.unwrap();
        assert_eq!(first.hands.place_target, Some(PlaceTarget { pos: target, face: Face::Up }));
        assert_eq!(first.hands.hotbar_slot, Some(1));

        assert_eq!(rig.run_until_done(5).await, Some(Ok(())));
        assert!(world.is_solid_at(target));
    }

    #[tokio::test]
    async fn times_out_without_confirmation() {
        let world = flat_world();
        let target = BlockPos::new(2, 1, 0);
        let place = PlaceBlock::new(&env(&world), target, Face::Up, None).unwrap();
        let mut rig = Rig::spawn(world.clone(), Vec3::new(0.5, 1.0, 0.5), ChannelSet::ALL, Box::new(place));
        rig.world_reacts = false;

        let mut pulses = 0;
        for _ in 0..20 {
            if rig.step().await.is_some_and(|out| out.hands.place_target.is_some()) {
                pulses += 1;
            }
        }
        assert_eq!(pulses, 3);

        let result = rig.run_until_done(100).await;
        assert_eq!(result, Some(Err(BotError::PlacementTimeout { pos: target, ticks: 80 })));
        assert!(!world.is_solid_at(target));
    }

    #[tokio::test]
    async fn steps_out_of_the_target_cell_first() {
        let world = flat_world();
        let target = BlockPos::new(0, 1, 0);
        let place = PlaceBlock::new(&env(&world), target, Face::Up, None).unwrap();
        let mut rig = Rig::spawn(world.clone(), Vec3::new(0.5, 1.0, 0.5), ChannelSet::ALL, Box::new(place));

        let first = rig.step().await.unwrap();
        assert_eq!(first.hands.place_target, None);

        assert_eq!(rig.run_until_done(200).await, Some(Ok(())));
        assert!(world.is_solid_at(target));
    }
}
