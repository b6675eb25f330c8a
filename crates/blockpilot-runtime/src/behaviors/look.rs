//! Turn the head toward an entity or a point.

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_types::{BotError, EntityId, HeadActuation, PartialActuation, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::BehaviorEnv;
use super::aim::{angle_diff, look_angles, turn_toward};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookTarget {
    Entity(EntityId),
    Position(Vec3),
}

pub struct LookAt {
    target: LookTarget,
    tolerance: f64,
    budget: u32,
    max_turn: f64,
}

impl LookAt {
    pub fn new(env: &BehaviorEnv, target: LookTarget) -> Self {
        Self {
            target,
            tolerance: env.behavior.look_tolerance,
            budget: env.behavior.look_budget,
            max_turn: env.behavior.max_turn,
        }
    }
}

#[async_trait]
impl Behavior for LookAt {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let mut snapshot = ctx.next_snapshot().await?;
        let (mut yaw, mut pitch) = (snapshot.yaw, snapshot.pitch);
        let mut spent = 0u32;
        loop {
            let point = match self.target {
                LookTarget::Position(p) => p,
                LookTarget::Entity(id) => match snapshot.entity(id) {
                    Some(entity) => entity.center(),
                    None => {
                        debug!(entity = id, "look: entity vanished");
                        return Ok(());
                    }
                },
            };
            let (goal_yaw, goal_pitch) = look_angles(snapshot.eye_position(), point);
            if angle_diff(snapshot.yaw, goal_yaw).abs() <= self.tolerance
                && (snapshot.pitch - goal_pitch).abs() <= self.tolerance
            {
                return Ok(());
            }
            if spent >= self.budget {
                debug!(budget = self.budget, "look: budget spent before alignment");
                return Ok(());
            }
            spent += 1;
            yaw = turn_toward(yaw, goal_yaw, self.max_turn);
            pitch = turn_toward(pitch, goal_pitch, self.max_turn);
            snapshot = ctx
                .emit(PartialActuation {
                    head: HeadActuation::look(yaw, pitch),
                    ..Default::default()
                })
                .await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::testing::{Rig, env, flat_world};
    use blockpilot_types::{Channel, EntityInfo};

    fn spawn(target: LookTarget, tweak: impl FnOnce(&mut BehaviorEnv)) -> Rig {
        let world = flat_world();
        let mut e = env(&world);
        tweak(&mut e);
        let look = LookAt::new(&e, target);
        Rig::spawn(world, Vec3::new(0.5, 1.0, 0.5), Channel::Head.into(), Box::new(look))
    }

    #[tokio::test]
    async fn turns_in_bounded_steps_then_ends_aligned() {
        // Eye level, due +X.
        let mut rig = spawn(LookTarget::Position(Vec3::new(10.5, 2.62, 0.5)), |_| {});
        let first = rig.step().await.unwrap();
        assert_eq!(first.head.yaw, Some(-45.0));
        assert!(first.legs.is_empty());

        let result = rig.run_until_done(10).await;
        assert_eq!(result, Some(Ok(())));
        assert!((rig.frame.yaw + 90.0).abs() < 1e-9);
        assert!(rig.frame.pitch.abs() < 1e-3);
    }

    #[tokio::test]
    async fn vanished_entity_ends_the_look() {
        let mut rig = spawn(LookTarget::Entity(12), |_| {});
        assert_eq!(rig.run_until_done(3).await, Some(Ok(())));
    }

    #[tokio::test]
    async fn tracks_an_entity() {
        let mut rig = spawn(LookTarget::Entity(4), |_| {});
        rig.entities.push(EntityInfo::new(4, Vec3::new(0.5, 1.0, -5.5)));
        let result = rig.run_until_done(10).await;
        assert_eq!(result, Some(Ok(())));
        assert!((rig.frame.yaw.abs() - 180.0).abs() < 3.0);
    }

    #[tokio::test]
    async fn budget_bounds_the_look() {
        let mut rig = spawn(LookTarget::Position(Vec3::new(-10.0, 2.62, 0.5)), |e| {
            e.behavior.max_turn = 1.0;
            e.behavior.look_budget = 5;
        });
        let result = rig.run_until_done(10).await;
        assert_eq!(result, Some(Ok(())));
        assert!((rig.frame.yaw - 5.0).abs() < 1e-9);
    }
}
