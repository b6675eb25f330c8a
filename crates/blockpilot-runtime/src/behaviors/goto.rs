//! Walk to a fixed cell.

use std::sync::Arc;

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_nav::{NavConfig, NavStep, Navigator};
use blockpilot_types::{BlockOracle, BlockPos, BotError};
use tracing::info;

use super::BehaviorEnv;

pub struct GoTo {
    oracle: Arc<dyn BlockOracle>,
    navigator: Navigator,
}

impl GoTo {
    pub fn new(env: &BehaviorEnv, target: BlockPos, sprint: bool) -> Result<Self, BotError> {
        let oracle = env.require_oracle()?;
        let config = NavConfig { sprint, ..env.nav };
        Ok(Self {
            oracle,
            navigator: Navigator::new(target, config),
        })
    }
}

#[async_trait]
impl Behavior for GoTo {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let mut this = *self;
        let mut snapshot = ctx.next_snapshot().await?;
        loop {
            match this.navigator.step(snapshot.position, this.oracle.as_ref())? {
                NavStep::Arrived => {
                    info!(
                        run = %ctx.name(),
                        goal = %this.navigator.target(),
                        replans = this.navigator.replans(),
                        "arrived"
                    );
                    return Ok(());
                }
                NavStep::Steer(steering) => {
                    snapshot = ctx.emit(steering.actuation()).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::testing::{Rig, env, flat_world};
    use blockpilot_physics::SimWorld;
    use blockpilot_types::{Channel, ChannelSet, Vec3};

    fn legs_and_head() -> ChannelSet {
        ChannelSet::of(&[Channel::Legs, Channel::Head])
    }

    #[test]
    fn needs_an_oracle() {
        let result = GoTo::new(&BehaviorEnv::default(), BlockPos::new(0, 1, 0), false);
        assert!(matches!(result, Err(BotError::MissingBlockOracle)));
    }

    #[tokio::test]
    async fn walks_to_the_cell() {
        let world = flat_world();
        let goto = GoTo::new(&env(&world), BlockPos::new(6, 1, 3), false).unwrap();
        let mut rig = Rig::spawn(world, Vec3::new(0.5, 1.0, 0.5), legs_and_head(), Box::new(goto));
        let result = rig.run_until_done(400).await;
        assert_eq!(result, Some(Ok(())));
        let pos = rig.body.state().position;
        assert!(pos.horizontal_distance(Vec3::new(6.5, 1.0, 3.5)) < 1.0);
    }

    #[tokio::test]
    async fn sealed_target_ends_unreachable() {
        let world = std::sync::Arc::new(
            SimWorld::flat(0)
                .with_fill(BlockPos::new(4, 1, -1), BlockPos::new(6, 3, 1), "stone")
                .with_block(BlockPos::new(5, 1, 0), "air")
                .with_block(BlockPos::new(5, 2, 0), "air"),
        );
        let goto = GoTo::new(&env(&world), BlockPos::new(5, 1, 0), false).unwrap();
        let mut rig = Rig::spawn(world, Vec3::new(0.5, 1.0, 0.5), legs_and_head(), Box::new(goto));
        let result = rig.run_until_done(600).await;
        assert!(matches!(result, Some(Err(BotError::Unreachable { .. }))));
    }

    #[tokio::test]
    async fn buried_target_ends_unreachable_beside_it() {
        // The target sits inside a solid cube; the nearest open cell is (4, 1, 0).
        let world = std::sync::Arc::new(
            SimWorld::flat(0).with_fill(BlockPos::new(5, 1, -1), BlockPos::new(7, 3, 1), "stone"),
        );
        let target = BlockPos::new(6, 1, 0);
        let goto = GoTo::new(&env(&world), target, false).unwrap();
        let mut rig = Rig::spawn(world, Vec3::new(0.5, 1.0, 0.5), legs_and_head(), Box::new(goto));

        let result = rig.run_until_done(600).await;
        assert_eq!(result, Some(Err(BotError::Unreachable { target })));
        let pos = rig.body.state().position;
        assert!(pos.horizontal_distance(Vec3::new(4.5, 1.0, 0.5)) < 1.0, "stopped at {pos}");
    }
}
