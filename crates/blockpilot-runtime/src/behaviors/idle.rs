//! Idle wandering: drift the gaze and take the occasional few steps.

use async_trait::async_trait;
use blockpilot_kernel::{Behavior, RunContext};
use blockpilot_types::{BotError, HeadActuation, LegsActuation, PartialActuation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::BehaviorEnv;
use super::aim::{turn_toward, wrap_degrees};

/// Chance per tick of picking a new gaze direction.
const REGAZE_CHANCE: f64 = 0.03;
/// Chance per tick of starting a walk while standing.
const WALK_CHANCE: f64 = 0.01;
const MAX_IDLE_PITCH: f64 = 25.0;

pub struct Idle {
    rng: StdRng,
    turn_rate: f64,
}

impl Idle {
    pub fn new(env: &BehaviorEnv) -> Self {
        let rng = match env.idle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            turn_rate: env.behavior.idle_turn_rate,
        }
    }
}

#[async_trait]
impl Behavior for Idle {
    async fn run(self: Box<Self>, ctx: RunContext) -> Result<(), BotError> {
        let Idle { mut rng, turn_rate } = *self;
        let first = ctx.next_snapshot().await?;
        let (mut yaw, mut pitch) = (first.yaw, first.pitch);
        let (mut goal_yaw, mut goal_pitch) = (yaw, 0.0);
        let mut walk_left = 0u32;

        loop {
            if rng.gen_bool(REGAZE_CHANCE) {
                goal_yaw = wrap_degrees(yaw + rng.gen_range(-120.0..120.0));
                goal_pitch = rng.gen_range(-MAX_IDLE_PITCH..MAX_IDLE_PITCH);
            }
            if walk_left == 0 && rng.gen_bool(WALK_CHANCE) {
                walk_left = rng.gen_range(4..12);
            }
            yaw = turn_toward(yaw, goal_yaw, turn_rate);
            pitch = turn_toward(pitch, goal_pitch, turn_rate);

            let partial = PartialActuation {
                legs: LegsActuation {
                    forward: Some(walk_left > 0),
                    ..LegsActuation::stop()
                },
                head: HeadActuation::look(yaw, pitch),
                ..Default::default()
            };
            walk_left = walk_left.saturating_sub(1);
            ctx.emit(partial).await?;
        }
    }
}
