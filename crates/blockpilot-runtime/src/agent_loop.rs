//! [`AgentLoop`] – the per-tick driver that ties the core together.
//!
//! Each call to [`AgentLoop::tick`]:
//!
//! 1. **Observe** – build a [`WorldSnapshot`] from the body state, the last
//!    commanded head angles, and the entities supplied by the caller.
//! 2. **Decide** – [`Scheduler::advance`] hands the snapshot to every running
//!    behavior and merges their outputs into one [`InputFrame`].
//! 3. **Act** – the frame drives [`BodyController::apply`]; when the loop owns
//!    a [`SimWorld`], the frame's hand pulses are applied to it as well.
//!
//! Behaviors run as tokio tasks and answer between ticks, so the caller must
//! give the runtime a chance to run them (the CLI sleeps between ticks).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use blockpilot_physics::SimWorld;
//! use blockpilot_runtime::{AgentLoop, BotConfig, Intent};
//! use blockpilot_types::Vec3;
//!
//! # async fn demo() -> Result<(), blockpilot_types::BotError> {
//! let world = Arc::new(SimWorld::flat(0));
//! let mut agent = AgentLoop::with_sim(&BotConfig::default(), world, Vec3::new(0.5, 1.0, 0.5));
//! agent.submit(Intent::parse(&["go_to", "5", "1", "3"])?)?;
//! loop {
//!     agent.tick(&[]);
//!     tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//!     if agent.try_next_event().is_some() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use blockpilot_kernel::{BehaviorEnded, RunId, RunInfo, Scheduler};
use blockpilot_physics::{BodyController, Collider, Physics, PhysicsState, SimWorld};
use blockpilot_types::{BlockOracle, BotError, EntityInfo, InputFrame, Vec3, WorldSnapshot};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::behaviors::BehaviorEnv;
use crate::config::BotConfig;
use crate::intent::Intent;

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub frame: InputFrame,
    pub state: PhysicsState,
}

pub struct AgentLoop {
    session: Uuid,
    scheduler: Scheduler,
    events: mpsc::UnboundedReceiver<BehaviorEnded>,
    body: Arc<BodyController>,
    oracle: Option<Arc<dyn BlockOracle>>,
    /// Applies hand pulses when the world is simulated in-process.
    sim: Option<Arc<SimWorld>>,
    env: BehaviorEnv,
    tick: u64,
    selected_slot: u8,
}

impl AgentLoop {
    /// A loop over an external world.  Without an oracle the body flies freely
    /// and only block-free behaviors can start.
    pub fn new(config: &BotConfig, oracle: Option<Arc<dyn BlockOracle>>, spawn: Vec3) -> Self {
        let (scheduler, events) = Scheduler::new();
        let session = Uuid::new_v4();
        info!(%session, x = spawn.x, y = spawn.y, z = spawn.z, "agent loop created");
        Self {
            session,
            scheduler,
            events,
            body: Arc::new(BodyController::new(
                Physics::new(config.physics),
                PhysicsState::at(spawn),
            )),
            env: config.behavior_env(oracle.clone()),
            oracle,
            sim: None,
            tick: 0,
            selected_slot: 0,
        }
    }

    /// A loop over an in-process [`SimWorld`], which is both the block oracle
    /// and the sink for hand actions.
    pub fn with_sim(config: &BotConfig, world: Arc<SimWorld>, spawn: Vec3) -> Self {
        let oracle: Arc<dyn BlockOracle> = world.clone();
        let mut agent = Self::new(config, Some(oracle), spawn);
        agent.sim = Some(world);
        agent
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn body(&self) -> Arc<BodyController> {
        Arc::clone(&self.body)
    }

    pub fn state(&self) -> PhysicsState {
        self.body.state()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Validate `intent`, build its behavior, and start it.
    ///
    /// # Errors
    ///
    /// Construction errors from [`Intent::into_launch`] and admission errors
    /// from [`Scheduler::start`].  Either way nothing is registered.
    pub fn submit(&self, intent: Intent) -> Result<RunId, BotError> {
        let launch = intent.into_launch(&self.env)?;
        debug!(session = %self.session, run = %launch.name, "submitting intent");
        self.scheduler
            .start(launch.name, launch.behavior, launch.channels, launch.priority)
    }

    pub fn cancel(&self, name: &str) -> bool {
        self.scheduler.cancel(name)
    }

    pub fn cancel_all(&self) -> usize {
        self.scheduler.cancel_all()
    }

    pub fn active_runs(&self) -> Vec<RunInfo> {
        self.scheduler.active_runs()
    }

    /// The next lifecycle event, if one is waiting.
    pub fn try_next_event(&mut self) -> Option<BehaviorEnded> {
        self.events.try_recv().ok()
    }

    /// Wait for the next lifecycle event.
    pub async fn next_event(&mut self) -> Option<BehaviorEnded> {
        self.events.recv().await
    }

    /// Run one observe–decide–act cycle.
    pub fn tick(&mut self, entities: &[EntityInfo]) -> TickReport {
        let tick = self.tick;
        let body = self.body.state();
        let head = self.scheduler.frame();
        let snapshot = WorldSnapshot {
            tick,
            position: body.position,
            velocity: body.velocity,
            yaw: head.yaw,
            pitch: head.pitch,
            grounded: body.grounded,
            selected_slot: self.selected_slot,
            entities: entities.to_vec(),
        };

        let frame = self.scheduler.advance(snapshot);
        if let Some(slot) = frame.hotbar_slot {
            self.selected_slot = slot;
        }

        let colliders: Vec<Collider> = entities.iter().map(Collider::from).collect();
        let state = self.body.apply(&frame, self.oracle.as_deref(), &colliders);
        if let Some(sim) = &self.sim
            && sim.apply_hands(&frame)
        {
            debug!(session = %self.session, tick, "world changed");
        }

        self.tick += 1;
        TickReport { tick, frame, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpilot_kernel::EndReason;
    use blockpilot_types::BlockPos;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn open_ground() -> AgentLoop {
        AgentLoop::with_sim(
            &BotConfig::default(),
            Arc::new(SimWorld::flat(0)),
            Vec3::new(0.5, 1.0, 0.5),
        )
    }

    /// Tick until a lifecycle event arrives.
    async fn run_to_event(agent: &mut AgentLoop, max: usize) -> Option<BehaviorEnded> {
        for _ in 0..max {
            agent.tick(&[]);
            settle().await;
            if let Some(event) = agent.try_next_event() {
                return Some(event);
            }
        }
        None
    }

    #[tokio::test]
    async fn go_to_on_open_ground_completes() {
        let mut agent = open_ground();
        let run_id = agent
            .submit(Intent::GoTo {
                x: 5.0,
                y: 1.0,
                z: 3.0,
                sprint: false,
            })
            .unwrap();

        let event = run_to_event(&mut agent, 400).await.expect("go_to never ended");
        assert_eq!(event.name, "go_to");
        assert_eq!(event.run_id, run_id);
        assert_eq!(event.reason, EndReason::Completed);
        let pos = agent.state().position;
        assert!(pos.horizontal_distance(Vec3::new(5.5, 1.0, 3.5)) < 1.0, "ended at {pos}");
        assert!(agent.active_runs().is_empty());
    }

    #[tokio::test]
    async fn invalid_intent_registers_nothing() {
        let agent = open_ground();
        let err = agent.submit(Intent::SwitchSlot { slot: 12 }).unwrap_err();
        assert!(matches!(err, BotError::InvalidIntent(_)));
        assert!(agent.active_runs().is_empty());
    }

    #[tokio::test]
    async fn block_behaviors_need_a_world() {
        let agent = AgentLoop::new(&BotConfig::default(), None, Vec3::new(0.0, 10.0, 0.0));
        let err = agent.submit(Intent::Attack { entity_id: 1 }).unwrap_err();
        assert_eq!(err, BotError::MissingBlockOracle);
        assert!(agent.submit(Intent::Idle).is_ok());
    }

    #[tokio::test]
    async fn higher_priority_intent_preempts_idle() {
        let mut agent = open_ground();
        agent.submit(Intent::Idle).unwrap();
        agent.tick(&[]);
        settle().await;

        agent
            .submit(Intent::GoTo {
                x: 3.0,
                y: 1.0,
                z: 0.0,
                sprint: false,
            })
            .unwrap();
        settle().await;
        let event = agent.try_next_event().expect("idle should have ended");
        assert_eq!(event.name, "idle");
        assert_eq!(event.reason, EndReason::Preempted);
        assert_eq!(agent.scheduler().owner_of(blockpilot_types::Channel::Legs).as_deref(), Some("go_to"));
    }

    #[tokio::test]
    async fn mining_changes_the_sim_world() {
        let world = Arc::new(SimWorld::flat(0).with_block(BlockPos::new(2, 1, 0), "dirt"));
        let mut agent = AgentLoop::with_sim(&BotConfig::default(), world.clone(), Vec3::new(0.5, 1.0, 0.5));
        agent
            .submit(Intent::Mine {
                x: 2.0,
                y: 1.0,
                z: 0.0,
                slot: Some(1),
            })
            .unwrap();

        let event = run_to_event(&mut agent, 100).await.expect("mine never ended");
        assert_eq!(event.reason, EndReason::Completed);
        assert!(!world.is_solid_at(BlockPos::new(2, 1, 0)));
        assert_eq!(agent.selected_slot, 1);
    }

    #[tokio::test]
    async fn ticks_count_up_and_report_the_frame() {
        let mut agent = open_ground();
        agent.submit(Intent::SwitchSlot { slot: 6 }).unwrap();
        let first = agent.tick(&[]);
        settle().await;
        let second = agent.tick(&[]);
        assert_eq!((first.tick, second.tick), (0, 1));
        assert_eq!(first.frame.hotbar_slot, None);
        assert_eq!(second.frame.hotbar_slot, Some(6));
        assert_eq!(agent.current_tick(), 2);
    }
}
