//! [`BotConfig`] – every tunable of the agent core in one serde tree.
//!
//! Missing sections and fields fall back to their defaults, so a config file
//! only needs to name what it changes.

use std::sync::Arc;

use blockpilot_nav::NavConfig;
use blockpilot_physics::PhysicsConfig;
use blockpilot_types::BlockOracle;
use serde::{Deserialize, Serialize};

use crate::behaviors::{BehaviorConfig, BehaviorEnv};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub physics: PhysicsConfig,
    pub nav: NavConfig,
    pub behavior: BehaviorConfig,
    /// Fixed seed for the idle wander; random when absent.
    pub idle_seed: Option<u64>,
}

impl BotConfig {
    /// The environment behaviors are built in.
    pub fn behavior_env(&self, oracle: Option<Arc<dyn BlockOracle>>) -> BehaviorEnv {
        BehaviorEnv {
            oracle,
            behavior: self.behavior,
            nav: self.nav,
            idle_seed: self.idle_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: BotConfig = serde_json::from_str(
            r#"{"nav": {"search_radius": 16}, "behavior": {"reach": 3.5}, "idle_seed": 9}"#,
        )
        .unwrap();
        assert_eq!(cfg.nav.search_radius, 16);
        assert_eq!(cfg.nav.stall_limit, NavConfig::default().stall_limit);
        assert_eq!(cfg.behavior.reach, 3.5);
        assert_eq!(cfg.behavior.dig_ticks, 20);
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.idle_seed, Some(9));
    }

    #[test]
    fn behavior_env_carries_the_sections() {
        let cfg = BotConfig {
            idle_seed: Some(3),
            ..Default::default()
        };
        let env = cfg.behavior_env(None);
        assert!(env.oracle.is_none());
        assert_eq!(env.idle_seed, Some(3));
        assert_eq!(env.behavior, cfg.behavior);
    }
}
