//! [`Intent`] – the command vocabulary and its dispatch table.
//!
//! An intent arrives either as JSON (`{"action": "go_to", "params": {...}}`)
//! or as whitespace-separated words (`go_to 10 64 -3 sprint`).  It is
//! validated before anything is registered, then turned into a [`Launch`]:
//! the behavior plus the run name, channels, and priority it starts under.
//!
//! | Action | Channels | Priority |
//! |---|---|---|
//! | `idle` | legs, head | 0 |
//! | `look_at_entity`, `look_at_pos` | head | 10 |
//! | `go_to`, `follow` | legs, head | 20 |
//! | `use_item`, `switch_slot` | hands | 25 |
//! | `mine`, `place_block` | all | 30 |
//! | `attack` | all | 40 |

use blockpilot_kernel::Behavior;
use blockpilot_types::{BlockPos, BotError, Channel, ChannelSet, EntityId, Face, Vec3};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use crate::behaviors::hands::MAX_SLOT;
use crate::behaviors::{
    Attack, BehaviorEnv, Follow, GoTo, Idle, LookAt, LookTarget, Mine, PlaceBlock, SwitchSlot,
    UseItem,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Intent {
    /// Wander in place.
    Idle,
    /// Walk to the block cell containing `(x, y, z)`.
    GoTo {
        x: f64,
        y: f64,
        z: f64,
        #[serde(default)]
        sprint: bool,
    },
    /// Stay within `distance` blocks of an entity.
    Follow {
        entity_id: EntityId,
        #[serde(default)]
        distance: Option<f64>,
    },
    LookAtEntity { entity_id: EntityId },
    LookAtPos { x: f64, y: f64, z: f64 },
    Attack { entity_id: EntityId },
    Mine {
        x: f64,
        y: f64,
        z: f64,
        #[serde(default)]
        slot: Option<u8>,
    },
    /// Place against `face` (0..=5: down, up, north, south, west, east).
    PlaceBlock {
        x: f64,
        y: f64,
        z: f64,
        face: u8,
        #[serde(default)]
        slot: Option<u8>,
    },
    UseItem {
        #[serde(default)]
        slot: Option<u8>,
        #[serde(default)]
        ticks: Option<u32>,
    },
    SwitchSlot { slot: u8 },
}

/// A validated intent, ready for [`Scheduler::start`].
///
/// [`Scheduler::start`]: blockpilot_kernel::Scheduler::start
pub struct Launch {
    pub name: String,
    pub behavior: Box<dyn Behavior>,
    pub channels: ChannelSet,
    pub priority: i32,
}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launch")
            .field("name", &self.name)
            .field("channels", &self.channels)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Largest accepted |x| and |z|.
pub const WORLD_BORDER: f64 = 30_000_000.0;
/// Accepted y range.
pub const MIN_Y: f64 = -2048.0;
pub const MAX_Y: f64 = 2048.0;

fn invalid(msg: impl Into<String>) -> BotError {
    BotError::InvalidIntent(msg.into())
}

impl Intent {
    /// Parse the word form, e.g. `["mine", "3", "64", "-2", "1"]`.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Result<Intent, BotError> {
        let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
        let Some((&action, args)) = words.split_first() else {
            return Err(invalid("empty command"));
        };
        let args = Args { action, args };

        let intent = match action {
            "idle" => {
                args.arity(0, 0)?;
                Intent::Idle
            }
            "go_to" => {
                args.arity(3, 4)?;
                let sprint = match args.get(3) {
                    None => false,
                    Some("sprint") => true,
                    Some(other) => return Err(invalid(format!("go_to: expected 'sprint', got '{other}'"))),
                };
                Intent::GoTo {
                    x: args.num(0)?,
                    y: args.num(1)?,
                    z: args.num(2)?,
                    sprint,
                }
            }
            "follow" => {
                args.arity(1, 2)?;
                Intent::Follow {
                    entity_id: args.num(0)?,
                    distance: args.opt(1)?,
                }
            }
            "look_at_entity" => {
                args.arity(1, 1)?;
                Intent::LookAtEntity { entity_id: args.num(0)? }
            }
            "look_at_pos" => {
                args.arity(3, 3)?;
                Intent::LookAtPos {
                    x: args.num(0)?,
                    y: args.num(1)?,
                    z: args.num(2)?,
                }
            }
            "attack" => {
                args.arity(1, 1)?;
                Intent::Attack { entity_id: args.num(0)? }
            }
            "mine" => {
                args.arity(3, 4)?;
                Intent::Mine {
                    x: args.num(0)?,
                    y: args.num(1)?,
                    z: args.num(2)?,
                    slot: args.opt(3)?,
                }
            }
            "place_block" => {
                args.arity(4, 5)?;
                Intent::PlaceBlock {
                    x: args.num(0)?,
                    y: args.num(1)?,
                    z: args.num(2)?,
                    face: args.num(3)?,
                    slot: args.opt(4)?,
                }
            }
            "use_item" => {
                args.arity(0, 2)?;
                Intent::UseItem {
                    slot: args.opt(0)?,
                    ticks: args.opt(1)?,
                }
            }
            "switch_slot" => {
                args.arity(1, 1)?;
                Intent::SwitchSlot { slot: args.num(0)? }
            }
            other => return Err(invalid(format!("unknown action '{other}'"))),
        };
        intent.validate()?;
        Ok(intent)
    }

    /// Parse and validate the JSON form.
    pub fn from_json(text: &str) -> Result<Intent, BotError> {
        let intent: Intent = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
        intent.validate()?;
        Ok(intent)
    }

    /// JSON schema of the intent vocabulary.
    pub fn schema() -> serde_json::Value {
        serde_json::to_value(schema_for!(Intent)).unwrap_or(serde_json::Value::Null)
    }

    /// The run name this intent starts under.
    pub fn action(&self) -> &'static str {
        match self {
            Intent::Idle => "idle",
            Intent::GoTo { .. } => "go_to",
            Intent::Follow { .. } => "follow",
            Intent::LookAtEntity { .. } => "look_at_entity",
            Intent::LookAtPos { .. } => "look_at_pos",
            Intent::Attack { .. } => "attack",
            Intent::Mine { .. } => "mine",
            Intent::PlaceBlock { .. } => "place_block",
            Intent::UseItem { .. } => "use_item",
            Intent::SwitchSlot { .. } => "switch_slot",
        }
    }

    /// Channels and priority from the dispatch table.
    pub fn grant(&self) -> (ChannelSet, i32) {
        let movement = ChannelSet::of(&[Channel::Legs, Channel::Head]);
        match self {
            Intent::Idle => (movement, 0),
            Intent::LookAtEntity { .. } | Intent::LookAtPos { .. } => (Channel::Head.into(), 10),
            Intent::GoTo { .. } | Intent::Follow { .. } => (movement, 20),
            Intent::UseItem { .. } | Intent::SwitchSlot { .. } => (Channel::Hands.into(), 25),
            Intent::Mine { .. } | Intent::PlaceBlock { .. } => (ChannelSet::ALL, 30),
            Intent::Attack { .. } => (ChannelSet::ALL, 40),
        }
    }

    /// Reject values no behavior could act on.
    pub fn validate(&self) -> Result<(), BotError> {
        match *self {
            Intent::GoTo { x, y, z, .. }
            | Intent::LookAtPos { x, y, z }
            | Intent::Mine { x, y, z, .. }
            | Intent::PlaceBlock { x, y, z, .. } => {
                if !Vec3::new(x, y, z).is_finite() {
                    return Err(invalid(format!("{}: coordinates must be finite", self.action())));
                }
                if x.abs() > WORLD_BORDER || z.abs() > WORLD_BORDER || !(MIN_Y..=MAX_Y).contains(&y) {
                    return Err(invalid(format!(
                        "{}: ({x}, {y}, {z}) is outside the world (|x|, |z| <= {WORLD_BORDER}, {MIN_Y} <= y <= {MAX_Y})",
                        self.action()
                    )));
                }
            }
            Intent::Follow {
                distance: Some(d), ..
            } if !(d.is_finite() && d > 0.0) => {
                return Err(invalid(format!("follow: distance must be positive, got {d}")));
            }
            _ => {}
        }
        if let Intent::PlaceBlock { face, .. } = *self
            && Face::from_index(face).is_none()
        {
            return Err(invalid(format!("place_block: face {face} is out of range 0..=5")));
        }
        let slot = match *self {
            Intent::Mine { slot, .. } | Intent::PlaceBlock { slot, .. } | Intent::UseItem { slot, .. } => slot,
            Intent::SwitchSlot { slot } => Some(slot),
            _ => None,
        };
        if let Some(slot) = slot
            && slot > MAX_SLOT
        {
            return Err(invalid(format!("{}: slot {slot} is out of range 0..={MAX_SLOT}", self.action())));
        }
        Ok(())
    }

    /// Validate and build the behavior.
    ///
    /// # Errors
    ///
    /// [`BotError::InvalidIntent`] for bad values, or
    /// [`BotError::MissingBlockOracle`] when the behavior needs block access
    /// and `env` has none.
    pub fn into_launch(self, env: &BehaviorEnv) -> Result<Launch, BotError> {
        self.validate()?;
        let (channels, priority) = self.grant();
        let name = self.action().to_string();
        let cell = |x: f64, y: f64, z: f64| BlockPos::containing(Vec3::new(x, y, z));

        let behavior: Box<dyn Behavior> = match self {
            Intent::Idle => Box::new(Idle::new(env)),
            Intent::GoTo { x, y, z, sprint } => Box::new(GoTo::new(env, cell(x, y, z), sprint)?),
            Intent::Follow { entity_id, distance } => Box::new(Follow::new(
                env,
                entity_id,
                distance.unwrap_or(env.behavior.follow_distance),
            )?),
            Intent::LookAtEntity { entity_id } => {
                Box::new(LookAt::new(env, LookTarget::Entity(entity_id)))
            }
            Intent::LookAtPos { x, y, z } => {
                Box::new(LookAt::new(env, LookTarget::Position(Vec3::new(x, y, z))))
            }
            Intent::Attack { entity_id } => Box::new(Attack::new(env, entity_id)?),
            Intent::Mine { x, y, z, slot } => Box::new(Mine::new(env, cell(x, y, z), slot)?),
            Intent::PlaceBlock { x, y, z, face, slot } => {
                let face = Face::from_index(face)
                    .ok_or_else(|| invalid(format!("place_block: face {face} is out of range 0..=5")))?;
                Box::new(PlaceBlock::new(env, cell(x, y, z), face, slot)?)
            }
            Intent::UseItem { slot, ticks } => Box::new(UseItem::new(slot, ticks)?),
            Intent::SwitchSlot { slot } => Box::new(SwitchSlot::new(slot)?),
        };
        Ok(Launch {
            name,
            behavior,
            channels,
            priority,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Word parsing
// ─────────────────────────────────────────────────────────────────────────────

struct Args<'a> {
    action: &'a str,
    args: &'a [&'a str],
}

impl Args<'_> {
    fn arity(&self, min: usize, max: usize) -> Result<(), BotError> {
        let n = self.args.len();
        if n < min || n > max {
            let expected = if min == max {
                format!("{min}")
            } else {
                format!("{min} to {max}")
            };
            return Err(invalid(format!(
                "{}: expected {expected} arguments, got {n}",
                self.action
            )));
        }
        Ok(())
    }

    fn get(&self, i: usize) -> Option<&str> {
        self.args.get(i).copied()
    }

    fn num<T: std::str::FromStr>(&self, i: usize) -> Result<T, BotError> {
        let raw = self.get(i).unwrap_or_default();
        raw.parse()
            .map_err(|_| invalid(format!("{}: '{raw}' is not a valid number", self.action)))
    }

    fn opt<T: std::str::FromStr>(&self, i: usize) -> Result<Option<T>, BotError> {
        match self.get(i) {
            Some(_) => self.num(i).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpilot_physics::SimWorld;
    use std::sync::Arc;

    fn words(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    fn env_with_world() -> BehaviorEnv {
        let oracle: Arc<dyn blockpilot_types::BlockOracle> = Arc::new(SimWorld::flat(0));
        BehaviorEnv::new(Some(oracle))
    }

    #[test]
    fn parses_the_word_form() {
        assert_eq!(
            Intent::parse(&words("go_to 10 64 -3 sprint")).unwrap(),
            Intent::GoTo {
                x: 10.0,
                y: 64.0,
                z: -3.0,
                sprint: true
            }
        );
        assert_eq!(
            Intent::parse(&words("place_block 1 2 3 4")).unwrap(),
            Intent::PlaceBlock {
                x: 1.0,
                y: 2.0,
                z: 3.0,
                face: 4,
                slot: None
            }
        );
        assert_eq!(
            Intent::parse(&words("use_item 2")).unwrap(),
            Intent::UseItem {
                slot: Some(2),
                ticks: None
            }
        );
        assert_eq!(Intent::parse(&["idle"]).unwrap(), Intent::Idle);
    }

    #[test]
    fn rejects_bad_words() {
        for line in [
            "",
            "fly 1 2 3",
            "go_to 1 2",
            "go_to 1 2 3 run",
            "go_to x 2 3",
            "go_to 1 inf 3",
            "go_to 1e12 0 0",
            "go_to 1e9 1 0",
            "go_to 0 1e12 0",
            "mine 0 -3000 0",
            "look_at_pos 0 0 -30000001",
            "place_block 40000000 1 1 1",
            "follow 3 0",
            "follow 3 -1",
            "place_block 0 0 0 6",
            "switch_slot 9",
            "mine 1 2 3 11",
            "attack",
        ] {
            let result = Intent::parse(&words(line));
            assert!(
                matches!(result, Err(BotError::InvalidIntent(_))),
                "'{line}' should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn accepts_coordinates_up_to_the_world_border() {
        assert!(Intent::parse(&words("go_to 30000000 2048 -30000000")).is_ok());
        assert!(Intent::parse(&words("mine -29999999.5 -2048 0")).is_ok());
        let far = Intent::from_json(r#"{"action": "go_to", "params": {"x": 1e12, "y": 1, "z": 0}}"#);
        assert!(matches!(far, Err(BotError::InvalidIntent(_))));
    }

    #[test]
    fn json_form_uses_action_and_params() {
        let intent = Intent::from_json(r#"{"action": "mine", "params": {"x": 1, "y": 2, "z": 3}}"#).unwrap();
        assert_eq!(
            intent,
            Intent::Mine {
                x: 1.0,
                y: 2.0,
                z: 3.0,
                slot: None
            }
        );
        assert_eq!(Intent::from_json(r#"{"action": "idle"}"#).unwrap(), Intent::Idle);
        assert!(Intent::from_json(r#"{"action": "switch_slot", "params": {"slot": 12}}"#).is_err());

        let text = serde_json::to_string(&Intent::Attack { entity_id: 7 }).unwrap();
        assert_eq!(text, r#"{"action":"attack","params":{"entity_id":7}}"#);
    }

    #[test]
    fn schema_lists_every_action() {
        let schema = Intent::schema().to_string();
        for action in ["idle", "go_to", "follow", "look_at_pos", "place_block", "switch_slot"] {
            assert!(schema.contains(action), "schema is missing {action}");
        }
    }

    #[test]
    fn dispatch_table() {
        let env = env_with_world();
        let cases = [
            ("idle", ChannelSet::of(&[Channel::Legs, Channel::Head]), 0),
            ("look_at_pos 0 0 0", Channel::Head.into(), 10),
            ("look_at_entity 4", Channel::Head.into(), 10),
            ("go_to 1 1 1", ChannelSet::of(&[Channel::Legs, Channel::Head]), 20),
            ("follow 4", ChannelSet::of(&[Channel::Legs, Channel::Head]), 20),
            ("use_item", Channel::Hands.into(), 25),
            ("switch_slot 3", Channel::Hands.into(), 25),
            ("mine 1 1 1", ChannelSet::ALL, 30),
            ("place_block 1 1 1 1", ChannelSet::ALL, 30),
            ("attack 4", ChannelSet::ALL, 40),
        ];
        for (line, channels, priority) in cases {
            let launch = Intent::parse(&words(line)).unwrap().into_launch(&env).unwrap();
            assert_eq!(launch.channels, channels, "{line}");
            assert_eq!(launch.priority, priority, "{line}");
            assert_eq!(launch.name, words(line)[0]);
        }
    }

    #[test]
    fn block_behaviors_need_an_oracle() {
        let bare = BehaviorEnv::default();
        for line in ["go_to 1 1 1", "follow 2", "attack 2", "mine 1 1 1", "place_block 1 1 1 1"] {
            let result = Intent::parse(&words(line)).unwrap().into_launch(&bare);
            assert!(matches!(result, Err(BotError::MissingBlockOracle)), "{line}");
        }
        for line in ["idle", "look_at_entity 2", "use_item", "switch_slot 0"] {
            assert!(Intent::parse(&words(line)).unwrap().into_launch(&bare).is_ok(), "{line}");
        }
    }
}
