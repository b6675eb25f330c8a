//! Actuation channels, sparse per-behavior updates, and the merged frame.
//!
//! A behavior never writes the whole input frame.  It emits a
//! [`PartialActuation`] whose fields are grouped by [`Channel`]; the scheduler
//! layers those groups onto the [`InputFrame`] according to channel ownership.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{BlockPos, Face};
use crate::world::EntityId;

// ─────────────────────────────────────────────────────────────────────────────
// Channel
// ─────────────────────────────────────────────────────────────────────────────

/// A disjoint class of actuation.  Exactly one active run may own a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// forward / back / left / right / jump / sneak / sprint
    Legs,
    /// yaw / pitch
    Head,
    /// attack / use / targets / hotbar slot
    Hands,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Legs, Channel::Head, Channel::Hands];

    /// Dense index, usable for fixed-size per-channel tables.
    pub fn index(&self) -> usize {
        *self as usize
    }

    fn bit(&self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Legs => write!(f, "legs"),
            Channel::Head => write!(f, "head"),
            Channel::Hands => write!(f, "hands"),
        }
    }
}

/// A set of [`Channel`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelSet(u8);

impl ChannelSet {
    pub const EMPTY: ChannelSet = ChannelSet(0);
    pub const ALL: ChannelSet = ChannelSet(0b111);

    pub fn of(channels: &[Channel]) -> Self {
        channels.iter().fold(Self::EMPTY, |set, c| set.with(*c))
    }

    pub fn with(self, channel: Channel) -> Self {
        ChannelSet(self.0 | channel.bit())
    }

    pub fn insert(&mut self, channel: Channel) {
        self.0 |= channel.bit();
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    pub fn intersects(&self, other: ChannelSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl fmt::Debug for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        ChannelSet::EMPTY.with(channel)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hand targets
// ─────────────────────────────────────────────────────────────────────────────

/// Progress marker for a block being dug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakStage {
    Start,
    Continue,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakTarget {
    pub pos: BlockPos,
    pub stage: BreakStage,
}

/// Request to fill the air cell `pos` by clicking `face` of its supporting block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceTarget {
    pub pos: BlockPos,
    pub face: Face,
}

// ─────────────────────────────────────────────────────────────────────────────
// PartialActuation
// ─────────────────────────────────────────────────────────────────────────────

/// [`Channel::Legs`] fields.  `None` leaves the frame value unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LegsActuation {
    pub forward: Option<bool>,
    pub back: Option<bool>,
    pub left: Option<bool>,
    pub right: Option<bool>,
    pub jump: Option<bool>,
    pub sneak: Option<bool>,
    pub sprint: Option<bool>,
}

impl LegsActuation {
    /// Every movement flag explicitly released.
    pub fn stop() -> Self {
        Self {
            forward: Some(false),
            back: Some(false),
            left: Some(false),
            right: Some(false),
            jump: Some(false),
            sneak: Some(false),
            sprint: Some(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// [`Channel::Head`] fields, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadActuation {
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
}

impl HeadActuation {
    pub fn look(yaw: f64, pitch: f64) -> Self {
        Self {
            yaw: Some(yaw),
            pitch: Some(pitch),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.yaw.is_none() && self.pitch.is_none()
    }
}

/// [`Channel::Hands`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandsActuation {
    pub attack: Option<bool>,
    pub use_item: Option<bool>,
    pub attack_target: Option<EntityId>,
    pub break_target: Option<BreakTarget>,
    pub place_target: Option<PlaceTarget>,
    pub interact_target: Option<EntityId>,
    pub hotbar_slot: Option<u8>,
}

impl HandsActuation {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The sparse update a behavior emits for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialActuation {
    pub legs: LegsActuation,
    pub head: HeadActuation,
    pub hands: HandsActuation,
}

impl PartialActuation {
    /// Channels that carry at least one populated field.
    pub fn channels(&self) -> ChannelSet {
        let mut set = ChannelSet::EMPTY;
        if !self.legs.is_empty() {
            set.insert(Channel::Legs);
        }
        if !self.head.is_empty() {
            set.insert(Channel::Head);
        }
        if !self.hands.is_empty() {
            set.insert(Channel::Hands);
        }
        set
    }

    /// Drop every group that is not in `allowed`.
    pub fn restricted_to(mut self, allowed: ChannelSet) -> Self {
        if !allowed.contains(Channel::Legs) {
            self.legs = LegsActuation::default();
        }
        if !allowed.contains(Channel::Head) {
            self.head = HeadActuation::default();
        }
        if !allowed.contains(Channel::Hands) {
            self.hands = HandsActuation::default();
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InputFrame
// ─────────────────────────────────────────────────────────────────────────────

/// Held movement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MovementControls {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sneak: bool,
    pub sprint: bool,
}

/// The full actuation for one tick, after merging.
///
/// Movement keys, look angles, and the `attack` / `use_item` holds persist
/// between ticks.  The target fields are one-tick pulses; see
/// [`InputFrame::clear_pulses`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    pub controls: MovementControls,
    pub yaw: f64,
    pub pitch: f64,
    pub attack: bool,
    pub use_item: bool,
    pub attack_target: Option<EntityId>,
    pub break_target: Option<BreakTarget>,
    pub place_target: Option<PlaceTarget>,
    pub interact_target: Option<EntityId>,
    pub hotbar_slot: Option<u8>,
}

impl InputFrame {
    /// Layer the `channel` group of `partial` onto this frame.
    pub fn apply(&mut self, channel: Channel, partial: &PartialActuation) {
        match channel {
            Channel::Legs => {
                let legs = &partial.legs;
                let c = &mut self.controls;
                set_if(&mut c.forward, legs.forward);
                set_if(&mut c.back, legs.back);
                set_if(&mut c.left, legs.left);
                set_if(&mut c.right, legs.right);
                set_if(&mut c.jump, legs.jump);
                set_if(&mut c.sneak, legs.sneak);
                set_if(&mut c.sprint, legs.sprint);
            }
            Channel::Head => {
                set_if(&mut self.yaw, partial.head.yaw);
                set_if(&mut self.pitch, partial.head.pitch);
            }
            Channel::Hands => {
                let hands = &partial.hands;
                set_if(&mut self.attack, hands.attack);
                set_if(&mut self.use_item, hands.use_item);
                if hands.attack_target.is_some() {
                    self.attack_target = hands.attack_target;
                }
                if hands.break_target.is_some() {
                    self.break_target = hands.break_target;
                }
                if hands.place_target.is_some() {
                    self.place_target = hands.place_target;
                }
                if hands.interact_target.is_some() {
                    self.interact_target = hands.interact_target;
                }
                if hands.hotbar_slot.is_some() {
                    self.hotbar_slot = hands.hotbar_slot;
                }
            }
        }
    }

    /// Return `channel`'s fields to their neutral state.  Look angles are
    /// kept: releasing the head does not snap it back.
    pub fn reset(&mut self, channel: Channel) {
        match channel {
            Channel::Legs => self.controls = MovementControls::default(),
            Channel::Head => {}
            Channel::Hands => {
                self.attack = false;
                self.use_item = false;
                self.clear_pulses();
            }
        }
    }

    /// Clear the one-tick target fields.
    pub fn clear_pulses(&mut self) {
        self.attack_target = None;
        self.break_target = None;
        self.place_target = None;
        self.interact_target = None;
        self.hotbar_slot = None;
    }
}

fn set_if<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}
