use thiserror::Error;

use crate::actuation::Channel;
use crate::geometry::BlockPos;

/// Error type shared by every blockpilot crate.
///
/// Construction errors are raised before a run is registered; navigation and
/// confirmation errors end the owning behavior; [`BotError::Interrupted`] is
/// what a behavior sees when it is cancelled at its suspension point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BotError {
    #[error("behavior needs block access but no block oracle was supplied")]
    MissingBlockOracle,

    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    #[error("a run named '{0}' is already active")]
    AlreadyRunning(String),

    #[error("channel {channel} is held by '{owner}' at priority {priority}")]
    ChannelBusy {
        channel: Channel,
        owner: String,
        priority: i32,
    },

    #[error("no async runtime available to spawn the behavior")]
    NoRuntime,

    #[error("no path found")]
    PathNotFound,

    #[error("target {target} is unreachable")]
    Unreachable { target: BlockPos },

    #[error("no standable cell near the target")]
    NoApproachCell,

    #[error("placement at {pos} not confirmed after {ticks} ticks")]
    PlacementTimeout { pos: BlockPos, ticks: u32 },

    #[error("{what} timed out after {ticks} ticks")]
    Timeout { what: String, ticks: u32 },

    #[error("run interrupted")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_conflict() {
        let err = BotError::ChannelBusy {
            channel: Channel::Legs,
            owner: "go_to".into(),
            priority: 20,
        };
        let text = err.to_string();
        assert!(text.contains("legs"));
        assert!(text.contains("go_to"));
    }

    #[test]
    fn unreachable_mentions_target() {
        let err = BotError::Unreachable {
            target: BlockPos::new(1, 2, 3),
        };
        assert!(err.to_string().contains("[1, 2, 3]"));
    }
}
