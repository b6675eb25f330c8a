//! Per-run cancellation and the lifecycle vocabulary.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Monotonically increasing run identifier.
pub type RunId = u64;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The behavior returned, successfully or with an error.
    Completed,
    Cancelled,
    /// A higher-priority run took one of its channels.
    Preempted,
}

impl EndReason {
    fn code(self) -> u8 {
        match self {
            EndReason::Completed => 1,
            EndReason::Cancelled => 2,
            EndReason::Preempted => 3,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EndReason::Completed),
            2 => Some(EndReason::Cancelled),
            3 => Some(EndReason::Preempted),
            _ => None,
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Completed => write!(f, "completed"),
            EndReason::Cancelled => write!(f, "cancelled"),
            EndReason::Preempted => write!(f, "preempted"),
        }
    }
}

/// Lifecycle event, posted exactly once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEnded {
    pub name: String,
    pub run_id: RunId,
    pub reason: EndReason,
    pub ended_at: DateTime<Utc>,
}

/// Cancellation flag of one run.  The first requested reason sticks.
#[derive(Debug, Default)]
pub struct RunControl {
    reason: AtomicU8,
    notify: Notify,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop.  Returns false when a reason was already set.
    pub fn request(&self, reason: EndReason) -> bool {
        let won = self
            .reason
            .compare_exchange(0, reason.code(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.notify.notify_one();
        }
        won
    }

    pub fn reason(&self) -> Option<EndReason> {
        EndReason::from_code(self.reason.load(Ordering::Acquire))
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves once a stop has been requested.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reason_wins() {
        let control = RunControl::new();
        assert_eq!(control.reason(), None);
        assert!(control.request(EndReason::Preempted));
        assert!(!control.request(EndReason::Cancelled));
        assert_eq!(control.reason(), Some(EndReason::Preempted));
    }

    #[tokio::test]
    async fn cancelled_resolves_after_request() {
        let control = std::sync::Arc::new(RunControl::new());
        let waiter = {
            let control = control.clone();
            tokio::spawn(async move { control.cancelled().await })
        };
        tokio::task::yield_now().await;
        control.request(EndReason::Cancelled);
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke")
            .expect("waiter did not panic");
    }

    #[test]
    fn reason_display() {
        assert_eq!(EndReason::Preempted.to_string(), "preempted");
        assert_eq!(EndReason::Completed.to_string(), "completed");
    }
}
