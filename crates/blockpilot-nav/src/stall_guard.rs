//! [`StallGuard`] – detects replanning that no longer gets closer.
//!
//! Each partial replan reports how far its endpoint still is from the target.
//! The guard counts consecutive reports that fail to beat the best distance
//! seen so far; once the count reaches the limit the target is considered
//! unreachable.
//!
//! # Example
//!
//! ```rust
//! use blockpilot_nav::StallGuard;
//!
//! let mut guard = StallGuard::new(3);
//!
//! assert!(!guard.record(8.0)); // baseline
//! assert!(!guard.record(8.0));
//! assert!(!guard.record(8.0));
//! assert!(guard.record(8.0)); // third non-improving replan → stalled
//!
//! guard.reset();
//! assert!(!guard.record(8.0));
//! ```

/// Minimum gain that counts as progress.
const MIN_IMPROVEMENT: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct StallGuard {
    limit: u32,
    best: Option<f64>,
    strikes: u32,
}

impl StallGuard {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            best: None,
            strikes: 0,
        }
    }

    /// Record the remaining distance after a partial replan.
    ///
    /// Returns `true` once `limit` consecutive records have failed to improve
    /// on the best distance.
    pub fn record(&mut self, distance: f64) -> bool {
        match self.best {
            Some(best) if distance > best - MIN_IMPROVEMENT => self.strikes += 1,
            _ => {
                self.best = Some(distance);
                self.strikes = 0;
            }
        }
        self.is_stalled()
    }

    pub fn is_stalled(&self) -> bool {
        self.strikes >= self.limit
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    /// Forget all history.  Called whenever a complete path is found.
    pub fn reset(&mut self) {
        self.best = None;
        self.strikes = 0;
    }
}
