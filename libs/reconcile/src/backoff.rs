//! Requeue backoff for failed reconciliations.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::{DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX};

/// Per-key exponential backoff.
///
/// The n-th consecutive failure of a key yields `base * 2^(n-1)`, capped at
/// `max`. A success clears the key.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Delay after the first failure.
    base: Duration,

    /// Delay ceiling.
    max: Duration,

    /// Consecutive failures by key.
    failures: BTreeMap<String, u32>,
}

impl Backoff {
    /// Create a new backoff tracker.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: BTreeMap::new(),
        }
    }

    /// Record a failure for a key.
    ///
    /// Returns how long to wait before retrying it.
    pub fn record_failure(&mut self, key: &str) -> Duration {
        let count = self.failures.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);

        let exponent = (*count - 1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Consecutive failures recorded for a key.
    pub fn failures(&self, key: &str) -> u32 {
        self.failures.get(key).copied().unwrap_or(0)
    }

    /// Clear failure tracking for a key (on success).
    pub fn clear(&mut self, key: &str) {
        self.failures.remove(key);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX)
    }
}
