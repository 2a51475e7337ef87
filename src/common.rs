use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::KlimaxError;

pub(crate) const DEFAULT_MAX: i64 = 100;
pub(crate) const DEFAULT_DURATION: Duration = Duration::from_secs(60);
pub(crate) const DEFAULT_PREFIX: &str = "LIMIT";
pub(crate) const DEFAULT_CLEAN_DURATION: Duration = Duration::from_secs(60);

/// One rung of the escalation ladder: a quota over a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rung {
    /// Maximum number of calls allowed inside one window.
    pub quota: i64,
    /// Length of the fixed window.
    pub window: Duration,
}

impl Rung {
    pub(crate) fn window_ms(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }
}

/// A validated, ordered escalation ladder. Rung 0 is the base policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Policy {
    rungs: Vec<Rung>,
}

impl Policy {
    /// Interpret a caller-supplied flat vector of `(quota, window_ms)` pairs.
    ///
    /// An empty vector falls back to a single rung built from the limiter's
    /// configured defaults.
    pub(crate) fn resolve(
        policy: &[i64],
        default_max: i64,
        default_duration: Duration,
    ) -> Result<Self, KlimaxError> {
        if policy.is_empty() {
            return Ok(Self {
                rungs: vec![Rung {
                    quota: default_max,
                    window: default_duration,
                }],
            });
        }

        if policy.len() % 2 != 0 {
            return Err(KlimaxError::UnpairedPolicy);
        }

        if policy.iter().any(|v| *v <= 0) {
            return Err(KlimaxError::NonPositivePolicy);
        }

        let rungs = policy
            .chunks_exact(2)
            .map(|pair| Rung {
                quota: pair[0],
                window: Duration::from_millis(pair[1] as u64),
            })
            .collect();

        Ok(Self { rungs })
    } // end method resolve

    pub(crate) fn len(&self) -> usize {
        self.rungs.len()
    }

    /// Rung at `index`, clamped to the last rung. A status entry can outlive a
    /// caller switching to a shorter ladder.
    pub(crate) fn rung(&self, index: usize) -> Rung {
        self.rungs[index.min(self.rungs.len() - 1)]
    }

    pub(crate) fn clamp_index(&self, index: usize) -> usize {
        index.min(self.rungs.len() - 1)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Rung> {
        self.rungs.iter()
    }
}

/// Outcome of a single [`get`](crate::RateLimiter::get) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitResult {
    /// Quota of the window the call was charged against.
    pub total: i64,
    /// `total - count`, clamped at `-1` once the window is exceeded.
    pub remaining: i64,
    /// Length of the window the call was charged against.
    pub duration: Duration,
    /// Absolute instant the current window ends.
    pub reset: SystemTime,
}

pub(crate) fn millis_to_system_time(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}
