use std::sync::Arc;
use std::time::Duration;

use crate::common::{
    DEFAULT_CLEAN_DURATION, DEFAULT_DURATION, DEFAULT_MAX, DEFAULT_PREFIX, LimitResult, Policy,
};
use crate::local::LocalRateLimiter;
use crate::redis::{RedisClient, RedisRateLimiter};
use crate::{Clock, KlimaxError, SystemClock};

/// Configuration for [`RateLimiter`].
///
/// Zero-equivalent values fall back to the documented defaults, so
/// `RateLimiterOptions::default()` (or struct-update syntax over it) is the
/// normal way to build one.
pub struct RateLimiterOptions {
    /// Quota used when `get` is called with an empty policy. Default 100.
    pub max: i64,
    /// Window used when `get` is called with an empty policy. Default 1 minute.
    pub duration: Duration,
    /// Key prefix for the Redis backend. Default `"LIMIT"`.
    pub prefix: String,
    /// When present, state lives in Redis behind this client; otherwise
    /// in-process.
    pub client: Option<Arc<dyn RedisClient>>,
    /// Sweep period of the in-process backend. Default 1 minute.
    pub clean_duration: Duration,
    /// Time source. Default wall clock; tests may inject a manual clock.
    pub clock: Arc<dyn Clock>,
}

impl Default for RateLimiterOptions {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX,
            duration: DEFAULT_DURATION,
            prefix: DEFAULT_PREFIX.to_string(),
            client: None,
            clean_duration: DEFAULT_CLEAN_DURATION,
            clock: Arc::new(SystemClock),
        }
    }
}

enum Backend {
    Local(LocalRateLimiter),
    Redis(RedisRateLimiter),
}

/// Multi-policy rate limiter with an escalation ladder.
///
/// See the crate docs for the policy model. All methods take `&self` and the
/// limiter is `Send + Sync`; share it behind an [`Arc`].
pub struct RateLimiter {
    backend: Backend,
    max: i64,
    duration: Duration,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Build a limiter. When `options.client` is set, this uploads the rate
    /// limiting script; a failed upload reports the backend unavailable.
    pub async fn new(options: RateLimiterOptions) -> Result<Self, KlimaxError> {
        let max = if options.max > 0 {
            options.max
        } else {
            DEFAULT_MAX
        };
        let duration = if options.duration > Duration::ZERO {
            options.duration
        } else {
            DEFAULT_DURATION
        };
        let clean_duration = if options.clean_duration > Duration::ZERO {
            options.clean_duration
        } else {
            DEFAULT_CLEAN_DURATION
        };

        let backend = match options.client {
            Some(client) => Backend::Redis(
                RedisRateLimiter::connect(client, options.prefix, options.clock).await?,
            ),
            None => Backend::Local(LocalRateLimiter::new(clean_duration, options.clock)),
        };

        Ok(Self {
            backend,
            max,
            duration,
        })
    } // end constructor

    /// Charge one call against `id` under the given policy and report the
    /// window state.
    ///
    /// `policy` is a flat list of `(quota, window_ms)` pairs forming the
    /// escalation ladder; empty means the configured default single rung.
    /// Validation errors are returned before any state changes.
    ///
    /// Dropping the returned future (or racing it against a timeout) cancels
    /// a Redis round-trip at its next I/O boundary; the in-process backend
    /// never awaits.
    pub async fn get(&self, id: &str, policy: &[i64]) -> Result<LimitResult, KlimaxError> {
        let policy = Policy::resolve(policy, self.max, self.duration)?;

        match &self.backend {
            Backend::Local(local) => Ok(local.get_limit(id, &policy)),
            Backend::Redis(redis) => redis.get_limit(id, &policy).await,
        }
    }

    /// Forget `id` entirely: counter window and ladder position. Best-effort
    /// against concurrent `get` calls.
    pub async fn remove(&self, id: &str) -> Result<(), KlimaxError> {
        match &self.backend {
            Backend::Local(local) => {
                local.remove(id);
                Ok(())
            }
            Backend::Redis(redis) => redis.remove(id).await,
        }
    }

    /// Stop the in-process sweeper. Idempotent; a no-op on the Redis backend,
    /// where expiry rides on key TTLs.
    pub fn shutdown(&self) {
        if let Backend::Local(local) = &self.backend {
            local.shutdown();
        }
    }

    #[cfg(test)]
    pub(crate) fn local(&self) -> &LocalRateLimiter {
        match &self.backend {
            Backend::Local(local) => local,
            Backend::Redis(_) => panic!("limiter is not backed by the local store"),
        }
    }
}
