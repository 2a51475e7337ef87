use std::sync::Arc;
use std::time::Duration;

use crate::common::{LimitResult, Policy, millis_to_system_time};
use crate::redis::RedisClient;
use crate::{Clock, KlimaxError};

// The whole state machine, executed atomically on the server.
//
// KEYS[1] is the counter hash (`c` count, `t` quota, `w` window ms), KEYS[2]
// the status index; expiry rides on the key TTLs. ARGV is the flattened
// policy followed by the caller's clock reading in milliseconds, which is
// only used to report the reset instant. The counter hash carries the quota
// and window it was seeded with so that a window in flight keeps its
// parameters when the ladder advances underneath it.
const LIMIT_LUA: &str = r#"
    local counter_key = KEYS[1]
    local status_key = KEYS[2]

    local rung_count = (#ARGV - 1) / 2
    local now = tonumber(ARGV[#ARGV])

    local rung = tonumber(redis.call("GET", status_key)) or 0
    if rung > rung_count - 1 then
        rung = rung_count - 1
    end

    local quota = tonumber(ARGV[rung * 2 + 1])
    local window = tonumber(ARGV[rung * 2 + 2])

    local fields = redis.call("HMGET", counter_key, "c", "t", "w")

    if not fields[1] then
        redis.call("HSET", counter_key, "c", 1, "t", quota, "w", window)
        redis.call("PEXPIRE", counter_key, window)
        return {quota - 1, quota, window, now + window}
    end

    local count = redis.call("HINCRBY", counter_key, "c", 1)
    local total = tonumber(fields[2])
    local duration = tonumber(fields[3])

    local ttl = redis.call("PTTL", counter_key)
    if ttl < 0 then
        ttl = 0
    end

    local remaining = total - count
    if remaining < -1 then
        remaining = -1
    end

    if count == total + 1 and rung_count > 1 then
        local next_rung = rung + 1
        if next_rung > rung_count - 1 then
            next_rung = rung_count - 1
        end
        redis.call("SET", status_key, next_rung, "PX", duration * 2)
    end

    return {remaining, total, duration, now + ttl}
"#;

/// Rate limiter that delegates the state machine to a Redis script.
///
/// Holds no per-identifier state locally; every `get` is one script
/// execution, every `remove` two deletes.
pub struct RedisRateLimiter {
    client: Arc<dyn RedisClient>,
    prefix: String,
    sha: String,
    clock: Arc<dyn Clock>,
}

impl RedisRateLimiter {
    /// Upload the script and cache its handle. Failing to load the script
    /// means the backend is unusable, so construction fails.
    pub(crate) async fn connect(
        client: Arc<dyn RedisClient>,
        prefix: String,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KlimaxError> {
        let sha = client
            .script_load(LIMIT_LUA)
            .await
            .map_err(|err| KlimaxError::BackendUnavailable(Box::new(err)))?;

        Ok(Self {
            client,
            prefix,
            sha,
            clock,
        })
    } // end constructor

    fn counter_key(&self, id: &str) -> String {
        format!("{}:{}", self.prefix, id)
    }

    fn status_key(&self, id: &str) -> String {
        format!("{}:{}:S", self.prefix, id)
    }

    /// Charge one call against `id` and report the window state.
    pub(crate) async fn get_limit(
        &self,
        id: &str,
        policy: &Policy,
    ) -> Result<LimitResult, KlimaxError> {
        let keys = [self.counter_key(id), self.status_key(id)];

        let mut args: Vec<i64> = Vec::with_capacity(policy.len() * 2 + 1);
        for rung in policy.iter() {
            args.push(rung.quota);
            args.push(rung.window_ms() as i64);
        }
        args.push(self.clock.now_millis() as i64);

        let reply = match self.client.eval_sha(&self.sha, &keys, &args).await {
            Ok(reply) => reply,
            Err(err) if is_noscript(&err) => {
                // Script cache flushed (server restart, SCRIPT FLUSH). The
                // handle is content-addressed, so one re-upload restores it.
                tracing::warn!("rate limiting script missing from server, reloading");
                self.client.script_load(LIMIT_LUA).await?;
                self.client.eval_sha(&self.sha, &keys, &args).await?
            }
            Err(err) => return Err(err),
        };

        let &[remaining, total, duration_ms, reset_ms] = reply.as_slice() else {
            return Err(KlimaxError::Backend(format!(
                "expected [remaining, total, duration, reset], got {reply:?}"
            )));
        };

        Ok(LimitResult {
            total,
            remaining,
            duration: Duration::from_millis(duration_ms as u64),
            reset: millis_to_system_time(reset_ms as u64),
        })
    } // end method get_limit

    /// Delete both keys for `id`. Best-effort: the deletes are not
    /// transactional with any in-flight script execution.
    pub(crate) async fn remove(&self, id: &str) -> Result<(), KlimaxError> {
        self.client.del(&self.counter_key(id)).await?;
        self.client.del(&self.status_key(id)).await?;

        Ok(())
    }
}

fn is_noscript(err: &KlimaxError) -> bool {
    matches!(err, KlimaxError::Redis(err) if err.kind() == redis::ErrorKind::NoScriptError)
}
