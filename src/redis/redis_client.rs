use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::KlimaxError;

/// Contract the Redis backend requires from an injected client.
///
/// Implemented below for [`redis::aio::ConnectionManager`]; cluster or pooled
/// clients can supply their own implementation.
#[async_trait]
pub trait RedisClient: Send + Sync {
    /// Upload a server-side script, returning its content-addressed handle.
    async fn script_load(&self, script: &str) -> Result<String, KlimaxError>;

    /// Atomically execute a previously loaded script.
    async fn eval_sha(
        &self,
        sha: &str,
        keys: &[String],
        args: &[i64],
    ) -> Result<Vec<i64>, KlimaxError>;

    /// Delete a single key.
    async fn del(&self, key: &str) -> Result<(), KlimaxError>;
}

#[async_trait]
impl RedisClient for ConnectionManager {
    async fn script_load(&self, script: &str) -> Result<String, KlimaxError> {
        let mut conn = self.clone();
        let sha: String = redis::cmd("SCRIPT")
            .arg("LOAD")
            .arg(script)
            .query_async(&mut conn)
            .await?;

        Ok(sha)
    }

    async fn eval_sha(
        &self,
        sha: &str,
        keys: &[String],
        args: &[i64],
    ) -> Result<Vec<i64>, KlimaxError> {
        let mut conn = self.clone();
        let mut cmd = redis::cmd("EVALSHA");
        cmd.arg(sha).arg(keys.len());

        for key in keys {
            cmd.arg(key);
        }
        for arg in args {
            cmd.arg(*arg);
        }

        Ok(cmd.query_async(&mut conn).await?)
    }

    async fn del(&self, key: &str) -> Result<(), KlimaxError> {
        let mut conn = self.clone();
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;

        Ok(())
    }
}
