//! Klimax is a multi-policy rate limiter with an escalation ladder.
//!
//! A caller asks, for an identifier (user id, IP, path, API key) and a list of
//! `(quota, window_ms)` policies, whether the next request is allowed. The
//! limiter answers with the active quota, the remaining count, the window
//! duration, and the instant the window resets. Exhausting a window promotes
//! the identifier to the next policy (typically a lower quota over a longer
//! window); once the identifier behaves, it falls back to the base policy.
//!
//! State lives either in-process (the default) or in Redis behind an atomic
//! server-side script, so several processes can share one ladder.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn demo() -> Result<(), klimax::KlimaxError> {
//! use klimax::{RateLimiter, RateLimiterOptions};
//!
//! let limiter = RateLimiter::new(RateLimiterOptions::default()).await?;
//!
//! // 10 requests per second, then 5 per 10 seconds for offenders.
//! let res = limiter.get("user:123", &[10, 1000, 5, 10_000]).await?;
//!
//! if res.remaining >= 0 {
//!     // proceed
//! } else {
//!     // reject until res.reset
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Sharing state through Redis
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use klimax::{RateLimiter, RateLimiterOptions};
//!
//! let client = redis::Client::open("redis://127.0.0.1:6379/")?;
//! let manager = client.get_connection_manager().await?;
//!
//! let limiter = RateLimiter::new(RateLimiterOptions {
//!     client: Some(Arc::new(manager)),
//!     ..Default::default()
//! })
//! .await?;
//! # let _ = limiter;
//! # Ok(())
//! # }
//! ```

mod limiter;
pub use limiter::*;

mod common;
pub use common::LimitResult;

mod clock;
pub use clock::*;

mod error;
pub use error::*;

mod local;

pub mod redis;
pub use redis::RedisClient;

#[cfg(test)]
mod tests;
