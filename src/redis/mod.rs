//! Redis-backed backend.
//!
//! The whole counter/ladder state machine runs inside one server-side Lua
//! script, so any number of processes can share a limiter through one Redis.
//! The backend itself is stateless apart from the cached script handle.

mod redis_client;
pub use redis_client::*;

mod redis_rate_limiter;
pub use redis_rate_limiter::*;
