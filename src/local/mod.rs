//! In-process backend.
//!
//! Keeps the counter windows and the escalation ladder in two maps behind a
//! single mutex, so every `get` is one atomic transition across both. A
//! background sweeper reclaims expired entries; correctness never depends on
//! it running.

mod local_rate_limiter;
pub use local_rate_limiter::*;
