/// Error type for this crate.
#[derive(Debug, thiserror::Error)]
pub enum KlimaxError {
    /// The policy vector had an odd number of values.
    #[error("ratelimiter: must be paired values")]
    UnpairedPolicy,
    /// The policy vector contained a zero or negative value.
    #[error("ratelimiter: must be positive integer")]
    NonPositivePolicy,
    /// Redis error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    /// The rate limiting script could not be loaded at construction.
    #[error("ratelimiter: backend unavailable")]
    BackendUnavailable(#[source] Box<KlimaxError>),
    /// The backend returned a reply the limiter could not interpret.
    #[error("ratelimiter: backend error: {0}")]
    Backend(String),
}
