mod test_common_validation;
mod test_rate_limiter;

use std::sync::Arc;

use crate::{ManualClock, RateLimiter, RateLimiterOptions};

pub(crate) fn gen_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Local limiter driven by a manual clock, so expiry scenarios run without
/// real sleeps.
pub(crate) async fn local_limiter() -> (RateLimiter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());

    let limiter = RateLimiter::new(RateLimiterOptions {
        clock: clock.clone(),
        ..Default::default()
    })
    .await
    .expect("local limiter construction cannot fail");

    (limiter, clock)
}
