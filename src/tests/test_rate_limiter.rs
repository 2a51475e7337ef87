use std::time::Duration;

use crate::tests::{gen_id, local_limiter};
use crate::{KlimaxError, RateLimiter, RateLimiterOptions};

#[tokio::test]
async fn empty_policy_uses_the_default_rung() {
    let (limiter, _clock) = local_limiter().await;

    let res = limiter.get(&gen_id(), &[]).await.unwrap();
    assert_eq!(res.total, 100);
    assert_eq!(res.remaining, 99);
    assert_eq!(res.duration, Duration::from_secs(60));
}

#[tokio::test]
async fn configured_defaults_apply_to_the_empty_policy() {
    let limiter = RateLimiter::new(RateLimiterOptions {
        max: 10,
        duration: Duration::from_secs(1),
        ..Default::default()
    })
    .await
    .unwrap();

    let res = limiter.get(&gen_id(), &[]).await.unwrap();
    assert_eq!(res.total, 10);
    assert_eq!(res.remaining, 9);
    assert_eq!(res.duration, Duration::from_secs(1));
}

#[tokio::test]
async fn zero_options_normalize_to_the_documented_defaults() {
    let limiter = RateLimiter::new(RateLimiterOptions {
        max: 0,
        duration: Duration::ZERO,
        clean_duration: Duration::ZERO,
        ..Default::default()
    })
    .await
    .unwrap();

    let res = limiter.get(&gen_id(), &[]).await.unwrap();
    assert_eq!(res.total, 100);
    assert_eq!(res.duration, Duration::from_secs(60));
}

#[tokio::test]
async fn invalid_policies_error_before_charging_anything() {
    let (limiter, _clock) = local_limiter().await;
    let id = gen_id();

    let err = limiter.get(&id, &[10]).await.unwrap_err();
    assert!(matches!(err, KlimaxError::UnpairedPolicy));

    let err = limiter.get(&id, &[-1, 10]).await.unwrap_err();
    assert!(matches!(err, KlimaxError::NonPositivePolicy));

    let err = limiter.get(&id, &[10, 0]).await.unwrap_err();
    assert!(matches!(err, KlimaxError::NonPositivePolicy));

    // Nothing was charged by the failed calls.
    let res = limiter.get(&id, &[10, 1000]).await.unwrap();
    assert_eq!(res.remaining, 9);
}

#[tokio::test]
async fn remove_is_a_no_op_for_unknown_identifiers() {
    let (limiter, _clock) = local_limiter().await;

    limiter.remove(&gen_id()).await.unwrap();
}
