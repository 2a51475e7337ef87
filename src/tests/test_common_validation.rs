use std::time::Duration;

use crate::KlimaxError;
use crate::common::Policy;

const MAX: i64 = 100;
const DURATION: Duration = Duration::from_secs(60);

#[test]
fn empty_policy_falls_back_to_defaults() {
    let policy = Policy::resolve(&[], MAX, DURATION).unwrap();

    assert_eq!(policy.len(), 1);
    assert_eq!(policy.rung(0).quota, 100);
    assert_eq!(policy.rung(0).window, Duration::from_secs(60));
}

#[test]
fn odd_length_policy_is_rejected() {
    let err = Policy::resolve(&[10], MAX, DURATION).unwrap_err();

    assert!(matches!(err, KlimaxError::UnpairedPolicy));
    assert_eq!(err.to_string(), "ratelimiter: must be paired values");
}

#[test]
fn non_positive_values_are_rejected() {
    for policy in [&[-1, 10][..], &[10, 0], &[2, 100, 0, 200]] {
        let err = Policy::resolve(policy, MAX, DURATION).unwrap_err();

        assert!(matches!(err, KlimaxError::NonPositivePolicy));
        assert_eq!(err.to_string(), "ratelimiter: must be positive integer");
    }
}

#[test]
fn pairs_become_rungs_in_order() {
    let policy = Policy::resolve(&[3, 100, 2, 200], MAX, DURATION).unwrap();

    assert_eq!(policy.len(), 2);
    assert_eq!(policy.rung(0).quota, 3);
    assert_eq!(policy.rung(0).window, Duration::from_millis(100));
    assert_eq!(policy.rung(1).quota, 2);
    assert_eq!(policy.rung(1).window, Duration::from_millis(200));
}

#[test]
fn rung_lookup_clamps_to_last() {
    let policy = Policy::resolve(&[3, 100, 2, 200], MAX, DURATION).unwrap();

    assert_eq!(policy.rung(7), policy.rung(1));
    assert_eq!(policy.clamp_index(7), 1);
}
