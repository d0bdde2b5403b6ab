use std::time::Duration;

use carbonconstruct_rs::Backoff;

#[test]
fn exponential_is_capped_and_non_decreasing() {
    let backoff = Backoff::Exponential {
        base: Duration::from_millis(100),
        factor: 2.0,
        max: Duration::from_secs(1),
        jitter: false,
    };

    let mut previous = Duration::ZERO;
    for attempt in 0..16 {
        let delay = backoff.delay_for(attempt);
        assert!(delay <= Duration::from_secs(1), "attempt {attempt} exceeded the cap");
        assert!(delay >= previous, "attempt {attempt} decreased");
        previous = delay;
    }

    assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
    assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
    assert_eq!(backoff.delay_for(2), Duration::from_millis(400));
    assert_eq!(backoff.delay_for(3), Duration::from_millis(800));
    assert_eq!(backoff.delay_for(4), Duration::from_secs(1));
    // Huge attempt numbers must not overflow past the cap.
    assert_eq!(backoff.delay_for(u32::MAX), Duration::from_secs(1));
}

#[test]
fn fixed_ignores_the_attempt_number() {
    let backoff = Backoff::Fixed(Duration::from_millis(250));
    assert_eq!(backoff.delay_for(0), Duration::from_millis(250));
    assert_eq!(backoff.delay_for(7), Duration::from_millis(250));
}

#[test]
fn jitter_stays_within_fifteen_percent() {
    let backoff = Backoff::Exponential {
        base: Duration::from_millis(1000),
        factor: 2.0,
        max: Duration::from_secs(60),
        jitter: true,
    };

    for _ in 0..200 {
        let delay = backoff.delay_for(0);
        assert!(delay >= Duration::from_millis(850), "below jitter floor: {delay:?}");
        assert!(delay <= Duration::from_millis(1150), "above jitter ceiling: {delay:?}");
    }
}
