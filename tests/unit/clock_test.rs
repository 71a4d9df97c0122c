//! Tests for clock utilities

use chrono::{Duration, Utc};
use prestoposti::util::clock::millis;
use prestoposti::util::{Clock, SystemClock};

#[test]
fn test_millis() {
    assert_eq!(millis(3_000), Duration::seconds(3));
    assert_eq!(millis(0), Duration::zero());
}

#[test]
fn test_system_clock_tracks_wall_time() {
    let before = Utc::now();
    let now = SystemClock.now();
    assert!(now >= before);
    assert!(now - before < Duration::seconds(5));
}
