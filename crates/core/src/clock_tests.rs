// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn fake_clock_advances_both_instant_and_epoch() {
    let clock = FakeClock::new();
    let start_epoch = clock.epoch_ms();
    let start_instant = clock.now();

    clock.advance(Duration::from_millis(500));

    assert_eq!(clock.epoch_ms(), start_epoch + 500);
    assert!(clock.now() >= start_instant + Duration::from_millis(500));
}

#[test]
fn system_clock_epoch_ms_is_plausible() {
    let clock = SystemClock;
    // Any time after 2023-ish in epoch millis.
    assert!(clock.epoch_ms() > 1_600_000_000_000);
}
