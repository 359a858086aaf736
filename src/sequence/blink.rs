//! Blinking patterns

use super::{Lights, SETTLE_MS, set_pair, set_range};
use crate::control::CancellationToken;

/// Pause between the halves of the alternating blink
const HALF_GAP_MS: u32 = 50;

fn blink_range<L: Lights>(lights: &mut L, range: core::ops::Range<usize>, times: usize) {
    let delay = lights.delay_time();
    for _ in 0..times {
        set_range(lights, range.clone(), true);
        lights.sleep(delay);
        set_range(lights, range.clone(), false);
        lights.sleep(delay);
    }
}

/// Whole-board strobe, then the two halves blinking in turn
pub(super) fn blink_all<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let half = len / 2;
    let lower = 0..half;
    let upper = half..len;

    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        blink_range(lights, 0..len, 15);
        lights.sleep(SETTLE_MS);
    }
    lights.off();

    for (first, second) in [(&lower, &upper), (&upper, &lower)] {
        if token.is_cancelled() {
            return;
        }
        blink_range(lights, first.clone(), 4);
        lights.sleep(HALF_GAP_MS);
        blink_range(lights, second.clone(), 4);
        lights.sleep(HALF_GAP_MS);
        blink_range(lights, first.clone(), 4);
        lights.sleep(SETTLE_MS);
        lights.off();
    }
}

/// Each channel blinks four times, walking forward then back
pub(super) fn blink_one_by_one<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let delay = lights.delay_time();

    let forward = 0..len;
    let backward = (0..len).rev();
    for index in forward.chain(backward) {
        if token.is_cancelled() {
            return;
        }
        blink_range(lights, index..index + 1, 4);
        lights.sleep(delay);
    }

    lights.off();
    lights.sleep(SETTLE_MS);
}

/// Mirrored pairs blink inward and stay lit once they reach their slot
pub(super) fn blink_two_fill<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let half = len / 2;
    let delay = lights.delay_time();

    for filled in 0..half {
        if token.is_cancelled() {
            return;
        }
        for i in (filled + 1..=half).rev() {
            for _ in 0..4 {
                set_pair(lights, i - 1, len - i, true);
                lights.sleep(delay);
                set_pair(lights, i - 1, len - i, false);
                lights.sleep(delay);
            }
        }
        set_pair(lights, filled, len - 1 - filled, true);
    }

    lights.off();
    lights.sleep(SETTLE_MS);
}
