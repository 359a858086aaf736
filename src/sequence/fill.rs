//! Filling and wave patterns

use super::{Lights, SETTLE_MS, set_pair};
use crate::control::CancellationToken;

/// Hold time after a pair settles in the two-point fill
const HOLD_MS: u32 = 300;

fn blink_pair<L: Lights>(lights: &mut L, a: usize, b: usize, times: usize) {
    let delay = lights.delay_time();
    for _ in 0..times {
        set_pair(lights, a, b, true);
        lights.sleep(delay);
        set_pair(lights, a, b, false);
        lights.sleep(delay);
    }
    set_pair(lights, a, b, true);
    lights.sleep(HOLD_MS);
}

/// Clear channels from the last one down, one step each
fn drain_backward<L: Lights>(lights: &mut L, step_ms: u32) {
    for index in (0..lights.len()).rev() {
        lights.set_channel(index, false);
        lights.sleep(step_ms);
    }
}

/// Pairs blink in from both ends and stay lit
pub(super) fn fill_two_point<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let half = len / 2;
    let step = lights.delay_time().saturating_mul(2);

    for i in (0..half).step_by(2) {
        if token.is_cancelled() {
            return;
        }
        blink_pair(lights, i, i + 1, 8);
        if i + 1 < half {
            blink_pair(lights, len - 1 - i, len - 2 - i, 8);
        }
    }

    drain_backward(lights, step);
    lights.off();
    lights.sleep(SETTLE_MS);
}

/// A dot runs to the far end and stacks up, filling from the right
pub(super) fn fill_right<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let step = lights.delay_time().saturating_mul(2);

    for end in (1..=len).rev() {
        if token.is_cancelled() {
            return;
        }
        for index in 0..end {
            lights.set_channel(index, true);
            lights.sleep(step);
            lights.set_channel(index, false);
        }
        lights.set_channel(end - 1, true);
    }

    drain_backward(lights, step);
    lights.off();
    lights.sleep(SETTLE_MS);
}

/// Mirrored dots bounce between the ends and the centre, filling inward
pub(super) fn fill_in<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let half = len / 2;
    let step = lights.delay_time().saturating_mul(2);

    let flash = |lights: &mut L, a: usize, b: usize| {
        set_pair(lights, a, b, true);
        lights.sleep(step);
        set_pair(lights, a, b, false);
    };

    for filled in 0..half {
        if token.is_cancelled() {
            return;
        }
        // ends to centre
        for i in (half + filled + 1..=len).rev() {
            flash(lights, i - 1, len - i);
        }
        // centre back out
        for i in filled..half {
            flash(lights, i + half, half - 1 - i);
        }
        // and in again, one short of the ends
        for i in (half + filled + 1..len).rev() {
            flash(lights, i - 1, len - i);
        }
        set_pair(lights, half + filled, half - 1 - filled, true);
    }

    for i in 0..half {
        set_pair(lights, i + half, half - 1 - i, false);
        lights.sleep(step);
    }
    lights.off();
    lights.sleep(SETTLE_MS);
}

/// Quarter-mirrored wave, forward then reversed
///
/// Needs an even number of channels per half; other boards fall back to
/// the two-point blink fill.
pub(super) fn wave<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let half = len / 2;
    if half % 2 == 1 {
        super::blink::blink_two_fill(lights, token);
        return;
    }
    let quarter = half / 2;
    let delay = lights.delay_time();

    let step = |lights: &mut L, i: usize, on: bool| {
        if i < quarter {
            set_pair(lights, i, half - 1 - i, on);
        } else {
            set_pair(lights, i + half, len - 1 - i, on);
        }
        lights.sleep(delay);
    };

    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        for on in [true, false] {
            for i in 0..half {
                step(lights, i, on);
            }
        }
    }
    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        for on in [true, false] {
            for i in (0..half).rev() {
                step(lights, i, on);
            }
        }
    }

    lights.off();
}
