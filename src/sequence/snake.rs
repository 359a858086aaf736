//! Running-dot patterns

use super::{Lights, SETTLE_MS, set_pair};
use crate::control::CancellationToken;

/// Snake along the board and back, first slow then at base speed
pub(super) fn snake_and_reverse<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    let delay = lights.delay_time();

    lights.off();
    for step in [delay.saturating_mul(2), delay] {
        if token.is_cancelled() {
            return;
        }
        for on in [true, false] {
            for index in 0..len {
                lights.set_channel(index, on);
                lights.sleep(step);
            }
        }
        for on in [true, false] {
            for index in (0..len).rev() {
                lights.set_channel(index, on);
                lights.sleep(step);
            }
        }
    }

    lights.off();
    lights.sleep(SETTLE_MS);
}

/// Mirrored comet with `tail` trailing dots, one per half
fn comet<L: Lights>(lights: &mut L, tail: usize, reverse: bool, step: u32) {
    let len = lights.len();
    let half = len / 2;

    for head in 0..half + tail {
        for on in [true, false] {
            for position in head.saturating_sub(tail)..=head {
                if position >= half {
                    continue;
                }
                let (a, b) = if reverse {
                    (half - 1 - position, len - 1 - position)
                } else {
                    (position, position + half)
                };
                set_pair(lights, a, b, on);
            }
            if on {
                lights.sleep(step);
            }
        }
    }
}

fn flash<L: Lights>(lights: &mut L, delay: u32) {
    lights.on();
    lights.sleep(delay);
    lights.off();
    lights.sleep(delay.saturating_mul(3));
}

/// Comets in both directions, a centre sweep, then long-tail comets
pub(super) fn complex<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let half = lights.len() / 2;
    let delay = lights.delay_time();
    let step = delay.saturating_mul(2);

    for reverse in [false, true] {
        for _ in 0..2 {
            if token.is_cancelled() {
                return;
            }
            comet(lights, 2, reverse, step);
        }
    }
    lights.sleep(step);

    let sweep = delay.saturating_add(delay / 2);
    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        for on in [true, false] {
            for i in 0..half {
                set_pair(lights, half - 1 - i, i + half, on);
                lights.sleep(sweep);
            }
        }
    }

    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        comet(lights, 3, false, step);
        flash(lights, delay);
        comet(lights, 3, true, step);
        flash(lights, delay);
    }

    lights.off();
}
