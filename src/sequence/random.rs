//! Random fill pattern and its generator

use super::Lights;
use crate::config::MAX_CHANNELS;
use crate::control::CancellationToken;

/// Small deterministic generator for pattern randomness
#[derive(Debug, Clone)]
pub(crate) struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub(crate) const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) const fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Value in `0..bound`, zero for an empty range
    pub(crate) fn below(&mut self, bound: usize) -> usize {
        let Ok(bound) = u64::try_from(bound) else {
            return 0;
        };
        if bound == 0 {
            return 0;
        }
        usize::try_from(self.next_u64() % bound).unwrap_or(0)
    }
}

/// Light every channel in random order, then clear them in random order
///
/// Each phase touches every channel exactly once.
pub(super) fn random<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len().min(MAX_CHANNELS);
    let delay = lights.delay_time();

    for _ in 0..3 {
        for value in [true, false] {
            if token.is_cancelled() {
                return;
            }

            let mut order = [0usize; MAX_CHANNELS];
            for (slot, index) in order.iter_mut().zip(0..) {
                *slot = index;
            }
            for i in (1..len).rev() {
                let j = lights.random(i + 1).min(i);
                order.swap(i, j);
            }

            let mut states = [!value; MAX_CHANNELS];
            for &index in &order[..len] {
                states[index] = value;
                for (channel, &on) in states[..len].iter().enumerate() {
                    lights.set_channel(channel, on);
                }
                lights.sleep(delay);
            }
        }
    }

    lights.off();
}
