//! Block-layout patterns for boards of 8 to 24 channels
//!
//! The board is cut into eight blocks whose sizes follow the channel count.
//! These patterns address blocks, whole or reversed, instead of single
//! channels. Boards with fewer than eight channels are left untouched.

use heapless::Vec;

use super::{Lights, set_pair};
use crate::control::CancellationToken;

const MIN_LAYOUT_CHANNELS: usize = 8;
const MAX_LAYOUT_CHANNELS: usize = 24;

type Group = Vec<usize, MAX_LAYOUT_CHANNELS>;

/// Block sizes for 24, 22, ... 8 channels
const MATRIX_LAYOUT: [[u8; 8]; 9] = [
    [3, 4, 4, 1, 1, 4, 4, 3],
    [3, 3, 4, 1, 1, 4, 3, 3],
    [3, 3, 3, 1, 1, 3, 3, 3],
    [3, 2, 3, 1, 1, 3, 2, 3],
    [3, 2, 2, 1, 1, 2, 2, 3],
    [3, 1, 2, 1, 1, 1, 2, 3],
    [3, 1, 1, 1, 1, 1, 1, 3],
    [3, 0, 1, 1, 1, 1, 0, 3],
    [3, 0, 0, 1, 1, 0, 0, 3],
];

const BLINK_LAYOUT: [[u8; 8]; 9] = [
    [3, 3, 3, 3, 3, 3, 3, 3],
    [3, 2, 3, 3, 3, 3, 2, 3],
    [3, 2, 2, 3, 3, 2, 2, 3],
    [3, 2, 2, 2, 2, 2, 2, 3],
    [3, 1, 2, 2, 2, 2, 1, 3],
    [3, 1, 1, 2, 2, 1, 1, 3],
    [3, 1, 1, 1, 1, 1, 1, 3],
    [3, 0, 1, 1, 1, 1, 0, 3],
    [3, 0, 0, 1, 1, 0, 0, 3],
];

#[derive(Clone, Copy)]
enum Block {
    Fwd(usize),
    Rev(usize),
}

use Block::{Fwd, Rev};

/// Block sizes picked for one board
struct Layout {
    sizes: [u8; 8],
    len: usize,
}

impl Layout {
    /// Boards above 24 channels get empty blocks
    fn new(table: &[[u8; 8]; 9], len: usize) -> Self {
        let sizes = MAX_LAYOUT_CHANNELS
            .checked_sub(len)
            .and_then(|gap| table.get(gap / 2))
            .copied()
            .unwrap_or([0; 8]);
        Self { sizes, len }
    }

    /// Channels of `blocks`, concatenated in order
    ///
    /// Channels past the end of an odd-sized board are skipped.
    fn group(&self, blocks: &[Block]) -> Group {
        let mut group = Group::new();
        for &block in blocks {
            let (index, reversed) = match block {
                Fwd(index) => (index, false),
                Rev(index) => (index, true),
            };
            let start: usize = self.sizes[..index].iter().map(|&s| usize::from(s)).sum();
            let size = usize::from(self.sizes[index]);

            let from = group.len();
            for channel in (start..start + size).filter(|&c| c < self.len) {
                let _ = group.push(channel);
            }
            if reversed {
                group[from..].reverse();
            }
        }
        group
    }
}

fn set_group<L: Lights>(lights: &mut L, group: &[usize], on: bool) {
    for &channel in group {
        lights.set_channel(channel, on);
    }
}

fn blink_group<L: Lights>(lights: &mut L, group: &[usize], times: usize, on_ms: u32, off_ms: u32) {
    for _ in 0..times {
        set_group(lights, group, true);
        lights.sleep(on_ms);
        set_group(lights, group, false);
        lights.sleep(off_ms);
    }
}

/// Switch position `position` of every lane that is long enough
fn set_lanes<L: Lights>(lights: &mut L, lanes: &[&[usize]], position: usize, on: bool) {
    for lane in lanes {
        if let Some(&channel) = lane.get(position) {
            lights.set_channel(channel, on);
        }
    }
}

fn longest(lanes: &[&[usize]]) -> usize {
    lanes.iter().map(|lane| lane.len()).max().unwrap_or(0)
}

/// Step through `positions` of all lanes, leaving them at `on`
fn sweep<L, I>(lights: &mut L, lanes: &[&[usize]], positions: I, on: bool, step: u32)
where
    L: Lights,
    I: Iterator<Item = usize>,
{
    for position in positions {
        set_lanes(lights, lanes, position, on);
        lights.sleep(step);
    }
}

/// A window of `width` positions sliding along every lane at once
fn comet<L: Lights>(lights: &mut L, lanes: &[&[usize]], width: usize, reverse: bool, step: u32) {
    let width = width.max(1);
    let frames = longest(lanes) + width - 1;
    for frame in 0..frames {
        let head = if reverse { frames - 1 - frame } else { frame };
        for on in [true, false] {
            for position in (head + 1).saturating_sub(width)..=head {
                set_lanes(lights, lanes, position, on);
            }
            if on {
                lights.sleep(step);
            }
        }
    }
}

/// Like [`comet`], over `count` positions mapped to channel pairs
fn paired_comet<L, F>(lights: &mut L, count: usize, width: usize, step: u32, pair: F)
where
    L: Lights,
    F: Fn(usize) -> (usize, usize),
{
    for head in 0..count + width - 1 {
        for on in [true, false] {
            for position in (head + 1).saturating_sub(width)..(head + 1).min(count) {
                let (a, b) = pair(position);
                set_pair(lights, a, b, on);
            }
            if on {
                lights.sleep(step);
            }
        }
    }
}

/// Mirrored pairs flash from the ends inward, then from the centre out
fn bounce<L: Lights>(lights: &mut L, group: &[usize], step: u32) {
    let len = group.len();
    let half = len / 2;
    let flash = |lights: &mut L, a: usize, b: usize| {
        set_pair(lights, a, b, true);
        lights.sleep(step);
        set_pair(lights, a, b, false);
    };

    for (i, &channel) in group.iter().enumerate().take(half) {
        flash(lights, channel, group[len - 1 - i]);
    }
    for i in 1..half.saturating_sub(1) {
        flash(lights, group[half - 1 - i], group[half + i]);
    }
}

/// Both halves of `group` as lanes walked side by side
fn halves(group: &[usize]) -> [&[usize]; 2] {
    let half = group.len() / 2;
    [&group[..half], &group[half..half * 2]]
}

/// Blocks blink outside in and back, then bounce, then run as comets
pub(super) fn pattern_matrix<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    if len < MIN_LAYOUT_CHANNELS {
        return;
    }
    let layout = Layout::new(&MATRIX_LAYOUT, len);
    let delay = lights.delay_time();
    let step = delay.saturating_mul(2);
    let blink_ms = delay.saturating_add(delay / 2);

    let ends = layout.group(&[Fwd(0), Fwd(7)]);
    let sides = layout.group(&[Fwd(1), Fwd(6)]);
    let centre = layout.group(&[Fwd(2), Fwd(3), Fwd(4), Fwd(5)]);

    for group in [&ends, &sides, &centre, &centre, &sides, &ends] {
        if token.is_cancelled() {
            return;
        }
        blink_group(lights, group, 4, blink_ms, blink_ms);
        lights.sleep(delay.saturating_mul(4));
    }

    for group in [&ends, &sides, &centre] {
        for _ in 0..3 {
            if token.is_cancelled() {
                return;
            }
            bounce(lights, group, step);
        }
    }

    let outer = layout.group(&[Fwd(0), Fwd(1), Fwd(6), Fwd(7)]);
    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        comet(lights, &[outer.as_slice()], 3, true, step);
        comet(lights, &[outer.as_slice()], 3, false, step);
    }

    if token.is_cancelled() {
        return;
    }
    let upper = layout.group(&[Fwd(3), Rev(2), Fwd(6), Fwd(7)]);
    comet(lights, &[upper.as_slice()], 3, true, step);
    let lower = layout.group(&[Fwd(0), Fwd(1), Rev(5), Fwd(4)]);
    comet(lights, &[lower.as_slice()], 3, false, step);

    let runs = [
        (layout.group(&[Rev(7), Rev(6)]), 1),
        (layout.group(&[Rev(5), Rev(4)]), 2),
        (layout.group(&[Rev(3), Rev(2)]), 2),
        (layout.group(&[Rev(1), Rev(0)]), 1),
    ];
    for _ in 0..2 {
        for (group, width) in &runs {
            if token.is_cancelled() {
                return;
            }
            comet(lights, &[group.as_slice()], *width, false, step);
        }
    }

    let rising = layout.group(&[
        Rev(7),
        Rev(6),
        Rev(5),
        Rev(4),
        Fwd(0),
        Fwd(1),
        Fwd(2),
        Fwd(3),
    ]);
    let falling = layout.group(&[
        Fwd(4),
        Fwd(5),
        Fwd(6),
        Fwd(7),
        Rev(3),
        Rev(2),
        Rev(1),
        Rev(0),
    ]);
    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        comet(lights, &halves(&rising), 3, false, step);
        comet(lights, &halves(&falling), 3, false, step);
    }

    lights.off();
}

/// Block pairs blink in turn, lanes fill and drain, comets close
pub(super) fn blink_pattern<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    if len < MIN_LAYOUT_CHANNELS {
        return;
    }
    let layout = Layout::new(&BLINK_LAYOUT, len);
    let delay = lights.delay_time();
    let step = delay.saturating_mul(2);
    let slow = delay.saturating_mul(3);

    let alternate = |lights: &mut L, first: &[usize], second: &[usize]| {
        for _ in 0..3 {
            if token.is_cancelled() {
                return;
            }
            for group in [first, second] {
                blink_group(lights, group, 3, step, step);
                lights.sleep(step);
            }
        }
    };

    alternate(
        lights,
        &layout.group(&[Fwd(3), Fwd(7)]),
        &layout.group(&[Fwd(0), Fwd(4)]),
    );
    alternate(
        lights,
        &layout.group(&[Fwd(0), Fwd(3), Fwd(4), Fwd(7)]),
        &layout.group(&[Fwd(1), Fwd(2), Fwd(5), Fwd(6)]),
    );

    let quarters = [
        layout.group(&[Fwd(0), Fwd(1)]),
        layout.group(&[Rev(3), Rev(2)]),
        layout.group(&[Fwd(4), Fwd(5)]),
        layout.group(&[Rev(7), Rev(6)]),
    ];
    let lanes = quarters.each_ref().map(|group| group.as_slice());
    let depth = longest(&lanes);

    if token.is_cancelled() {
        return;
    }
    for position in 0..depth {
        set_lanes(lights, &lanes, position, true);
        lights.sleep(step);
        set_lanes(lights, &lanes, position, false);
    }
    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        sweep(lights, &lanes, (0..depth).rev(), true, step);
        sweep(lights, &lanes, 0..depth, false, step);
        lights.sleep(slow);
    }

    for _ in 0..4 {
        if token.is_cancelled() {
            return;
        }
        for first in (0..8).step_by(2) {
            let pair = layout.group(&[Fwd(first), Fwd(first + 1)]);
            blink_group(lights, &pair, 1, step, delay / 2);
        }
        lights.sleep(step);
    }

    for position in (0..depth).chain((0..depth).rev()) {
        if token.is_cancelled() {
            return;
        }
        for _ in 0..2 {
            set_lanes(lights, &lanes, position, true);
            lights.sleep(delay);
            set_lanes(lights, &lanes, position, false);
            lights.sleep(delay);
        }
    }

    if token.is_cancelled() {
        return;
    }
    let outward = layout.group(&[Rev(7), Rev(6), Rev(1), Rev(0)]);
    let inward = layout.group(&[Fwd(4), Fwd(5), Fwd(2), Fwd(3)]);
    let crossing = [outward.as_slice(), inward.as_slice()];
    let span = longest(&crossing);
    sweep(lights, &crossing, 0..span, true, step);
    sweep(lights, &crossing, 0..span, false, step);

    alternate(
        lights,
        &layout.group(&[Fwd(2), Fwd(3), Fwd(6), Fwd(7)]),
        &layout.group(&[Fwd(0), Fwd(1), Fwd(4), Fwd(5)]),
    );

    if token.is_cancelled() {
        return;
    }
    let first = layout.group(&[Fwd(0), Fwd(1), Rev(5), Rev(4)]);
    comet(lights, &[first.as_slice()], 3, false, slow);
    let second = layout.group(&[Rev(7), Rev(6), Fwd(2), Fwd(3)]);
    comet(lights, &[second.as_slice()], 3, false, slow);

    let left = layout.group(&[Fwd(0), Fwd(1)]);
    let right = layout.group(&[Fwd(6), Fwd(7)]);
    let edges = [left.as_slice(), right.as_slice()];
    let span = longest(&edges);
    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        sweep(lights, &edges, 0..span, true, slow);
        sweep(lights, &edges, (0..span).rev(), false, slow);
        sweep(lights, &edges, (0..span).rev(), true, slow);
        sweep(lights, &edges, 0..span, false, slow);
    }

    lights.off();
}

/// Mirrored stacking and comets over the whole board, mixed with block runs
pub(super) fn advanced_pattern<L: Lights>(lights: &mut L, token: &CancellationToken) {
    let len = lights.len();
    if len < MIN_LAYOUT_CHANNELS {
        return;
    }
    let layout = Layout::new(&MATRIX_LAYOUT, len);
    let half = len / 2;
    let delay = lights.delay_time();
    let step = delay.saturating_mul(2);
    let slow = delay.saturating_mul(3);

    let outer = |position: usize| (position, len - 1 - position);
    let centre = |position: usize| (half - 1 - position, half + position);

    for i in 0..half {
        if token.is_cancelled() {
            return;
        }
        for j in 0..half {
            set_pair(lights, j, len - 1 - j, true);
            lights.sleep(delay);
        }
        for j in 0..i {
            set_pair(lights, j, len - 1 - j, true);
            lights.sleep(step);
            set_pair(lights, j, len - 1 - j, false);
            lights.sleep(step);
        }
        set_pair(lights, i, len - 1 - i, false);
        lights.sleep(step);
    }

    for _ in 0..2 {
        if token.is_cancelled() {
            return;
        }
        paired_comet(lights, half, 4, step, outer);
        paired_comet(lights, half, 4, step, centre);
    }

    // comets that stack at the end of a shrinking run
    for end in (1..=half).rev() {
        if token.is_cancelled() {
            return;
        }
        paired_comet(lights, end, 4, step, outer);
        set_pair(lights, end - 1, len - end, true);
    }
    for position in 0..half + 3 {
        lights.sleep(step);
        if position < half {
            let (a, b) = centre(position);
            set_pair(lights, a, b, false);
        }
    }

    for blocks in [[Rev(1), Fwd(6)], [Fwd(1), Rev(6)]] {
        if token.is_cancelled() {
            return;
        }
        let group = layout.group(&blocks);
        let lanes = halves(&group);
        let span = group.len() / 2;
        sweep(lights, &lanes, 0..span, true, slow);
        sweep(lights, &lanes, 0..span, false, slow);
    }

    if token.is_cancelled() {
        return;
    }
    let board = layout.group(&[
        Fwd(0),
        Fwd(1),
        Fwd(2),
        Fwd(3),
        Fwd(4),
        Fwd(5),
        Fwd(6),
        Fwd(7),
    ]);
    comet(lights, &[board.as_slice()], 4, true, step);
    comet(lights, &[board.as_slice()], 4, false, step);

    if token.is_cancelled() {
        return;
    }
    paired_comet(lights, half, 4, step, outer);
    paired_comet(lights, half, 4, step, centre);

    let crossings = [
        ([Fwd(0), Fwd(1)], [Fwd(4), Fwd(5)]),
        ([Fwd(6), Fwd(7)], [Fwd(2), Fwd(3)]),
        ([Rev(7), Rev(6)], [Rev(3), Rev(2)]),
        ([Rev(1), Rev(0)], [Rev(5), Rev(4)]),
    ];
    for (first, second) in crossings {
        if token.is_cancelled() {
            return;
        }
        let first = layout.group(&first);
        let second = layout.group(&second);
        comet(lights, &[first.as_slice(), second.as_slice()], 3, false, step);
    }

    if token.is_cancelled() {
        return;
    }
    paired_comet(lights, half, 4, step, outer);
    paired_comet(lights, half, 4, step, centre);

    lights.off();
}
