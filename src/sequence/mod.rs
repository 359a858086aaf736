//! Sequence catalogue with compile-time known modes
//!
//! Every pattern is a plain function over the [`Lights`] primitives. Modes
//! are dispatched through [`Mode`], a tagged enum indexed by mode number.

mod blink;
mod fill;
mod matrix;
mod random;
mod snake;

pub(crate) use random::SplitMix64;

use crate::control::CancellationToken;

const MODE_NAME_OFF: &str = "off";
const MODE_NAME_ON: &str = "on";
const MODE_NAME_BLINK_ALL: &str = "blink_all";
const MODE_NAME_FILL_TWO_POINT: &str = "fill_two_point";
const MODE_NAME_FILL_RIGHT: &str = "fill_right";
const MODE_NAME_FILL_IN: &str = "fill_in";
const MODE_NAME_BLINK_ONE_BY_ONE: &str = "blink_one_by_one";
const MODE_NAME_BLINK_TWO_FILL: &str = "blink_two_fill";
const MODE_NAME_SNAKE_AND_REVERSE: &str = "snake_and_reverse";
const MODE_NAME_RANDOM: &str = "random";
const MODE_NAME_WAVE: &str = "wave";
const MODE_NAME_COMPLEX: &str = "complex";
const MODE_NAME_PATTERN_MATRIX: &str = "pattern_matrix";
const MODE_NAME_BLINK_PATTERN: &str = "blink_pattern";
const MODE_NAME_ADVANCED_PATTERN: &str = "advanced_pattern";
const MODE_NAME_ALL_SEQUENCES: &str = "all_sequences";

const MODE_ID_OFF: u8 = 0;
const MODE_ID_ON: u8 = 1;
const MODE_ID_BLINK_ALL: u8 = 2;
const MODE_ID_FILL_TWO_POINT: u8 = 3;
const MODE_ID_FILL_RIGHT: u8 = 4;
const MODE_ID_FILL_IN: u8 = 5;
const MODE_ID_BLINK_ONE_BY_ONE: u8 = 6;
const MODE_ID_BLINK_TWO_FILL: u8 = 7;
const MODE_ID_SNAKE_AND_REVERSE: u8 = 8;
const MODE_ID_RANDOM: u8 = 9;
const MODE_ID_WAVE: u8 = 10;
const MODE_ID_COMPLEX: u8 = 11;
const MODE_ID_PATTERN_MATRIX: u8 = 12;
const MODE_ID_BLINK_PATTERN: u8 = 13;
const MODE_ID_ADVANCED_PATTERN: u8 = 14;
const MODE_ID_ALL_SEQUENCES: u8 = 15;

/// Number of modes in the catalogue, off and on included
pub const MODE_COUNT: usize = MODE_ID_ALL_SEQUENCES as usize + 1;
pub(crate) const MODE_TOTAL: u8 = MODE_ID_ALL_SEQUENCES + 1;

/// Pause after a pattern finishes, in milliseconds
const SETTLE_MS: u32 = 500;

/// Primitives a sequence is written against
///
/// Channels are addressed by their position in the board's pin list.
/// Implementations turn `set_channel` and `sleep` into no-ops once a mode
/// change is pending, which is what lets a running pattern unwind quickly.
pub trait Lights {
    /// Number of channels
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Base step delay in milliseconds
    fn delay_time(&self) -> u32;

    /// Switch one channel; out-of-range indices are ignored
    fn set_channel(&mut self, index: usize, on: bool);

    /// Block for `ms` milliseconds
    fn sleep(&mut self, ms: u32);

    /// Uniform value in `0..bound`
    fn random(&mut self, bound: usize) -> usize;

    /// Switch every channel on
    fn on(&mut self) {
        for index in 0..self.len() {
            self.set_channel(index, true);
        }
    }

    /// Switch every channel off
    fn off(&mut self) {
        for index in 0..self.len() {
            self.set_channel(index, false);
        }
    }
}

/// Switch a contiguous range of channels
fn set_range<L: Lights + ?Sized>(lights: &mut L, range: core::ops::Range<usize>, on: bool) {
    for index in range {
        lights.set_channel(index, on);
    }
}

/// Switch a pair of channels together
fn set_pair<L: Lights + ?Sized>(lights: &mut L, a: usize, b: usize, on: bool) {
    lights.set_channel(a, on);
    lights.set_channel(b, on);
}

/// Patterns other than plain off and on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SequenceId {
    BlinkAll = MODE_ID_BLINK_ALL,
    FillTwoPoint = MODE_ID_FILL_TWO_POINT,
    FillRight = MODE_ID_FILL_RIGHT,
    FillIn = MODE_ID_FILL_IN,
    BlinkOneByOne = MODE_ID_BLINK_ONE_BY_ONE,
    BlinkTwoFill = MODE_ID_BLINK_TWO_FILL,
    SnakeAndReverse = MODE_ID_SNAKE_AND_REVERSE,
    Random = MODE_ID_RANDOM,
    Wave = MODE_ID_WAVE,
    Complex = MODE_ID_COMPLEX,
    /// Needs at least 8 channels
    PatternMatrix = MODE_ID_PATTERN_MATRIX,
    /// Needs at least 8 channels
    BlinkPattern = MODE_ID_BLINK_PATTERN,
    /// Needs at least 8 channels
    AdvancedPattern = MODE_ID_ADVANCED_PATTERN,
    AllSequences = MODE_ID_ALL_SEQUENCES,
}

impl SequenceId {
    /// Patterns played back to back by [`SequenceId::AllSequences`]
    pub const SHOWCASE: [Self; 13] = [
        Self::BlinkAll,
        Self::FillTwoPoint,
        Self::FillRight,
        Self::FillIn,
        Self::BlinkOneByOne,
        Self::BlinkTwoFill,
        Self::SnakeAndReverse,
        Self::Random,
        Self::Wave,
        Self::Complex,
        Self::PatternMatrix,
        Self::BlinkPattern,
        Self::AdvancedPattern,
    ];

    pub fn run<L: Lights>(self, lights: &mut L, token: &CancellationToken) {
        match self {
            Self::BlinkAll => blink::blink_all(lights, token),
            Self::FillTwoPoint => fill::fill_two_point(lights, token),
            Self::FillRight => fill::fill_right(lights, token),
            Self::FillIn => fill::fill_in(lights, token),
            Self::BlinkOneByOne => blink::blink_one_by_one(lights, token),
            Self::BlinkTwoFill => blink::blink_two_fill(lights, token),
            Self::SnakeAndReverse => snake::snake_and_reverse(lights, token),
            Self::Random => random::random(lights, token),
            Self::Wave => fill::wave(lights, token),
            Self::Complex => snake::complex(lights, token),
            Self::PatternMatrix => matrix::pattern_matrix(lights, token),
            Self::BlinkPattern => matrix::blink_pattern(lights, token),
            Self::AdvancedPattern => matrix::advanced_pattern(lights, token),
            Self::AllSequences => {
                for id in Self::SHOWCASE {
                    if token.is_cancelled() {
                        return;
                    }
                    id.run(lights, token);
                }
                lights.off();
            }
        }
    }
}

/// Selectable mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// All channels off
    #[default]
    Off,
    /// All channels steadily on
    On,
    Sequence(SequenceId),
}

impl Mode {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            MODE_ID_OFF => Self::Off,
            MODE_ID_ON => Self::On,
            MODE_ID_BLINK_ALL => Self::Sequence(SequenceId::BlinkAll),
            MODE_ID_FILL_TWO_POINT => Self::Sequence(SequenceId::FillTwoPoint),
            MODE_ID_FILL_RIGHT => Self::Sequence(SequenceId::FillRight),
            MODE_ID_FILL_IN => Self::Sequence(SequenceId::FillIn),
            MODE_ID_BLINK_ONE_BY_ONE => Self::Sequence(SequenceId::BlinkOneByOne),
            MODE_ID_BLINK_TWO_FILL => Self::Sequence(SequenceId::BlinkTwoFill),
            MODE_ID_SNAKE_AND_REVERSE => Self::Sequence(SequenceId::SnakeAndReverse),
            MODE_ID_RANDOM => Self::Sequence(SequenceId::Random),
            MODE_ID_WAVE => Self::Sequence(SequenceId::Wave),
            MODE_ID_COMPLEX => Self::Sequence(SequenceId::Complex),
            MODE_ID_PATTERN_MATRIX => Self::Sequence(SequenceId::PatternMatrix),
            MODE_ID_BLINK_PATTERN => Self::Sequence(SequenceId::BlinkPattern),
            MODE_ID_ADVANCED_PATTERN => Self::Sequence(SequenceId::AdvancedPattern),
            MODE_ID_ALL_SEQUENCES => Self::Sequence(SequenceId::AllSequences),
            _ => return None,
        })
    }

    pub const fn id(self) -> u8 {
        match self {
            Self::Off => MODE_ID_OFF,
            Self::On => MODE_ID_ON,
            Self::Sequence(id) => id as u8,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => MODE_NAME_OFF,
            Self::On => MODE_NAME_ON,
            Self::Sequence(SequenceId::BlinkAll) => MODE_NAME_BLINK_ALL,
            Self::Sequence(SequenceId::FillTwoPoint) => MODE_NAME_FILL_TWO_POINT,
            Self::Sequence(SequenceId::FillRight) => MODE_NAME_FILL_RIGHT,
            Self::Sequence(SequenceId::FillIn) => MODE_NAME_FILL_IN,
            Self::Sequence(SequenceId::BlinkOneByOne) => MODE_NAME_BLINK_ONE_BY_ONE,
            Self::Sequence(SequenceId::BlinkTwoFill) => MODE_NAME_BLINK_TWO_FILL,
            Self::Sequence(SequenceId::SnakeAndReverse) => MODE_NAME_SNAKE_AND_REVERSE,
            Self::Sequence(SequenceId::Random) => MODE_NAME_RANDOM,
            Self::Sequence(SequenceId::Wave) => MODE_NAME_WAVE,
            Self::Sequence(SequenceId::Complex) => MODE_NAME_COMPLEX,
            Self::Sequence(SequenceId::PatternMatrix) => MODE_NAME_PATTERN_MATRIX,
            Self::Sequence(SequenceId::BlinkPattern) => MODE_NAME_BLINK_PATTERN,
            Self::Sequence(SequenceId::AdvancedPattern) => MODE_NAME_ADVANCED_PATTERN,
            Self::Sequence(SequenceId::AllSequences) => MODE_NAME_ALL_SEQUENCES,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            MODE_NAME_OFF => Some(Self::Off),
            MODE_NAME_ON => Some(Self::On),
            MODE_NAME_BLINK_ALL => Some(Self::Sequence(SequenceId::BlinkAll)),
            MODE_NAME_FILL_TWO_POINT => Some(Self::Sequence(SequenceId::FillTwoPoint)),
            MODE_NAME_FILL_RIGHT => Some(Self::Sequence(SequenceId::FillRight)),
            MODE_NAME_FILL_IN => Some(Self::Sequence(SequenceId::FillIn)),
            MODE_NAME_BLINK_ONE_BY_ONE => Some(Self::Sequence(SequenceId::BlinkOneByOne)),
            MODE_NAME_BLINK_TWO_FILL => Some(Self::Sequence(SequenceId::BlinkTwoFill)),
            MODE_NAME_SNAKE_AND_REVERSE => Some(Self::Sequence(SequenceId::SnakeAndReverse)),
            MODE_NAME_RANDOM => Some(Self::Sequence(SequenceId::Random)),
            MODE_NAME_WAVE => Some(Self::Sequence(SequenceId::Wave)),
            MODE_NAME_COMPLEX => Some(Self::Sequence(SequenceId::Complex)),
            MODE_NAME_PATTERN_MATRIX => Some(Self::Sequence(SequenceId::PatternMatrix)),
            MODE_NAME_BLINK_PATTERN => Some(Self::Sequence(SequenceId::BlinkPattern)),
            MODE_NAME_ADVANCED_PATTERN => Some(Self::Sequence(SequenceId::AdvancedPattern)),
            MODE_NAME_ALL_SEQUENCES => Some(Self::Sequence(SequenceId::AllSequences)),
            _ => None,
        }
    }

    /// Run one full pass of the mode
    ///
    /// Boards without channels are left untouched.
    pub fn run<L: Lights>(self, lights: &mut L, token: &CancellationToken) {
        if lights.is_empty() {
            return;
        }
        match self {
            Self::Off => lights.off(),
            Self::On => lights.on(),
            Self::Sequence(id) => id.run(lights, token),
        }
    }
}
