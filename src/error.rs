//! Error types for board configuration and engine start-up
//!
//! Only set-up time failures are reported here. Hardware writes made while
//! a sequence runs do not report errors.

use core::fmt;

use crate::config::ConfigMode;

/// Board topology could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Address-pin word matched no entry of the version table
    UnrecognizedTopology { pattern: u8 },
    /// Channel count resolved to zero
    ZeroChannels,
    /// A table or pin list would exceed its fixed capacity
    AllocationFailure { requested: usize, capacity: usize },
    /// Pin list length does not match the channel count
    PinCountMismatch { channels: u8, pins: usize },
    /// Custom wiring order refers to a channel that does not exist
    InvalidSequence { position: usize, value: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedTopology { pattern } => {
                write!(f, "address pins read {pattern:#07b}, no matching board version")
            }
            Self::ZeroChannels => write!(f, "channel count is zero"),
            Self::AllocationFailure {
                requested,
                capacity,
            } => write!(f, "requested {requested} entries, capacity is {capacity}"),
            Self::PinCountMismatch { channels, pins } => {
                write!(f, "{channels} channels configured but {pins} pins given")
            }
            Self::InvalidSequence { position, value } => {
                write!(f, "custom sequence entry {position} refers to channel {value}")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Expander bank could not be brought up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpanderError {
    /// None of the attempted chips answered
    InitFailure { attempted: usize },
    /// More chips are needed than addresses are configured
    AllocationFailure { requested: usize, available: usize },
}

impl fmt::Display for ExpanderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailure { attempted } => {
                write!(f, "no expander responded ({attempted} attempted)")
            }
            Self::AllocationFailure {
                requested,
                available,
            } => write!(
                f,
                "{requested} expanders required, only {available} addresses configured"
            ),
        }
    }
}

impl core::error::Error for ExpanderError {}

/// Button index outside the supported range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonError {
    pub index: usize,
}

impl fmt::Display for ButtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "button index {} is out of range", self.index)
    }
}

impl core::error::Error for ButtonError {}

/// Engine failed to initialize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    Config(ConfigError),
    Expander(ExpanderError),
    /// `initialize` was called before a board config was attached
    MissingConfig,
    /// Output backend does not serve the configured board mode
    ModeMismatch { mode: ConfigMode },
    AlreadyInitialized,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Expander(err) => write!(f, "expander: {err}"),
            Self::MissingConfig => write!(f, "no board config attached"),
            Self::ModeMismatch { mode } => {
                write!(f, "output backend cannot drive {mode:?} boards")
            }
            Self::AlreadyInitialized => write!(f, "engine is already initialized"),
        }
    }
}

impl core::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Expander(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ExpanderError> for EngineError {
    fn from(err: ExpanderError) -> Self {
        Self::Expander(err)
    }
}
