#![no_std]

pub mod button;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod expander;
#[cfg(feature = "esp32-log")]
pub mod logger;
pub mod output;
pub mod sequence;
pub mod state;

pub use button::{ButtonConfig, ButtonMode, Buttons, MAX_BUTTONS};
pub use config::{BoardConfig, ConfigMode, VersionEntry, derive_io_size};
pub use control::{
    CancellationToken, Control, ControlHandle, EngineStatus, ModeCommand, TryReceiveError,
    TrySendError,
};
pub use engine::ChannelEngine;
pub use error::{ButtonError, ConfigError, EngineError, ExpanderError};
pub use expander::{ExpanderBank, ExpanderHandle};
pub use output::{ChannelOutput, DirectOutput};
pub use sequence::{Lights, MODE_COUNT, Mode, SequenceId};
pub use state::{ChannelState, SequenceMap};

pub use embassy_time::{Duration, Instant};
pub use embedded_hal::digital::PinState;

/// Electrical configuration of a GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    InputPullup,
    Output,
}

/// Edge that fires a pin interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    Change,
}

/// Abstract GPIO driver
///
/// Implement this trait to support different hardware platforms.
/// Board detection, buttons and direct-IO outputs are generic over it.
pub trait Gpio {
    /// Configure the electrical mode of a pin
    fn pin_mode(&mut self, pin: u8, mode: PinMode);

    /// Drive an output pin
    fn digital_write(&mut self, pin: u8, level: PinState);

    /// Sample a pin
    fn digital_read(&mut self, pin: u8) -> PinState;

    /// Install `handler` as the interrupt routine for `pin`
    fn attach_interrupt(&mut self, pin: u8, edge: Edge, handler: fn());
}
