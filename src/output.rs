//! Physical output backends for the engine

use embedded_hal::digital::PinState;
use log::info;

use crate::config::{BoardConfig, ConfigMode};
use crate::error::EngineError;
use crate::Gpio;

/// Abstract channel output
///
/// Implement this trait to route channel writes to new hardware.
/// The engine is generic over this trait.
pub trait ChannelOutput {
    /// Prepare the hardware for a finalized board config
    fn begin(&mut self, config: &BoardConfig) -> Result<(), EngineError>;

    /// Drive one output; `pin` is a GPIO number or a logical channel
    fn write(&mut self, pin: u8, level: PinState);

    /// Read back the level last driven on `pin`
    fn read(&mut self, pin: u8) -> PinState;

    /// Drive every output the backend owns
    fn write_all(&mut self, pins: &[u8], level: PinState);
}

/// One GPIO pin per channel
pub struct DirectOutput<G> {
    gpio: G,
}

impl<G: Gpio> DirectOutput<G> {
    pub const fn new(gpio: G) -> Self {
        Self { gpio }
    }

    pub fn release(self) -> G {
        self.gpio
    }
}

impl<G: Gpio> ChannelOutput for DirectOutput<G> {
    fn begin(&mut self, config: &BoardConfig) -> Result<(), EngineError> {
        match config.mode() {
            ConfigMode::DirectIo | ConfigMode::Custom => {
                config.configure_outputs(&mut self.gpio);
                info!(
                    target: "autolight::output",
                    "{} gpio outputs configured",
                    config.pins().len()
                );
                Ok(())
            }
            mode @ ConfigMode::I2cExpander => Err(EngineError::ModeMismatch { mode }),
        }
    }

    fn write(&mut self, pin: u8, level: PinState) {
        self.gpio.digital_write(pin, level);
    }

    fn read(&mut self, pin: u8) -> PinState {
        self.gpio.digital_read(pin)
    }

    fn write_all(&mut self, pins: &[u8], level: PinState) {
        for &pin in pins {
            self.gpio.digital_write(pin, level);
        }
    }
}
