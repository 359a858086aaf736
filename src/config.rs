//! Board topology: channel count, pin list and expander addressing

use embedded_hal::digital::PinState;
use heapless::Vec;
use log::{debug, info, warn};

use crate::error::ConfigError;
use crate::{Gpio, PinMode};

const TARGET: &str = "autolight::config";

/// Maximum number of channels a board can expose
pub const MAX_CHANNELS: usize = 64;
/// Maximum number of I2C expanders on one bus
pub const MAX_EXPANDERS: usize = 8;
/// Number of entries in the version table
pub const MAX_VERSIONS: usize = 32;
/// Number of jumper pins encoding the board variant
pub const ADDRESS_PIN_COUNT: usize = 5;
/// Output lines per expander chip
pub const LINES_PER_EXPANDER: u8 = 8;

pub const DEFAULT_ADDRESS_PINS: [u8; ADDRESS_PIN_COUNT] = [0x1B, 0x1A, 0x19, 0x21, 0x20];
pub const DEFAULT_I2C_ADDRESSES: [u8; MAX_EXPANDERS] =
    [0x20, 0x24, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27];

/// How channels reach the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Caller-provided pin list, driven as GPIO
    Custom,
    /// One GPIO per channel
    DirectIo,
    /// Channels spread over 8-line I2C expanders
    I2cExpander,
}

/// One row of the address-pin calibration table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionEntry {
    pub pattern: u8,
    pub version: u8,
    pub channels: u8,
}

/// Board version derived from the channel count
pub const fn version_for_channels(channels: u8) -> u8 {
    match channels {
        0 => 0,
        2..=16 => 1,
        18..=24 => 2,
        _ => 3,
    }
}

/// Number of expander chips needed for `channels`
///
/// Counts every multiple-of-8 threshold up to 64 that an even channel
/// count exceeds. Odd channel counts therefore need no expander at all.
pub fn derive_io_size(channels: u8) -> u8 {
    let mut io_size = 0;
    for threshold in (0..=64u8).step_by(usize::from(LINES_PER_EXPANDER)) {
        if channels > threshold && channels % 2 == 0 {
            io_size += 1;
        }
    }
    io_size
}

/// Factory calibration table: pattern `p` selects `(32 - p) * 2` channels
pub fn default_version_table() -> Vec<VersionEntry, MAX_VERSIONS> {
    let mut table = Vec::new();
    for (index, pattern) in (0u8..32).zip((0u8..32).rev()) {
        let channels = (index + 1) * 2;
        let _ = table.push(VersionEntry {
            pattern,
            version: version_for_channels(channels),
            channels,
        });
    }
    table
}

/// Resolved board topology
///
/// Populated once at start-up, either from the address pins or through the
/// setters, then handed to the engine which freezes it.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    mode: ConfigMode,
    version: u8,
    channel_count: u8,
    io_size: u8,
    /// Pins as wired, before any custom order is applied
    wiring: Vec<u8, MAX_CHANNELS>,
    pins: Vec<u8, MAX_CHANNELS>,
    address_pins: [u8; ADDRESS_PIN_COUNT],
    i2c_addresses: Vec<u8, MAX_EXPANDERS>,
    versions: Vec<VersionEntry, MAX_VERSIONS>,
    custom_sequence: Option<Vec<u8, MAX_CHANNELS>>,
    unresolved_pattern: Option<u8>,
}

impl BoardConfig {
    pub fn new(mode: ConfigMode) -> Self {
        Self {
            mode,
            version: 0,
            channel_count: 0,
            io_size: 0,
            wiring: Vec::new(),
            pins: Vec::new(),
            address_pins: DEFAULT_ADDRESS_PINS,
            i2c_addresses: Vec::from_slice(&DEFAULT_I2C_ADDRESSES).unwrap_or_default(),
            versions: default_version_table(),
            custom_sequence: None,
            unresolved_pattern: None,
        }
    }

    /// Replace the calibration table
    pub fn with_version_table(mut self, table: &[VersionEntry]) -> Result<Self, ConfigError> {
        self.versions = Vec::from_slice(table).map_err(|()| ConfigError::AllocationFailure {
            requested: table.len(),
            capacity: MAX_VERSIONS,
        })?;
        Ok(self)
    }

    /// Read the address pins and resolve the channel count
    ///
    /// The pins are switched to pulled-up inputs and read MSB first. When
    /// the word matches no table entry the channel count drops to zero.
    pub fn read_channel_from_address_pins<G: Gpio>(
        &mut self,
        gpio: &mut G,
    ) -> Result<u8, ConfigError> {
        for pin in self.address_pins {
            gpio.pin_mode(pin, PinMode::InputPullup);
        }

        let mut pattern = 0u8;
        for pin in self.address_pins {
            pattern = (pattern << 1) | u8::from(gpio.digital_read(pin) == PinState::High);
        }

        let Some(entry) = self.versions.iter().find(|e| e.pattern == pattern).copied() else {
            warn!(target: TARGET, "address pattern {pattern:#07b} is not in the version table");
            self.channel_count = 0;
            self.io_size = 0;
            self.unresolved_pattern = Some(pattern);
            return Err(ConfigError::UnrecognizedTopology { pattern });
        };

        self.channel_count = entry.channels;
        self.version = entry.version;
        self.io_size = derive_io_size(entry.channels);
        self.unresolved_pattern = None;
        info!(
            target: TARGET,
            "address pattern {pattern:#07b}: {} channels, version {}",
            entry.channels,
            entry.version
        );
        Ok(entry.channels)
    }

    /// Resolve the board version for the current channel count
    pub fn read_version(&mut self) -> u8 {
        let channels = self.channel_count;
        self.version = self
            .versions
            .iter()
            .find(|e| e.channels == channels)
            .map_or_else(|| version_for_channels(channels), |e| e.version);
        self.version
    }

    pub fn set_channel(&mut self, channels: u8) -> Result<(), ConfigError> {
        if usize::from(channels) > MAX_CHANNELS {
            return Err(ConfigError::AllocationFailure {
                requested: usize::from(channels),
                capacity: MAX_CHANNELS,
            });
        }
        self.channel_count = channels;
        self.io_size = derive_io_size(channels);
        self.unresolved_pattern = None;
        Ok(())
    }

    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    /// Set the output pins, in channel order
    pub fn set_pins(&mut self, pins: &[u8]) -> Result<(), ConfigError> {
        self.wiring = Vec::from_slice(pins).map_err(|()| ConfigError::AllocationFailure {
            requested: pins.len(),
            capacity: MAX_CHANNELS,
        })?;
        self.pins = self.wiring.clone();
        Ok(())
    }

    pub fn set_address_pins(&mut self, pins: [u8; ADDRESS_PIN_COUNT]) {
        self.address_pins = pins;
    }

    pub fn set_i2c_addresses(&mut self, addresses: &[u8]) -> Result<(), ConfigError> {
        self.i2c_addresses =
            Vec::from_slice(addresses).map_err(|()| ConfigError::AllocationFailure {
                requested: addresses.len(),
                capacity: MAX_EXPANDERS,
            })?;
        Ok(())
    }

    /// Override the natural channel order with a 1-based wiring order
    pub fn apply_custom_sequence(&mut self, order: &[u8]) -> Result<(), ConfigError> {
        let order = Vec::from_slice(order).map_err(|()| ConfigError::AllocationFailure {
            requested: order.len(),
            capacity: MAX_CHANNELS,
        })?;
        self.custom_sequence = Some(order);
        Ok(())
    }

    /// Finalize the pin list for the configured mode
    ///
    /// In expander mode the list becomes the logical channels `0..n`. In the
    /// GPIO modes the list given through [`Self::set_pins`] must cover every
    /// channel. A custom sequence then permutes the list. The list is rebuilt
    /// from the wiring on every call, so finalizing twice gives the same pins.
    pub fn initialize_pins(&mut self) -> Result<(), ConfigError> {
        if self.channel_count == 0 {
            return Err(self
                .unresolved_pattern
                .map_or(ConfigError::ZeroChannels, |pattern| {
                    ConfigError::UnrecognizedTopology { pattern }
                }));
        }

        let natural: Vec<u8, MAX_CHANNELS> = match self.mode {
            ConfigMode::I2cExpander => {
                let mut channels = Vec::new();
                for channel in 0..self.channel_count {
                    let _ = channels.push(channel);
                }
                channels
            }
            ConfigMode::DirectIo | ConfigMode::Custom => {
                if self.wiring.len() != usize::from(self.channel_count) {
                    return Err(ConfigError::PinCountMismatch {
                        channels: self.channel_count,
                        pins: self.wiring.len(),
                    });
                }
                self.wiring.clone()
            }
        };

        let pins = match &self.custom_sequence {
            Some(order) => {
                if order.len() != natural.len() {
                    return Err(ConfigError::PinCountMismatch {
                        channels: self.channel_count,
                        pins: order.len(),
                    });
                }
                let mut ordered = Vec::new();
                for (position, &value) in order.iter().enumerate() {
                    let source = usize::from(value)
                        .checked_sub(1)
                        .and_then(|index| natural.get(index))
                        .ok_or(ConfigError::InvalidSequence { position, value })?;
                    let _ = ordered.push(*source);
                }
                ordered
            }
            None => natural,
        };
        self.pins = pins;

        debug!(target: TARGET, "pins initialized: {:?}", self.pins.as_slice());
        Ok(())
    }

    /// Configure every channel pin as an output driven high
    pub fn configure_outputs<G: Gpio>(&self, gpio: &mut G) {
        for &pin in &self.pins {
            gpio.pin_mode(pin, PinMode::Output);
            gpio.digital_write(pin, PinState::High);
        }
    }

    pub const fn mode(&self) -> ConfigMode {
        self.mode
    }

    pub const fn version(&self) -> u8 {
        self.version
    }

    pub const fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Number of expander chips the channel count requires
    pub const fn io_size(&self) -> u8 {
        self.io_size
    }

    pub fn pins(&self) -> &[u8] {
        &self.pins
    }

    pub const fn address_pins(&self) -> &[u8; ADDRESS_PIN_COUNT] {
        &self.address_pins
    }

    pub fn i2c_addresses(&self) -> &[u8] {
        &self.i2c_addresses
    }

    pub fn version_table(&self) -> &[VersionEntry] {
        &self.versions
    }

    pub fn custom_sequence(&self) -> Option<&[u8]> {
        self.custom_sequence.as_deref()
    }

    pub fn debug_dump(&self) {
        debug!(
            target: TARGET,
            "mode={:?} version={} channels={} io_size={}",
            self.mode,
            self.version,
            self.channel_count,
            self.io_size
        );
        debug!(target: TARGET, "address pins: {:?}", self.address_pins);
        debug!(target: TARGET, "i2c addresses: {:x?}", self.i2c_addresses.as_slice());
        debug!(target: TARGET, "pins: {:?}", self.pins.as_slice());
        for entry in &self.versions {
            debug!(
                target: TARGET,
                "pattern {:#07b} -> version {} / {} channels",
                entry.pattern,
                entry.version,
                entry.channels
            );
        }
    }
}
