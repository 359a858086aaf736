//! Bank of 8-line I2C output expanders
//!
//! Each chip is driven like a PCF8574: one byte written to its address sets
//! all eight lines. The bank keeps a latch per chip so single lines can be
//! changed without reading back from the bus.

use embedded_hal::digital::PinState;
use embedded_hal::i2c::I2c;
use heapless::Vec;
use log::{debug, info, warn};

use crate::config::{BoardConfig, ConfigMode, LINES_PER_EXPANDER, MAX_EXPANDERS};
use crate::error::{EngineError, ExpanderError};
use crate::output::ChannelOutput;

const TARGET: &str = "autolight::expander";

/// One expander chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderHandle {
    address: u8,
    latch: u8,
    online: bool,
}

impl ExpanderHandle {
    const fn new(address: u8) -> Self {
        Self {
            address,
            latch: 0xFF,
            online: false,
        }
    }

    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Last value written to the eight lines
    pub const fn latch(&self) -> u8 {
        self.latch
    }

    /// Whether the chip answered during set-up
    pub const fn is_online(&self) -> bool {
        self.online
    }

    fn set_line(&mut self, line: u8, level: PinState) {
        let mask = 1 << line;
        match level {
            PinState::High => self.latch |= mask,
            PinState::Low => self.latch &= !mask,
        }
    }
}

/// Expanders covering every channel of an I2C board
///
/// Channel `c` lives on chip `c / 8`, line `c % 8`.
pub struct ExpanderBank<I2C> {
    bus: I2C,
    expanders: Vec<ExpanderHandle, MAX_EXPANDERS>,
}

impl<I2C: I2c> ExpanderBank<I2C> {
    /// Create an empty bank; chips are registered by [`ChannelOutput::begin`]
    pub const fn new(bus: I2C) -> Self {
        Self {
            bus,
            expanders: Vec::new(),
        }
    }

    /// Register and start the chips `config` requires
    pub fn build(bus: I2C, config: &BoardConfig) -> Result<Self, ExpanderError> {
        let mut bank = Self::new(bus);
        bank.configure(config)?;
        Ok(bank)
    }

    /// Register `io_size` chips from the configured address table
    ///
    /// Chips that fail to start stay registered and silently ignore writes.
    /// Fails only when no chip answered at all.
    pub fn configure(&mut self, config: &BoardConfig) -> Result<(), ExpanderError> {
        let requested = usize::from(config.io_size());
        let addresses = config.i2c_addresses();
        if requested > addresses.len() {
            return Err(ExpanderError::AllocationFailure {
                requested,
                available: addresses.len(),
            });
        }

        self.expanders.clear();
        for &address in &addresses[..requested] {
            let mut handle = ExpanderHandle::new(address);
            handle.online = self.bus.write(address, &[handle.latch]).is_ok();
            if !handle.online {
                warn!(target: TARGET, "expander at {address:#04x} did not respond");
            }
            // Capacity equals MAX_EXPANDERS, the address table cannot exceed it
            let _ = self.expanders.push(handle);
        }

        let online = self.expanders.iter().filter(|e| e.online).count();
        if online == 0 {
            return Err(ExpanderError::InitFailure {
                attempted: requested,
            });
        }
        info!(target: TARGET, "{online}/{requested} expanders online");
        Ok(())
    }

    /// Drive one logical channel
    ///
    /// Indices past the bank are ignored.
    pub fn write_line(&mut self, channel: u16, level: PinState) {
        let Some((handle, line)) = self.locate(channel) else {
            return;
        };
        let handle = &mut self.expanders[handle];
        handle.set_line(line, level);
        if handle.online {
            let _ = self.bus.write(handle.address, &[handle.latch]);
        }
    }

    /// Drive every line of every chip
    pub fn write_all(&mut self, level: PinState) {
        let latch = match level {
            PinState::High => 0xFF,
            PinState::Low => 0x00,
        };
        for handle in &mut self.expanders {
            handle.latch = latch;
            if handle.online {
                let _ = self.bus.write(handle.address, &[latch]);
            }
        }
    }

    /// Latched level of a channel
    pub fn read_line(&self, channel: u16) -> Option<PinState> {
        let (handle, line) = self.locate(channel)?;
        let bit = self.expanders[handle].latch & (1 << line) != 0;
        Some(PinState::from(bit))
    }

    pub fn expanders(&self) -> &[ExpanderHandle] {
        &self.expanders
    }

    pub fn line_count(&self) -> usize {
        self.expanders.len() * usize::from(LINES_PER_EXPANDER)
    }

    /// Give back the bus
    pub fn release(self) -> I2C {
        self.bus
    }

    pub fn debug_dump(&self) {
        for (index, handle) in self.expanders.iter().enumerate() {
            debug!(
                target: TARGET,
                "expander {index}: address={:#04x} latch={:#010b} online={}",
                handle.address,
                handle.latch,
                handle.online
            );
        }
    }

    fn locate(&self, channel: u16) -> Option<(usize, u8)> {
        let lines = u16::from(LINES_PER_EXPANDER);
        let handle = usize::from(channel / lines);
        if handle >= self.expanders.len() {
            return None;
        }
        let line = u8::try_from(channel % lines).ok()?;
        Some((handle, line))
    }
}

impl<I2C: I2c> ChannelOutput for ExpanderBank<I2C> {
    fn begin(&mut self, config: &BoardConfig) -> Result<(), EngineError> {
        if config.mode() != ConfigMode::I2cExpander {
            return Err(EngineError::ModeMismatch { mode: config.mode() });
        }
        self.configure(config)?;
        Ok(())
    }

    fn write(&mut self, pin: u8, level: PinState) {
        self.write_line(u16::from(pin), level);
    }

    fn read(&mut self, pin: u8) -> PinState {
        self.read_line(u16::from(pin)).unwrap_or(PinState::Low)
    }

    fn write_all(&mut self, _pins: &[u8], level: PinState) {
        ExpanderBank::write_all(self, level);
    }
}
