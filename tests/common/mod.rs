#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use autolight_engine::{
    BoardConfig, CancellationToken, ChannelOutput, ConfigMode, Edge, EngineError, ExpanderError,
    Gpio, Lights, PinMode, PinState,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// GPIO fake sharing its state between clones
#[derive(Default)]
pub struct GpioLog {
    pub modes: HashMap<u8, PinMode>,
    pub levels: HashMap<u8, PinState>,
    pub writes: Vec<(u8, PinState)>,
    pub interrupts: Vec<(u8, Edge)>,
}

#[derive(Clone, Default)]
pub struct MockGpio(pub Rc<RefCell<GpioLog>>);

impl MockGpio {
    pub fn set_input(&self, pin: u8, level: PinState) {
        self.0.borrow_mut().levels.insert(pin, level);
    }

    pub fn level(&self, pin: u8) -> Option<PinState> {
        self.0.borrow().levels.get(&pin).copied()
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.0.borrow().modes.get(&pin).copied()
    }
}

impl Gpio for MockGpio {
    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        self.0.borrow_mut().modes.insert(pin, mode);
    }

    fn digital_write(&mut self, pin: u8, level: PinState) {
        let mut log = self.0.borrow_mut();
        log.writes.push((pin, level));
        log.levels.insert(pin, level);
    }

    fn digital_read(&mut self, pin: u8) -> PinState {
        self.level(pin).unwrap_or(PinState::Low)
    }

    fn attach_interrupt(&mut self, pin: u8, edge: Edge, _handler: fn()) {
        self.0.borrow_mut().interrupts.push((pin, edge));
    }
}

/// I2C fake recording single-byte expander writes
#[derive(Default)]
pub struct BusLog {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub offline: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MockBus(pub Rc<RefCell<BusLog>>);

impl MockBus {
    pub fn with_offline(addresses: &[u8]) -> Self {
        let bus = Self::default();
        bus.0.borrow_mut().offline.extend_from_slice(addresses);
        bus
    }

    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.0.borrow().writes.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().writes.clear();
    }

    pub fn last_byte_to(&self, address: u8) -> Option<u8> {
        self.0
            .borrow()
            .writes
            .iter()
            .rev()
            .find(|(a, _)| *a == address)
            .and_then(|(_, bytes)| bytes.first().copied())
    }
}

impl ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut log = self.0.borrow_mut();
        if log.offline.contains(&address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for operation in operations {
            if let Operation::Write(bytes) = operation {
                log.writes.push((address, bytes.to_vec()));
            }
        }
        Ok(())
    }
}

/// Delay that records requested milliseconds instead of blocking
#[derive(Clone, Default)]
pub struct MockDelay(pub Rc<RefCell<Vec<u32>>>);

impl MockDelay {
    pub fn sleeps(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }

    pub fn total_ms(&self) -> u64 {
        self.0.borrow().iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(ms);
    }
}

/// Output backend recording everything the engine drives
#[derive(Default)]
pub struct OutputLog {
    pub begun: usize,
    /// Number of upcoming `begin` calls that fail
    pub failing_begins: usize,
    pub writes: Vec<(u8, PinState)>,
    pub write_all: Vec<PinState>,
    pub levels: HashMap<u8, PinState>,
}

#[derive(Clone, Default)]
pub struct RecordingOutput(pub Rc<RefCell<OutputLog>>);

impl RecordingOutput {
    pub fn force_offs(&self) -> usize {
        self.0.borrow().write_all.len()
    }

    pub fn write_count(&self) -> usize {
        self.0.borrow().writes.len()
    }
}

impl ChannelOutput for RecordingOutput {
    fn begin(&mut self, _config: &BoardConfig) -> Result<(), EngineError> {
        let mut log = self.0.borrow_mut();
        if log.failing_begins > 0 {
            log.failing_begins -= 1;
            return Err(ExpanderError::InitFailure { attempted: 1 }.into());
        }
        log.begun += 1;
        Ok(())
    }

    fn write(&mut self, pin: u8, level: PinState) {
        let mut log = self.0.borrow_mut();
        log.writes.push((pin, level));
        log.levels.insert(pin, level);
    }

    fn read(&mut self, pin: u8) -> PinState {
        self.0
            .borrow()
            .levels
            .get(&pin)
            .copied()
            .unwrap_or(PinState::Low)
    }

    fn write_all(&mut self, pins: &[u8], level: PinState) {
        let mut log = self.0.borrow_mut();
        log.write_all.push(level);
        for &pin in pins {
            log.levels.insert(pin, level);
        }
    }
}

/// Direct-IO board with GPIO pins `10..10 + channels`
pub fn direct_config(channels: u8) -> BoardConfig {
    let mut config = BoardConfig::new(ConfigMode::DirectIo);
    config.set_channel(channels).unwrap();
    let pins: Vec<u8> = (0..channels).map(|c| c + 10).collect();
    config.set_pins(&pins).unwrap();
    config
}

/// Expander board with `channels` logical channels
pub fn expander_config(channels: u8) -> BoardConfig {
    let mut config = BoardConfig::new(ConfigMode::I2cExpander);
    config.set_channel(channels).unwrap();
    config
}

/// In-memory `Lights` for exercising patterns directly
pub struct FakeLights<'a> {
    pub states: Vec<bool>,
    pub delay: u32,
    pub writes: usize,
    pub out_of_range: usize,
    pub sleeps: Vec<u32>,
    /// Lit channel count at every sleep
    pub snapshots: Vec<usize>,
    /// Calls made after the token was raised
    pub calls_after_cancel: usize,
    rng: u64,
    token: Option<(&'a CancellationToken, usize)>,
}

impl<'a> FakeLights<'a> {
    pub fn new(len: usize) -> Self {
        Self {
            states: vec![false; len],
            delay: 50,
            writes: 0,
            out_of_range: 0,
            sleeps: Vec::new(),
            snapshots: Vec::new(),
            calls_after_cancel: 0,
            rng: 7,
            token: None,
        }
    }

    /// Raise `token` once `writes` channel writes have happened
    pub fn cancel_after(mut self, token: &'a CancellationToken, writes: usize) -> Self {
        self.token = Some((token, writes));
        self
    }

    pub fn lit(&self) -> usize {
        self.states.iter().filter(|&&on| on).count()
    }

    fn cancelled(&self) -> bool {
        self.token.is_some_and(|(token, _)| token.is_cancelled())
    }
}

impl Lights for FakeLights<'_> {
    fn len(&self) -> usize {
        self.states.len()
    }

    fn delay_time(&self) -> u32 {
        self.delay
    }

    fn set_channel(&mut self, index: usize, on: bool) {
        if self.cancelled() {
            self.calls_after_cancel += 1;
            return;
        }
        let Some(state) = self.states.get_mut(index) else {
            self.out_of_range += 1;
            return;
        };
        *state = on;
        self.writes += 1;
        if let Some((token, limit)) = self.token {
            if self.writes >= limit {
                token.cancel();
            }
        }
    }

    fn sleep(&mut self, ms: u32) {
        if self.cancelled() {
            self.calls_after_cancel += 1;
            return;
        }
        self.sleeps.push(ms);
        let lit = self.lit();
        self.snapshots.push(lit);
    }

    fn random(&mut self, bound: usize) -> usize {
        self.rng = self
            .rng
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        if bound == 0 {
            0
        } else {
            ((self.rng >> 33) as usize) % bound
        }
    }
}
