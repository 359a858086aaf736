//! Channel engine: mode dispatch over the sequence catalogue
//!
//! The engine owns the channel state and is its only writer. Buttons and
//! remote surfaces reach it through [`Buttons`] and [`Control`]; both are
//! drained at every poll point, which is the top of
//! [`ChannelEngine::run_auto_light`] and every `set`/`sleep` call.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use log::{debug, info, trace};

use crate::button::{ButtonConfig, Buttons};
use crate::config::BoardConfig;
use crate::control::{CancellationToken, Control, EngineStatus, ModeCommand};
use crate::error::EngineError;
use crate::output::ChannelOutput;
use crate::sequence::{Lights, Mode, SplitMix64};
use crate::state::ChannelState;

const TARGET: &str = "autolight::engine";

const DEFAULT_SEED: u64 = 0x4155_544f_4c49_4748;

/// Channel engine - the main orchestrator
pub struct ChannelEngine<'a, O, D, const QUEUE_SIZE: usize> {
    // External dependencies
    control: &'a Control<QUEUE_SIZE>,
    buttons: Option<(&'a Buttons, ButtonConfig)>,
    output: O,
    delay: D,

    // Internal state
    config: Option<BoardConfig>,
    state: ChannelState,
    rng: SplitMix64,
    ready: bool,
}

impl<'a, O, D, const QUEUE_SIZE: usize> ChannelEngine<'a, O, D, QUEUE_SIZE>
where
    O: ChannelOutput,
    D: DelayNs,
{
    pub const fn new(control: &'a Control<QUEUE_SIZE>, output: O, delay: D) -> Self {
        Self {
            control,
            buttons: None,
            output,
            delay,
            config: None,
            state: ChannelState::new(),
            rng: SplitMix64::new(DEFAULT_SEED),
            ready: false,
        }
    }

    /// Store the board config; rejected once the engine is running
    pub fn attach_config(&mut self, config: BoardConfig) -> Result<(), EngineError> {
        if self.ready {
            return Err(EngineError::AlreadyInitialized);
        }
        self.config = Some(config);
        Ok(())
    }

    /// Read presses from `buttons`, mapped through `layout`
    pub fn attach_buttons(&mut self, buttons: &'a Buttons, layout: ButtonConfig) {
        self.buttons = Some((buttons, layout));
    }

    /// Seed the generator used by the random pattern
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SplitMix64::new(seed);
        self
    }

    /// Finalize the pins and bring up the output backend
    ///
    /// The engine stays idle until this succeeds.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.ready {
            return Err(EngineError::AlreadyInitialized);
        }
        let config = self.config.as_mut().ok_or(EngineError::MissingConfig)?;
        config.initialize_pins()?;
        self.output.begin(config)?;

        self.ready = true;
        info!(
            target: TARGET,
            "ready: {:?} board, {} channels, mode {}",
            config.mode(),
            config.channel_count(),
            self.state.current_mode()
        );
        self.publish();
        Ok(())
    }

    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_init_delay(&mut self, ms: u32) {
        self.state.set_delay_time(ms);
        self.publish();
    }

    /// Start in `mode` without a transition
    pub fn set_init_sequence(&mut self, mode: u8) {
        self.state.set_init_sequence(mode);
        self.publish();
    }

    pub fn set_total_sequence(&mut self, total: u8) {
        self.state.set_total_sequence(total);
        self.publish();
    }

    /// Invert output polarity for active-low boards
    pub fn reverse(&mut self, reversed: bool) {
        self.state.set_reversed(reversed);
    }

    pub fn set_active_sequences(&mut self, modes: &[u8]) {
        self.state.set_active_sequences(modes);
        self.publish();
    }

    pub fn reorder_active_sequences(&mut self, modes: &[u8]) -> bool {
        self.state.reorder_active_sequences(modes)
    }

    pub fn next_mode(&mut self) {
        self.apply(ModeCommand::Next);
    }

    pub fn previous_mode(&mut self) {
        self.apply(ModeCommand::Previous);
    }

    pub fn on_mode(&mut self) {
        self.apply(ModeCommand::On);
    }

    pub fn off_mode(&mut self) {
        self.apply(ModeCommand::Off);
    }

    pub fn toggle_on_off(&mut self) {
        self.apply(ModeCommand::Toggle);
    }

    pub fn change_mode_app(&mut self, index: u8) {
        self.apply(ModeCommand::Select(index));
    }

    pub fn get_sequence_index(&self) -> u8 {
        self.state.sequence_index()
    }

    pub const fn get_delay_time(&self) -> u32 {
        self.state.delay_time()
    }

    pub const fn state(&self) -> &ChannelState {
        &self.state
    }

    pub const fn config(&self) -> Option<&BoardConfig> {
        self.config.as_ref()
    }

    pub const fn output(&self) -> &O {
        &self.output
    }

    /// Token raised when a mode change is accepted
    pub fn token(&self) -> &'a CancellationToken {
        self.control.token()
    }

    /// Run one dispatch step
    ///
    /// Call this continuously from the main loop.
    pub fn run_auto_light(&mut self) {
        self.run_auto_light_with(|_| {});
    }

    /// Run one dispatch step, reporting adopted modes to `on_change`
    ///
    /// A pending mode change turns every output off and becomes current
    /// before the mode's pattern runs once. Does nothing until
    /// [`Self::initialize`] has succeeded.
    pub fn run_auto_light_with<F: FnMut(u8)>(&mut self, mut on_change: F) {
        if !self.ready {
            return;
        }
        self.poll();

        let control = self.control;
        let token = control.token();
        if token.is_cancelled() {
            self.force_off();
            let mode = self.state.adopt_pending();
            token.reset();
            info!(target: TARGET, "mode {mode} adopted");
            on_change(mode);
            self.publish();
        }

        let mode = Mode::from_raw(self.state.current_mode()).unwrap_or_default();
        mode.run(self, token);
    }

    /// Drive one output pin
    ///
    /// Skipped while a mode change is pending. Polarity follows
    /// [`Self::reverse`].
    pub fn set(&mut self, pin: u8, on: bool) {
        self.poll();
        if self.control.token().is_cancelled() {
            return;
        }
        let level = PinState::from(on ^ self.state.is_reversed());
        self.output.write(pin, level);
    }

    /// Block for `ms`, unless a mode change is pending
    pub fn sleep(&mut self, ms: u32) {
        self.poll();
        if self.control.token().is_cancelled() {
            return;
        }
        self.delay.delay_ms(ms);
    }

    /// Turn every output off, regardless of pending changes
    pub fn force_off(&mut self) {
        let level = PinState::from(self.state.is_reversed());
        let pins = self.config.as_ref().map_or(&[][..], BoardConfig::pins);
        self.output.write_all(pins, level);
    }

    /// Turn every channel on
    pub fn on(&mut self) {
        Lights::on(self);
    }

    /// Turn every channel off
    pub fn off(&mut self) {
        Lights::off(self);
    }

    /// Logical state of channel `index`, polarity-corrected
    pub fn channel_state(&mut self, index: usize) -> bool {
        let Some(pin) = self.pin(index) else {
            return false;
        };
        let level = self.output.read(pin);
        (level == PinState::High) ^ self.state.is_reversed()
    }

    pub fn debug_dump(&self) {
        debug!(
            target: TARGET,
            "ready={} mode={} pending={} total={} delay={} reversed={} on={} last_active={}",
            self.ready,
            self.state.current_mode(),
            self.state.pending_mode(),
            self.state.total_modes(),
            self.state.delay_time(),
            self.state.is_reversed(),
            self.state.is_on(),
            self.state.last_active_mode()
        );
        if let Some(config) = &self.config {
            config.debug_dump();
        }
    }

    fn pin(&self, index: usize) -> Option<u8> {
        self.config.as_ref()?.pins().get(index).copied()
    }

    /// Drain queued commands and button presses
    fn poll(&mut self) {
        while let Ok(command) = self.control.try_receive() {
            self.apply(command);
        }

        let Some((buttons, layout)) = self.buttons else {
            return;
        };
        for index in 0..layout.count() {
            if !buttons.consume_press(index) {
                continue;
            }
            if let Some(command) = layout.action(index, self.state.is_on()) {
                self.apply(command);
            }
        }
    }

    fn apply(&mut self, command: ModeCommand) {
        trace!(target: TARGET, "command {command:?}");
        if self.state.apply(command) {
            self.control.token().cancel();
        }
        self.publish();
    }

    fn publish(&self) {
        self.control.publish(EngineStatus {
            sequence_index: self.state.sequence_index(),
            delay_time: self.state.delay_time(),
            is_on: self.state.is_current_on(),
            ready: self.ready,
        });
    }
}

impl<O, D, const QUEUE_SIZE: usize> Lights for ChannelEngine<'_, O, D, QUEUE_SIZE>
where
    O: ChannelOutput,
    D: DelayNs,
{
    fn len(&self) -> usize {
        self.config.as_ref().map_or(0, |config| config.pins().len())
    }

    fn delay_time(&self) -> u32 {
        self.state.delay_time()
    }

    fn set_channel(&mut self, index: usize, on: bool) {
        if let Some(pin) = self.pin(index) {
            self.set(pin, on);
        }
    }

    fn sleep(&mut self, ms: u32) {
        ChannelEngine::sleep(self, ms);
    }

    fn random(&mut self, bound: usize) -> usize {
        self.rng.below(bound)
    }
}
