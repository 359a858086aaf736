//! Debounced, interrupt-fed push buttons
//!
//! The interrupt side only stamps and counts presses. All mode logic runs
//! later in the engine, which consumes presses at its poll points.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_time::Instant;
use log::debug;

use crate::control::ModeCommand;
use crate::error::ButtonError;
use crate::{Edge, Gpio, PinMode};

const TARGET: &str = "autolight::button";

/// Buttons supported by one board
pub const MAX_BUTTONS: usize = 4;
/// Debounce window used when none is given
pub const DEFAULT_DEBOUNCE_MS: u32 = 250;

#[derive(Debug, Clone, Copy)]
struct ButtonState {
    pin: Option<u8>,
    press_count: u32,
    pressed: bool,
    changed: bool,
    debounce_ms: u32,
    last_event: Option<Instant>,
    on_press: Option<fn(usize)>,
}

impl ButtonState {
    const fn new() -> Self {
        Self {
            pin: None,
            press_count: 0,
            pressed: false,
            changed: false,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            last_event: None,
            on_press: None,
        }
    }

    fn accepts(&self, now: Instant) -> bool {
        self.last_event.is_none_or(|last| {
            now.as_millis().saturating_sub(last.as_millis()) >= u64::from(self.debounce_ms)
        })
    }
}

/// Press state for up to [`MAX_BUTTONS`] buttons
///
/// Meant to live in a `static` shared between the interrupt handlers and
/// the engine.
pub struct Buttons {
    states: Mutex<RefCell<[ButtonState; MAX_BUTTONS]>>,
}

impl Default for Buttons {
    fn default() -> Self {
        Self::new()
    }
}

impl Buttons {
    pub const fn new() -> Self {
        Self {
            states: Mutex::new(RefCell::new([ButtonState::new(); MAX_BUTTONS])),
        }
    }

    /// Configure `pin` and install `isr` on it
    ///
    /// `isr` is the platform interrupt routine; it is expected to forward to
    /// [`Self::on_interrupt`] with the matching index.
    #[allow(clippy::too_many_arguments)]
    pub fn attach<G: Gpio>(
        &self,
        gpio: &mut G,
        index: usize,
        pin: u8,
        mode: PinMode,
        edge: Edge,
        isr: fn(),
        debounce_ms: u32,
    ) -> Result<(), ButtonError> {
        self.with_state(index, |state| {
            state.pin = Some(pin);
            state.debounce_ms = debounce_ms;
        })?;
        gpio.pin_mode(pin, mode);
        gpio.attach_interrupt(pin, edge, isr);
        debug!(target: TARGET, "button {index} attached to pin {pin}, debounce {debounce_ms}ms");
        Ok(())
    }

    /// Register a callback invoked from interrupt context on every accepted press
    pub fn set_callback(&self, index: usize, callback: Option<fn(usize)>) -> Result<(), ButtonError> {
        self.with_state(index, |state| state.on_press = callback)
    }

    /// Interrupt body: debounce and record a press
    ///
    /// Edges inside the debounce window are dropped. Returns whether the
    /// edge was accepted.
    pub fn on_interrupt(&self, index: usize, now: Instant) -> bool {
        let accepted = critical_section::with(|cs| {
            let mut states = self.states.borrow(cs).borrow_mut();
            let state = states.get_mut(index)?;
            if !state.accepts(now) {
                return None;
            }
            state.press_count = state.press_count.wrapping_add(1);
            state.pressed = true;
            state.changed = true;
            state.last_event = Some(now);
            Some(state.on_press)
        });

        match accepted {
            Some(callback) => {
                if let Some(callback) = callback {
                    callback(index);
                }
                true
            }
            None => false,
        }
    }

    /// Take a pending press, clearing it
    pub fn consume_press(&self, index: usize) -> bool {
        critical_section::with(|cs| {
            let mut states = self.states.borrow(cs).borrow_mut();
            states
                .get_mut(index)
                .is_some_and(|state| core::mem::take(&mut state.pressed))
        })
    }

    /// Pending press or an unacknowledged change
    pub fn is_pressed(&self, index: usize) -> bool {
        self.read(index, |state| state.pressed || state.changed)
    }

    pub fn is_changed(&self, index: usize) -> bool {
        self.read(index, |state| state.changed)
    }

    pub fn press_count(&self, index: usize) -> u32 {
        self.read(index, |state| state.press_count)
    }

    /// Clear the pressed and changed flags
    pub fn reset(&self, index: usize) -> Result<(), ButtonError> {
        self.with_state(index, |state| {
            state.pressed = false;
            state.changed = false;
        })
    }

    pub fn debug_dump(&self) {
        critical_section::with(|cs| {
            let states = self.states.borrow(cs).borrow();
            for (index, state) in states.iter().enumerate() {
                debug!(
                    target: TARGET,
                    "button {index}: pin={:?} count={} pressed={} changed={}",
                    state.pin,
                    state.press_count,
                    state.pressed,
                    state.changed
                );
            }
        });
    }

    fn with_state(
        &self,
        index: usize,
        f: impl FnOnce(&mut ButtonState),
    ) -> Result<(), ButtonError> {
        critical_section::with(|cs| {
            let mut states = self.states.borrow(cs).borrow_mut();
            let state = states.get_mut(index).ok_or(ButtonError { index })?;
            f(state);
            Ok(())
        })
    }

    fn read<T: Default>(&self, index: usize, f: impl FnOnce(&ButtonState) -> T) -> T {
        critical_section::with(|cs| {
            let states = self.states.borrow(cs).borrow();
            states.get(index).map(f).unwrap_or_default()
        })
    }
}

/// Button layout of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonMode {
    /// One button cycling off, 1, 2, ... last, off
    Single,
    /// Toggle and next
    Dual,
    /// On, off and next
    Triple,
    /// On, off, next and previous
    Quad,
    /// Caller-assigned command per button
    Custom,
}

/// Maps button presses to mode commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonConfig {
    mode: ButtonMode,
    count: usize,
    custom: [Option<ModeCommand>; MAX_BUTTONS],
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self::new(ButtonMode::Quad)
    }
}

impl ButtonConfig {
    pub const fn new(mode: ButtonMode) -> Self {
        let count = match mode {
            ButtonMode::Single => 1,
            ButtonMode::Dual => 2,
            ButtonMode::Triple => 3,
            ButtonMode::Quad => 4,
            ButtonMode::Custom => 0,
        };
        Self {
            mode,
            count,
            custom: [None; MAX_BUTTONS],
        }
    }

    /// Custom layout, one command per button in index order
    pub fn custom(commands: &[ModeCommand]) -> Self {
        let mut config = Self::new(ButtonMode::Custom);
        for (slot, command) in config.custom.iter_mut().zip(commands) {
            *slot = Some(*command);
        }
        config.count = commands.len().min(MAX_BUTTONS);
        config
    }

    /// Restrict how many buttons are read
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = if count > MAX_BUTTONS { MAX_BUTTONS } else { count };
        self
    }

    pub const fn mode(&self) -> ButtonMode {
        self.mode
    }

    pub const fn count(&self) -> usize {
        self.count
    }

    /// Command for a press on `index`, given the current power state
    pub fn action(&self, index: usize, is_on: bool) -> Option<ModeCommand> {
        if index >= self.count {
            return None;
        }
        let when_on = |command| if is_on { Some(command) } else { None };
        match (self.mode, index) {
            (ButtonMode::Single, 0) => Some(ModeCommand::Cycle),
            (ButtonMode::Dual, 0) => Some(ModeCommand::Toggle),
            (ButtonMode::Dual, 1) | (ButtonMode::Triple | ButtonMode::Quad, 2) => {
                when_on(ModeCommand::Next)
            }
            (ButtonMode::Triple | ButtonMode::Quad, 0) => Some(ModeCommand::On),
            (ButtonMode::Triple | ButtonMode::Quad, 1) => Some(ModeCommand::Off),
            (ButtonMode::Quad, 3) => when_on(ModeCommand::Previous),
            (ButtonMode::Custom, _) => self.custom[index],
            _ => None,
        }
    }
}
