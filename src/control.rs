//! Hand-off between interrupt/remote contexts and the dispatch loop
//!
//! A bounded command queue built on `critical-section` and
//! `heapless::Deque`, plus the last status published by the engine.
//! The engine is the only consumer and the only writer of channel state;
//! every other context talks to it through [`ControlHandle`].

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use heapless::Deque;

use crate::state::DEFAULT_DELAY_MS;

/// Error returned when trying to send to a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrySendError<T>(pub T);

/// Error returned when trying to receive from an empty queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReceiveError;

/// Mode change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommand {
    /// Advance to the next mode, wrapping
    Next,
    /// Step back to the previous mode, wrapping
    Previous,
    /// Restore the last active sequence
    On,
    /// Switch to mode 0, remembering the active sequence
    Off,
    Toggle,
    /// Single-button cycle: off, 1, 2, ... last, off
    Cycle,
    /// Absolute selection, reduced modulo the mode count
    Select(u8),
    /// Change the base step delay
    SetDelay(u32),
}

/// Snapshot of the engine state visible to other contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub sequence_index: u8,
    pub delay_time: u32,
    pub is_on: bool,
    pub ready: bool,
}

impl EngineStatus {
    pub const fn new() -> Self {
        Self {
            sequence_index: 0,
            delay_time: DEFAULT_DELAY_MS,
            is_on: false,
            ready: false,
        }
    }
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative cancellation flag for the running sequence
///
/// Raised when a mode change is accepted, cleared by the dispatcher once
/// the new mode is adopted.
#[derive(Debug)]
pub struct CancellationToken {
    cancelled: Mutex<Cell<bool>>,
}

impl CancellationToken {
    pub const fn new() -> Self {
        Self {
            cancelled: Mutex::new(Cell::new(false)),
        }
    }

    pub fn cancel(&self) {
        critical_section::with(|cs| self.cancelled.borrow(cs).set(true));
    }

    pub fn is_cancelled(&self) -> bool {
        critical_section::with(|cs| self.cancelled.borrow(cs).get())
    }

    pub fn reset(&self) {
        critical_section::with(|cs| self.cancelled.borrow(cs).set(false));
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared control block, usually placed in a `static`
pub struct Control<const SIZE: usize> {
    commands: Mutex<RefCell<Deque<ModeCommand, SIZE>>>,
    status: Mutex<Cell<EngineStatus>>,
    token: CancellationToken,
}

impl<const SIZE: usize> Control<SIZE> {
    pub const fn new() -> Self {
        Self {
            commands: Mutex::new(RefCell::new(Deque::new())),
            status: Mutex::new(Cell::new(EngineStatus::new())),
            token: CancellationToken::new(),
        }
    }

    /// Get a handle for issuing commands.
    ///
    /// Multiple handles can coexist; they share the same queue.
    pub const fn handle(&self) -> ControlHandle<'_, SIZE> {
        ControlHandle { control: self }
    }

    /// Try to queue a command.
    ///
    /// Returns `Err(TrySendError(command))` if the queue is full.
    pub fn try_send(&self, command: ModeCommand) -> Result<(), TrySendError<ModeCommand>> {
        critical_section::with(|cs| {
            let mut queue = self.commands.borrow(cs).borrow_mut();
            queue.push_back(command).map_err(TrySendError)
        })
    }

    /// Try to take the oldest queued command.
    ///
    /// Returns `Err(TryReceiveError)` if the queue is empty.
    pub fn try_receive(&self) -> Result<ModeCommand, TryReceiveError> {
        critical_section::with(|cs| {
            let mut queue = self.commands.borrow(cs).borrow_mut();
            queue.pop_front().ok_or(TryReceiveError)
        })
    }

    pub fn status(&self) -> EngineStatus {
        critical_section::with(|cs| self.status.borrow(cs).get())
    }

    pub(crate) fn publish(&self, status: EngineStatus) {
        critical_section::with(|cs| self.status.borrow(cs).set(status));
    }

    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl<const SIZE: usize> Default for Control<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote control surface for a [`Control`] block.
///
/// Lightweight and `Copy`; safe to use from interrupt handlers or other
/// tasks. Requests take effect at the engine's next poll point.
#[derive(Clone, Copy)]
pub struct ControlHandle<'a, const SIZE: usize> {
    control: &'a Control<SIZE>,
}

impl<const SIZE: usize> ControlHandle<'_, SIZE> {
    pub fn next_mode(&self) -> Result<(), TrySendError<ModeCommand>> {
        self.control.try_send(ModeCommand::Next)
    }

    pub fn previous_mode(&self) -> Result<(), TrySendError<ModeCommand>> {
        self.control.try_send(ModeCommand::Previous)
    }

    pub fn on_mode(&self) -> Result<(), TrySendError<ModeCommand>> {
        self.control.try_send(ModeCommand::On)
    }

    pub fn off_mode(&self) -> Result<(), TrySendError<ModeCommand>> {
        self.control.try_send(ModeCommand::Off)
    }

    pub fn toggle_on_off(&self) -> Result<(), TrySendError<ModeCommand>> {
        self.control.try_send(ModeCommand::Toggle)
    }

    pub fn change_mode_app(&self, index: u8) -> Result<(), TrySendError<ModeCommand>> {
        self.control.try_send(ModeCommand::Select(index))
    }

    pub fn set_init_delay(&self, ms: u32) -> Result<(), TrySendError<ModeCommand>> {
        self.control.try_send(ModeCommand::SetDelay(ms))
    }

    /// Mode index reported by the engine at its last poll
    pub fn sequence_index(&self) -> u8 {
        self.control.status().sequence_index
    }

    pub fn delay_time(&self) -> u32 {
        self.control.status().delay_time
    }

    pub fn is_on(&self) -> bool {
        self.control.status().is_on
    }

    pub fn is_ready(&self) -> bool {
        self.control.status().ready
    }
}
