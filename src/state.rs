//! Mode selection state owned by the engine

use heapless::Vec;
use log::warn;

use crate::control::ModeCommand;
use crate::sequence::{MODE_COUNT, MODE_TOTAL};

const TARGET: &str = "autolight::state";

/// Base step delay after boot
pub const DEFAULT_DELAY_MS: u32 = 50;
/// Step delays below this are raised to it
pub const MIN_DELAY_MS: u32 = 30;

/// Remaps externally visible sequence numbers onto catalogue modes
#[derive(Debug, Clone, Default)]
pub struct SequenceMap {
    active: Vec<u8, MODE_COUNT>,
}

impl SequenceMap {
    /// Build a map from catalogue indices
    ///
    /// Entries outside the catalogue are replaced by mode 0.
    pub fn new(modes: &[u8]) -> Self {
        let mut active = Vec::new();
        for &mode in modes.iter().take(MODE_COUNT) {
            let mode = if usize::from(mode) < MODE_COUNT {
                mode
            } else {
                warn!(target: TARGET, "mode {mode} does not exist, mapped to 0");
                0
            };
            let _ = active.push(mode);
        }
        Self { active }
    }

    /// Replace entries outside `0..total` by mode 0
    pub fn restrict(&mut self, total: u8) {
        for mode in self.active.iter_mut() {
            if *mode >= total {
                warn!(
                    target: TARGET,
                    "mode {mode} is beyond the {total} selectable modes, mapped to 0"
                );
                *mode = 0;
            }
        }
    }

    /// Permute the active list; rejects orders of a different size
    pub fn reorder(&mut self, modes: &[u8]) -> bool {
        if modes.len() != self.active.len() {
            return false;
        }
        *self = Self::new(modes);
        true
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn modes(&self) -> &[u8] {
        &self.active
    }

    /// Catalogue mode for an API index, wrapping
    pub fn mode_at(&self, index: usize) -> Option<u8> {
        if self.active.is_empty() {
            return None;
        }
        Some(self.active[index % self.active.len()])
    }

    /// API index of a catalogue mode
    pub fn position_of(&self, mode: u8) -> Option<usize> {
        self.active.iter().position(|&m| m == mode)
    }
}

/// Mutable core of the engine
///
/// Requests only move `pending_mode`; the dispatcher adopts it as
/// `current_mode` at the top of the next run.
#[derive(Debug, Clone)]
pub struct ChannelState {
    delay_time: u32,
    current_mode: u8,
    pending_mode: u8,
    total_modes: u8,
    reversed: bool,
    is_on: bool,
    last_active_mode: u8,
    map: Option<SequenceMap>,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelState {
    pub const fn new() -> Self {
        Self {
            delay_time: DEFAULT_DELAY_MS,
            current_mode: 0,
            pending_mode: 0,
            total_modes: MODE_TOTAL,
            reversed: false,
            is_on: false,
            last_active_mode: 1,
            map: None,
        }
    }

    /// Apply a command, returning `true` when a mode change was requested
    pub fn apply(&mut self, command: ModeCommand) -> bool {
        match command {
            ModeCommand::Next => self.next_mode(),
            ModeCommand::Previous => self.previous_mode(),
            ModeCommand::On => self.on_mode(),
            ModeCommand::Off => self.off_mode(),
            ModeCommand::Toggle => self.toggle_on_off(),
            ModeCommand::Cycle => self.cycle(),
            ModeCommand::Select(index) => self.change_mode_app(index),
            ModeCommand::SetDelay(ms) => {
                self.set_delay_time(ms);
                false
            }
        }
    }

    /// Queue `mode` for adoption at the next dispatch
    pub fn request(&mut self, mode: u8) -> bool {
        let mode = mode % self.total_modes;
        self.pending_mode = mode;
        if mode > 0 {
            self.last_active_mode = mode;
            self.is_on = true;
        } else {
            self.is_on = false;
        }
        true
    }

    pub fn next_mode(&mut self) -> bool {
        let next = match &self.map {
            Some(map) => self.mapped_step(map, 1),
            None => (self.pending_mode + 1) % self.total_modes,
        };
        self.request(next)
    }

    pub fn previous_mode(&mut self) -> bool {
        let previous = match &self.map {
            Some(map) => self.mapped_step(map, map.len().saturating_sub(1)),
            None => (self.pending_mode + self.total_modes - 1) % self.total_modes,
        };
        self.request(previous)
    }

    /// Restore the last active sequence; no-op while on
    pub fn on_mode(&mut self) -> bool {
        if self.is_on {
            return false;
        }
        self.request(self.last_active_mode.max(1))
    }

    /// Switch to mode 0; no-op while off
    pub fn off_mode(&mut self) -> bool {
        if !self.is_on {
            return false;
        }
        self.request(0)
    }

    pub fn toggle_on_off(&mut self) -> bool {
        if self.is_on {
            self.off_mode()
        } else {
            self.on_mode()
        }
    }

    /// Single-button stepping: off, 1, 2, ... last, off
    pub fn cycle(&mut self) -> bool {
        if !self.is_on {
            return self.request(1);
        }
        let next = self.pending_mode + 1;
        if next >= self.total_modes {
            self.request(0)
        } else {
            self.request(next)
        }
    }

    /// Absolute selection from a remote surface
    pub fn change_mode_app(&mut self, index: u8) -> bool {
        let mode = match &self.map {
            Some(map) => map.mode_at(usize::from(index)).unwrap_or(0),
            None => index,
        };
        self.request(mode)
    }

    fn mapped_step(&self, map: &SequenceMap, offset: usize) -> u8 {
        let position = map.position_of(self.pending_mode).map_or(0, |p| p + offset);
        map.mode_at(position).unwrap_or(0)
    }

    /// Prime both current and pending mode without raising a change
    pub fn set_init_sequence(&mut self, mode: u8) {
        let mode = mode % self.total_modes;
        self.current_mode = mode;
        self.pending_mode = mode;
        if mode > 0 {
            self.last_active_mode = mode;
        }
        self.is_on = mode > 0;
    }

    /// Limit the number of selectable modes to `1..=MODE_COUNT`
    pub fn set_total_sequence(&mut self, total: u8) {
        let total = total.clamp(1, MODE_TOTAL);
        self.total_modes = total;
        self.current_mode %= total;
        self.pending_mode %= total;
        if self.last_active_mode >= total {
            self.last_active_mode = 1;
        }
        if let Some(map) = &mut self.map {
            map.restrict(total);
        }
    }

    pub fn set_delay_time(&mut self, ms: u32) {
        self.delay_time = ms.max(MIN_DELAY_MS);
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub fn set_active_sequences(&mut self, modes: &[u8]) {
        self.map = if modes.is_empty() {
            None
        } else {
            let mut map = SequenceMap::new(modes);
            map.restrict(self.total_modes);
            Some(map)
        };
    }

    pub fn reorder_active_sequences(&mut self, modes: &[u8]) -> bool {
        let total = self.total_modes;
        self.map.as_mut().is_some_and(|map| {
            let reordered = map.reorder(modes);
            map.restrict(total);
            reordered
        })
    }

    /// Make the pending mode current, returning it
    pub fn adopt_pending(&mut self) -> u8 {
        self.current_mode = self.pending_mode;
        self.current_mode
    }

    pub const fn delay_time(&self) -> u32 {
        self.delay_time
    }

    pub const fn current_mode(&self) -> u8 {
        self.current_mode
    }

    pub const fn pending_mode(&self) -> u8 {
        self.pending_mode
    }

    pub const fn total_modes(&self) -> u8 {
        self.total_modes
    }

    pub const fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub const fn is_on(&self) -> bool {
        self.is_on
    }

    /// Whether the adopted mode lights anything
    pub const fn is_current_on(&self) -> bool {
        self.current_mode > 0
    }

    pub const fn last_active_mode(&self) -> u8 {
        self.last_active_mode
    }

    pub fn sequence_map(&self) -> Option<&SequenceMap> {
        self.map.as_ref()
    }

    /// Index reported to remote surfaces
    ///
    /// The API index when a map is set and lists the current mode, the raw
    /// mode otherwise.
    pub fn sequence_index(&self) -> u8 {
        match &self.map {
            Some(map) => map
                .position_of(self.current_mode)
                .and_then(|p| u8::try_from(p).ok())
                .unwrap_or(self.current_mode),
            None => self.current_mode,
        }
    }
}
