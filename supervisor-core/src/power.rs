//! Relay control and reboot spacing for the supervised board.
//!
//! The sequencer is the only writer of [`PowerState`]. Its one policy beyond
//! pass-through relay control is the minimum-off-interval gate, which keeps
//! the relay from chattering during a reboot cycle.

use crate::clock::{Duration, Instant};

/// Drives the relay that feeds the supervised board.
pub trait PowerRelay {
    /// Applies the requested power level to the relay.
    fn set_power(&mut self, on: bool);
}

/// Relay double that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPowerRelay;

impl NoopPowerRelay {
    /// Creates a new no-op relay.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PowerRelay for NoopPowerRelay {
    fn set_power(&mut self, _: bool) {}
}

/// Current relay state and the time power was last removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PowerState {
    powered: bool,
    powered_off_at: Instant,
}

impl PowerState {
    /// Whether the board is currently powered.
    #[must_use]
    pub const fn is_powered(&self) -> bool {
        self.powered
    }

    /// Time power was last removed.
    #[must_use]
    pub const fn powered_off_at(&self) -> Instant {
        self.powered_off_at
    }
}

/// Boot/shutdown sequencing with reboot spacing.
pub struct PowerSequencer {
    state: PowerState,
    minimum_off_interval: Duration,
}

impl PowerSequencer {
    /// Creates a sequencer; the board starts unpowered with the off-timestamp
    /// at counter zero, so the first boot also waits out the off interval.
    #[must_use]
    pub const fn new(minimum_off_interval: Duration) -> Self {
        Self {
            state: PowerState {
                powered: false,
                powered_off_at: Instant::ZERO,
            },
            minimum_off_interval,
        }
    }

    /// Current power state.
    #[must_use]
    pub const fn state(&self) -> PowerState {
        self.state
    }

    /// Whether the board is currently powered.
    #[must_use]
    pub const fn is_powered(&self) -> bool {
        self.state.powered
    }

    /// Powers the board on when every gate passes.
    ///
    /// The gates: currently unpowered, ignition latched on, and at least the
    /// minimum off interval elapsed since power was last removed. Returns
    /// `true` when power was applied; the caller is then responsible for
    /// starting the watchdog's boot grace timer.
    pub fn try_boot<R: PowerRelay>(
        &mut self,
        relay: &mut R,
        ignition_on: bool,
        now: Instant,
    ) -> bool {
        if self.state.powered || !ignition_on {
            return false;
        }
        if !now.has_elapsed(self.state.powered_off_at, self.minimum_off_interval) {
            return false;
        }

        relay.set_power(true);
        self.state.powered = true;
        true
    }

    /// Removes board power unconditionally and stamps the off time.
    pub fn shutdown<R: PowerRelay>(&mut self, relay: &mut R, now: Instant) {
        relay.set_power(false);
        self.state.powered_off_at = now;
        self.state.powered = false;
    }
}
