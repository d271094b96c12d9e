//! Peripheral adapters binding the supervisor core to board I/O.

#![cfg(target_os = "none")]

use embassy_stm32::gpio::{Input, Output};
use embassy_time::Instant as HalInstant;

use supervisor_core::clock::Instant;
use supervisor_core::ignition::IgnitionSampler;
use supervisor_core::power::PowerRelay;

/// Current time on the core's wrapping millisecond time base.
///
/// Truncating the 64-bit tick count to u32 gives exactly the wraparound the
/// core's arithmetic is built for.
pub fn now() -> Instant {
    Instant::from_millis(HalInstant::now().as_millis() as u32)
}

/// Relay driver feeding the supervised board. The relay coil is active-low,
/// so the pin idles high with the board unpowered.
pub struct RelayOutput {
    pin: Output<'static>,
}

impl RelayOutput {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }
}

impl PowerRelay for RelayOutput {
    fn set_power(&mut self, on: bool) {
        if on {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }
}

/// Ignition sense input.
pub struct IgnitionPin {
    pin: Input<'static>,
}

impl IgnitionPin {
    pub fn new(pin: Input<'static>) -> Self {
        Self { pin }
    }
}

impl IgnitionSampler for IgnitionPin {
    fn sample(&mut self) -> bool {
        self.pin.is_high()
    }
}
