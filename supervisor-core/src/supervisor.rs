//! The owned supervisor context coordinating every component.
//!
//! One [`Supervisor`] value holds the configuration and all mutable state:
//! ignition latch, debounce filter, watchdog, power sequencer, frame decoder,
//! and diagnostics. The polling loop calls [`Supervisor::tick`]; the bus
//! transport calls [`Supervisor::handle_receive`] and
//! [`Supervisor::handle_fill`]. The embedding is responsible for the mutual
//! exclusion between those two contexts.

use crate::clock::Instant;
use crate::config::SupervisorConfig;
use crate::diag::{EventLog, SupervisorEvent};
use crate::ignition::{DebounceFilter, IgnitionSampler, IgnitionState};
use crate::power::{PowerRelay, PowerSequencer};
use crate::protocol::{
    DebugCommand, FrameDecoder, HostCommand, ProtocolError, RESPONSE_LEN, ResponseFrame,
};
use crate::watchdog::{Watchdog, WatchdogEvent, WatchdogPhase};

/// Supervisor context, generic over the relay actuator and ignition sampler.
pub struct Supervisor<R, S> {
    config: SupervisorConfig,
    ignition: IgnitionState,
    debounce: DebounceFilter,
    watchdog: Watchdog,
    power: PowerSequencer,
    decoder: FrameDecoder,
    events: EventLog,
    relay: R,
    sampler: S,
    debounce_enabled: bool,
    test_counter: u8,
}

impl<R, S> Supervisor<R, S>
where
    R: PowerRelay,
    S: IgnitionSampler,
{
    /// Builds the supervisor with everything at its power-on state.
    pub fn new(config: SupervisorConfig, relay: R, sampler: S) -> Self {
        Self {
            ignition: IgnitionState::new(),
            debounce: DebounceFilter::new(config.debounce_interval, config.debounce_retries),
            watchdog: Watchdog::new(&config),
            power: PowerSequencer::new(config.minimum_off_interval),
            decoder: FrameDecoder::new(),
            events: EventLog::new(),
            relay,
            sampler,
            debounce_enabled: true,
            test_counter: 1,
            config,
        }
    }

    /// One polling-loop iteration: debounce, watchdog, then boot sequencing.
    pub fn tick(&mut self, now: Instant) {
        if self.debounce_enabled
            && self
                .debounce
                .poll(&mut self.sampler, &mut self.ignition, now)
        {
            let on = self.ignition.is_on();
            self.events.record(SupervisorEvent::IgnitionLatched { on }, now);
        }

        if let Some(event) = self.watchdog.poll(now) {
            match event {
                WatchdogEvent::PatTimeout => {
                    self.test_counter = self.test_counter.wrapping_add(1);
                    self.events.record(SupervisorEvent::PatTimeout, now);
                }
                WatchdogEvent::ShutdownDue => {
                    self.test_counter = self.test_counter.wrapping_add(1);
                    self.shutdown(now);
                }
                WatchdogEvent::BootTimeout => {
                    self.events.record(SupervisorEvent::BootTimeout, now);
                    self.shutdown(now);
                }
            }
        }

        if self
            .power
            .try_boot(&mut self.relay, self.ignition.is_on(), now)
        {
            self.watchdog.begin_boot(now);
            self.events.record(SupervisorEvent::BootStarted, now);
        }
    }

    /// Bus delivery event: feeds raw bytes into the frame decoder.
    pub fn handle_receive(&mut self, bytes: &[u8]) {
        self.decoder.receive(bytes);
    }

    /// Bus response request: always yields exactly one 4-byte frame.
    ///
    /// The response's error field reflects at most one pending or dispatch
    /// error, and any latched error clears here so it is visible for exactly
    /// one response.
    pub fn handle_fill(&mut self, now: Instant) -> [u8; RESPONSE_LEN] {
        let opcode = self.decoder.opcode();
        let pending = self.decoder.take_error();

        let response = if !self.decoder.is_complete() {
            self.record_fault(ProtocolError::CommandIncomplete, now)
        } else if let Some(error) = pending {
            self.events.record(SupervisorEvent::ProtocolFault(error), now);
            ResponseFrame::failed(error, opcode)
        } else {
            self.dispatch(now)
        };

        response.to_bytes()
    }

    /// Latched ignition state.
    #[must_use]
    pub const fn ignition(&self) -> IgnitionState {
        self.ignition
    }

    /// Current watchdog phase.
    #[must_use]
    pub const fn watchdog_phase(&self) -> WatchdogPhase {
        self.watchdog.phase()
    }

    /// Whether the supervised board is powered.
    #[must_use]
    pub const fn is_powered(&self) -> bool {
        self.power.is_powered()
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Diagnostics history.
    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Whether the debounce filter currently runs.
    #[must_use]
    pub const fn is_debounce_enabled(&self) -> bool {
        self.debounce_enabled
    }

    /// Diagnostic test counter.
    #[must_use]
    pub const fn test_counter(&self) -> u8 {
        self.test_counter
    }

    /// Relay actuator, for embeddings that surface its state.
    #[must_use]
    pub const fn relay(&self) -> &R {
        &self.relay
    }

    /// Ignition sampler, for embeddings that drive a simulated line.
    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    fn shutdown(&mut self, now: Instant) {
        self.power.shutdown(&mut self.relay, now);
        self.events.record(SupervisorEvent::ShutdownIssued, now);
    }

    fn record_fault(&mut self, error: ProtocolError, now: Instant) -> ResponseFrame {
        self.events.record(SupervisorEvent::ProtocolFault(error), now);
        ResponseFrame::failed(error, self.decoder.opcode())
    }

    fn dispatch(&mut self, now: Instant) -> ResponseFrame {
        let opcode = self.decoder.opcode();
        let params = self.decoder.params();

        let Some(command) = HostCommand::from_opcode(opcode) else {
            return self.record_fault(ProtocolError::UnknownCommand, now);
        };
        if command.is_debug() && !self.config.debug_mode {
            return self.record_fault(ProtocolError::UnknownCommand, now);
        }

        match command {
            HostCommand::GetIgnitionState => {
                ResponseFrame::with_value(opcode, u16::from(self.ignition.is_on()))
            }
            HostCommand::GetIgnitionChangeSeconds => {
                ResponseFrame::with_value(opcode, self.ignition_changed_last(now, true))
            }
            HostCommand::GetIgnitionChangeMinutes => {
                ResponseFrame::with_value(opcode, self.ignition_changed_last(now, false))
            }
            HostCommand::Echo => ResponseFrame::ok(opcode, params),
            HostCommand::PatWatchdog => {
                self.watchdog.pat(now);
                self.events.record(SupervisorEvent::PatReceived, now);
                ResponseFrame::with_value(opcode, 0)
            }
            HostCommand::Debug(debug) => self.dispatch_debug(debug, params, now),
        }
    }

    fn dispatch_debug(
        &mut self,
        command: DebugCommand,
        params: [u8; 2],
        now: Instant,
    ) -> ResponseFrame {
        let opcode = self.decoder.opcode();
        match command {
            DebugCommand::SetDebounceEnabled => {
                self.debounce_enabled = params[0] != 0;
                ResponseFrame::with_value(opcode, 0)
            }
            DebugCommand::ForceIgnitionState => {
                let on = params[0] != 0;
                if self.ignition.latch(on, now) {
                    self.events.record(SupervisorEvent::IgnitionForced { on }, now);
                }
                ResponseFrame::with_value(opcode, 0)
            }
            DebugCommand::GetDebounceEnabled => {
                ResponseFrame::with_value(opcode, u16::from(self.debounce_enabled))
            }
            DebugCommand::GetTestCounter => {
                ResponseFrame::with_value(opcode, u16::from(self.test_counter))
            }
            DebugCommand::GetWatchdogPhase => {
                ResponseFrame::with_value(opcode, u16::from(self.watchdog.phase().to_raw()))
            }
        }
    }

    /// Elapsed time since the last ignition change, truncated to the wire's
    /// 16-bit payload exactly as deployed hosts expect.
    fn ignition_changed_last(&self, now: Instant, seconds: bool) -> u16 {
        let elapsed = self.ignition.elapsed_since_change(now);
        let value = if seconds {
            elapsed.as_secs()
        } else {
            elapsed.as_minutes()
        };
        value as u16
    }
}
