//! Interactive session driving the supervisor core with simulated I/O.
//!
//! The session owns a [`Supervisor`] wired to a simulated clock, ignition
//! line, and relay. Console commands either speak the wire protocol to the
//! supervisor or manipulate the simulation; newly recorded diagnostics are
//! appended to every reply.

use supervisor_core::clock::Instant;
use supervisor_core::config::SupervisorConfig;
use supervisor_core::console::{self, ConsoleCommand};
use supervisor_core::diag::EventId;
use supervisor_core::ignition::IgnitionSampler;
use supervisor_core::power::PowerRelay;
use supervisor_core::protocol::{FRAME_TERMINATOR, RESPONSE_LEN, opcode};
use supervisor_core::supervisor::Supervisor;

/// Simulated ignition line, driven by the `ign` command.
#[derive(Default)]
struct SimulatedLine {
    level: bool,
}

impl IgnitionSampler for SimulatedLine {
    fn sample(&mut self) -> bool {
        self.level
    }
}

/// Relay double that remembers the level last applied.
#[derive(Default)]
struct SimulatedRelay {
    on: bool,
}

impl PowerRelay for SimulatedRelay {
    fn set_power(&mut self, on: bool) {
        self.on = on;
    }
}

const HELP_LINES: &[&str] = &[
    "status              - show clock, ignition, watchdog, and power state",
    "ign <on|off>        - drive the raw ignition input level",
    "pat                 - send a watchdog pat transaction",
    "send <op> [p0 [p1]] - send a framed command and read the response",
    "raw <byte...>       - deliver raw bytes as one delivery event",
    "fill                - request a response frame without sending",
    "run <ms>            - advance the clock, running the polling loop",
    "help                - show this text",
    "exit                - leave the emulator",
];

/// Cadence of the simulated polling loop while the clock advances.
const LOOP_STEP_MS: u32 = 10;

pub struct Session {
    supervisor: Supervisor<SimulatedRelay, SimulatedLine>,
    clock_ms: u32,
    event_cursor: EventId,
}

impl Session {
    pub fn new(debug_mode: bool) -> Self {
        let config = if debug_mode {
            SupervisorConfig::new().with_debug()
        } else {
            SupervisorConfig::new()
        };

        Self {
            supervisor: Supervisor::new(
                config,
                SimulatedRelay::default(),
                SimulatedLine::default(),
            ),
            clock_ms: 0,
            event_cursor: 0,
        }
    }

    /// Executes one console line and returns the lines to print.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        let command = match console::parse(line) {
            Ok(command) => command,
            Err(err) => return vec![format!("ERR {err}")],
        };

        let mut output = match command {
            ConsoleCommand::Status => self.status(),
            ConsoleCommand::Ignition(on) => {
                self.supervisor.sampler_mut().level = on;
                vec![format!(
                    "ignition input {}",
                    if on { "on" } else { "off" }
                )]
            }
            ConsoleCommand::Pat => vec![self.transact(opcode::PAT_WATCHDOG, [0, 0])],
            ConsoleCommand::Send { opcode, params } => vec![self.transact(opcode, params)],
            ConsoleCommand::Raw(bytes) => {
                self.supervisor.handle_receive(bytes.as_slice());
                vec![format!("delivered {} byte event", bytes.len())]
            }
            ConsoleCommand::Fill => {
                let frame = self.supervisor.handle_fill(self.now());
                vec![Self::format_response(frame)]
            }
            ConsoleCommand::Run { millis } => self.run(millis),
            ConsoleCommand::Help => HELP_LINES.iter().map(|line| (*line).to_string()).collect(),
        };

        self.drain_events(&mut output);
        output
    }

    fn now(&self) -> Instant {
        Instant::from_millis(self.clock_ms)
    }

    /// Performs one canonical bus transaction: frame write, terminator write,
    /// then the response read.
    fn transact(&mut self, opcode: u8, params: [u8; 2]) -> String {
        self.supervisor
            .handle_receive(&[opcode, params[0], params[1]]);
        self.supervisor.handle_receive(&[FRAME_TERMINATOR]);
        let frame = self.supervisor.handle_fill(self.now());
        Self::format_response(frame)
    }

    fn format_response(frame: [u8; RESPONSE_LEN]) -> String {
        format!(
            "response: error={} opcode={} payload=[{:#04x}, {:#04x}]",
            frame[0], frame[1], frame[2], frame[3]
        )
    }

    fn run(&mut self, millis: u32) -> Vec<String> {
        let mut remaining = millis;
        while remaining > 0 {
            let step = remaining.min(LOOP_STEP_MS);
            self.clock_ms = self.clock_ms.wrapping_add(step);
            remaining -= step;
            self.supervisor.tick(self.now());
        }
        vec![format!("clock advanced to {} ms", self.clock_ms)]
    }

    fn status(&self) -> Vec<String> {
        let ignition = self.supervisor.ignition();
        let changed_secs = ignition.elapsed_since_change(self.now()).as_secs();
        vec![
            format!("time: {} ms", self.clock_ms),
            format!(
                "ignition: latched={} changed {changed_secs} s ago",
                if ignition.is_on() { "on" } else { "off" }
            ),
            format!("watchdog: phase={:?}", self.supervisor.watchdog_phase()),
            format!(
                "power: {} (relay {})",
                if self.supervisor.is_powered() { "on" } else { "off" },
                if self.supervisor.relay().on { "closed" } else { "open" }
            ),
            format!(
                "debounce: {}",
                if self.supervisor.is_debounce_enabled() { "enabled" } else { "disabled" }
            ),
            format!("test counter: {}", self.supervisor.test_counter()),
        ]
    }

    /// Appends diagnostics recorded since the last reply.
    fn drain_events(&mut self, output: &mut Vec<String>) {
        for record in self.supervisor.events().oldest_first() {
            if record.id.wrapping_sub(self.event_cursor) < u32::MAX / 2 {
                output.push(format!("event[{}] @{}ms {}", record.id, record.at.as_millis(), record.event));
            }
        }
        self.event_cursor = self.supervisor.events().next_id();
    }
}
