//! Full supervision cycle: pats stop, power drops, ignition brings it back.

use supervisor_core::clock::Instant;
use supervisor_core::config::SupervisorConfig;
use supervisor_core::ignition::IgnitionSampler;
use supervisor_core::power::PowerRelay;
use supervisor_core::protocol::{FRAME_TERMINATOR, opcode};
use supervisor_core::supervisor::Supervisor;
use supervisor_core::watchdog::WatchdogPhase;

struct Relay {
    on: bool,
}

impl PowerRelay for Relay {
    fn set_power(&mut self, on: bool) {
        self.on = on;
    }
}

struct Line {
    level: bool,
}

impl IgnitionSampler for Line {
    fn sample(&mut self) -> bool {
        self.level
    }
}

type Harness = Supervisor<Relay, Line>;

fn harness() -> Harness {
    Supervisor::new(
        SupervisorConfig::new(),
        Relay { on: false },
        Line { level: false },
    )
}

fn pat(supervisor: &mut Harness, at_ms: u32) {
    supervisor.handle_receive(&[opcode::PAT_WATCHDOG, 0, 0]);
    supervisor.handle_receive(&[FRAME_TERMINATOR]);
    let response = supervisor.handle_fill(Instant::from_millis(at_ms));
    assert_eq!(response[0], 0, "pat must succeed");
}

/// Runs the polling loop every 10 ms over `[from_ms, to_ms]`.
fn run(supervisor: &mut Harness, from_ms: u32, to_ms: u32) {
    let mut at = from_ms;
    while at <= to_ms {
        supervisor.tick(Instant::from_millis(at));
        at += 10;
    }
}

#[test]
fn missed_pats_power_the_board_off_after_both_delays() {
    let mut supervisor = harness();
    supervisor.sampler_mut().level = true;

    // Ignition latches and the board boots once the initial off interval
    // clears; the board then proves itself with a pat.
    run(&mut supervisor, 0, 6_000);
    assert!(supervisor.is_powered());
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::Booting);
    pat(&mut supervisor, 7_000);
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::Watching);

    // Silence. The pat timeout expires at 27 s, caught by the next check on
    // the 5 s grid; the board stays powered through the 30 s turn-off grace.
    run(&mut supervisor, 6_010, 29_000);
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::Watching);
    run(&mut supervisor, 29_010, 31_000);
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::ShutdownPending);
    assert!(supervisor.is_powered());

    // Still powered right up to the turn-off deadline.
    run(&mut supervisor, 31_010, 59_000);
    assert!(supervisor.is_powered());

    // Past the grace the relay opens.
    run(&mut supervisor, 59_010, 61_000);
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::Idle);
    assert!(!supervisor.is_powered());
    assert!(!supervisor.relay().on);
}

#[test]
fn ignition_still_on_reboots_after_the_minimum_off_interval() {
    let mut supervisor = harness();
    supervisor.sampler_mut().level = true;

    run(&mut supervisor, 0, 6_000);
    pat(&mut supervisor, 7_000);

    // Let the watchdog cycle all the way to a shutdown.
    run(&mut supervisor, 6_010, 60_000);
    assert!(!supervisor.is_powered());

    // Ignition never dropped, so after the 5 s minimum off interval the
    // sequencer boots the board again and restarts the boot grace.
    run(&mut supervisor, 60_010, 66_000);
    assert!(supervisor.is_powered());
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::Booting);
}

#[test]
fn pat_during_the_turnoff_grace_cancels_the_shutdown() {
    let mut supervisor = harness();
    supervisor.sampler_mut().level = true;

    run(&mut supervisor, 0, 6_000);
    pat(&mut supervisor, 7_000);

    run(&mut supervisor, 6_010, 31_000);
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::ShutdownPending);

    // The board comes back before the turn-off deadline.
    pat(&mut supervisor, 32_000);
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::Watching);

    // A full turn-off interval later the board is still powered.
    run(&mut supervisor, 32_010, 60_000);
    assert!(supervisor.is_powered());
}

#[test]
fn ignition_off_keeps_the_board_down_after_a_watchdog_shutdown() {
    let mut supervisor = harness();
    supervisor.sampler_mut().level = true;

    run(&mut supervisor, 0, 6_000);
    pat(&mut supervisor, 7_000);

    // Ignition drops while the watchdog is counting down.
    supervisor.sampler_mut().level = false;
    run(&mut supervisor, 6_010, 60_000);
    assert!(!supervisor.is_powered());

    // With the ignition latch off, no amount of waiting reboots the board.
    run(&mut supervisor, 60_010, 120_000);
    assert!(!supervisor.is_powered());
    assert_eq!(supervisor.watchdog_phase(), WatchdogPhase::Idle);
}

#[test]
fn disabled_watchdog_never_cuts_power() {
    let mut supervisor = Supervisor::new(
        SupervisorConfig::new().without_watchdog(),
        Relay { on: false },
        Line { level: true },
    );

    run(&mut supervisor, 0, 6_000);
    assert!(supervisor.is_powered());

    // No pats ever arrive, yet the board stays up.
    run(&mut supervisor, 6_010, 300_000);
    assert!(supervisor.is_powered());
}
