//! Pat-driven watchdog state machine.
//!
//! The supervised board proves liveness by sending pats over the bus. The
//! machine is polled, not event-driven: timeout checks only execute when the
//! scheduled check time has elapsed, and the schedule then advances by exactly
//! one run interval so missed loop iterations never grant extra time.

use crate::clock::{Duration, Instant};
use crate::config::SupervisorConfig;

/// Watchdog lifecycle phase.
///
/// The raw codes are part of the wire protocol (diagnostic phase read) and
/// must not be renumbered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WatchdogPhase {
    /// Pats are arriving; the board is assumed healthy.
    Watching,
    /// Pats stopped; power will be cut once the turn-off delay passes.
    ShutdownPending,
    /// Power was just applied; waiting for the board's first pat.
    Booting,
    /// Not supervising; nothing happens until a pat or a boot.
    Idle,
}

impl WatchdogPhase {
    const WATCHING_CODE: u8 = 0;
    const SHUTDOWN_PENDING_CODE: u8 = 1;
    const BOOTING_CODE: u8 = 2;
    const IDLE_CODE: u8 = 3;

    /// Encodes the phase into its wire discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        match self {
            WatchdogPhase::Watching => Self::WATCHING_CODE,
            WatchdogPhase::ShutdownPending => Self::SHUTDOWN_PENDING_CODE,
            WatchdogPhase::Booting => Self::BOOTING_CODE,
            WatchdogPhase::Idle => Self::IDLE_CODE,
        }
    }

    /// Decodes a wire discriminant back into a phase.
    #[must_use]
    pub const fn from_raw(code: u8) -> Option<Self> {
        match code {
            Self::WATCHING_CODE => Some(WatchdogPhase::Watching),
            Self::SHUTDOWN_PENDING_CODE => Some(WatchdogPhase::ShutdownPending),
            Self::BOOTING_CODE => Some(WatchdogPhase::Booting),
            Self::IDLE_CODE => Some(WatchdogPhase::Idle),
            _ => None,
        }
    }
}

/// Outcome of a scheduled watchdog check.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WatchdogEvent {
    /// Pats stopped arriving; a shutdown is now pending.
    PatTimeout,
    /// The pending shutdown deadline passed; power must be cut.
    ShutdownDue,
    /// The boot grace period expired without a pat; power must be cut.
    BootTimeout,
}

impl WatchdogEvent {
    /// Whether the caller must deassert board power in response.
    #[must_use]
    pub const fn cuts_power(self) -> bool {
        matches!(
            self,
            WatchdogEvent::ShutdownDue | WatchdogEvent::BootTimeout
        )
    }
}

/// The watchdog timer proper.
pub struct Watchdog {
    phase: WatchdogPhase,
    enabled: bool,
    last_pat_at: Instant,
    phase_entered_at: Instant,
    next_poll_at: Instant,
    pat_timeout: Duration,
    turnoff_delay: Duration,
    boot_grace: Duration,
    poll_interval: Duration,
}

impl Watchdog {
    /// Builds the watchdog from configuration; starts idle.
    #[must_use]
    pub const fn new(config: &SupervisorConfig) -> Self {
        Self {
            phase: WatchdogPhase::Idle,
            enabled: config.watchdog_enabled,
            last_pat_at: Instant::ZERO,
            phase_entered_at: Instant::ZERO,
            next_poll_at: Instant::ZERO,
            pat_timeout: config.pat_timeout,
            turnoff_delay: config.turnoff_delay,
            boot_grace: config.boot_grace,
            poll_interval: config.watchdog_poll_interval,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WatchdogPhase {
        self.phase
    }

    /// Whether the machine polls at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records a pat from the board.
    ///
    /// Valid in any phase: it arms an idle watchdog, confirms a boot, and
    /// cancels a pending shutdown.
    pub fn pat(&mut self, now: Instant) {
        self.last_pat_at = now;
        self.phase = WatchdogPhase::Watching;
    }

    /// Marks a boot as initiated and starts the boot grace timer.
    pub fn begin_boot(&mut self, now: Instant) {
        self.phase = WatchdogPhase::Booting;
        self.phase_entered_at = now;
    }

    /// Runs one scheduled check if the run interval has elapsed.
    ///
    /// At most one transition happens per executed check. The returned event
    /// tells the caller which deadline fired; `None` means nothing changed
    /// (including when the machine is disabled or the check is not yet due).
    pub fn poll(&mut self, now: Instant) -> Option<WatchdogEvent> {
        if !self.enabled {
            return None;
        }
        if !now.has_elapsed(self.next_poll_at, self.poll_interval) {
            return None;
        }

        let event = match self.phase {
            WatchdogPhase::Watching => {
                if now.has_elapsed(self.last_pat_at, self.pat_timeout) {
                    self.phase = WatchdogPhase::ShutdownPending;
                    self.phase_entered_at = now;
                    Some(WatchdogEvent::PatTimeout)
                } else {
                    None
                }
            }
            WatchdogPhase::ShutdownPending => {
                if now.has_elapsed(self.phase_entered_at, self.turnoff_delay) {
                    self.phase = WatchdogPhase::Idle;
                    Some(WatchdogEvent::ShutdownDue)
                } else {
                    None
                }
            }
            WatchdogPhase::Booting => {
                if now.has_elapsed(self.phase_entered_at, self.boot_grace) {
                    self.phase = WatchdogPhase::Idle;
                    Some(WatchdogEvent::BootTimeout)
                } else {
                    None
                }
            }
            WatchdogPhase::Idle => None,
        };

        // Advance the schedule by one interval, never reset it to `now`.
        self.next_poll_at = self.next_poll_at + self.poll_interval;
        event
    }
}
