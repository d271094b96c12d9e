//! Static supervisor configuration.
//!
//! One [`SupervisorConfig`] value is built at startup and passed into the
//! supervisor; nothing mutates it afterwards. Defaults match the deployed
//! in-vehicle tuning.

use crate::clock::Duration;

/// Slave address the supervisor answers on when the bus is addressable.
pub const DEFAULT_BUS_ADDRESS: u8 = 4;
/// Longest gap allowed between pats before a shutdown is scheduled.
pub const DEFAULT_PAT_TIMEOUT: Duration = Duration::from_secs(20);
/// Grace period between a missed pat and actually cutting power.
pub const DEFAULT_TURNOFF_DELAY: Duration = Duration::from_secs(30);
/// Cadence of the watchdog's scheduled checks.
pub const DEFAULT_WATCHDOG_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Time the supervised board gets to deliver its first pat after power-on.
pub const DEFAULT_BOOT_GRACE: Duration = Duration::from_secs(60);
/// Minimum time the board must stay unpowered between boots.
pub const DEFAULT_MINIMUM_OFF_INTERVAL: Duration = Duration::from_secs(5);
/// Cadence of ignition line sampling.
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(50);
/// Consecutive agreeing samples required to accept an ignition change.
pub const DEFAULT_DEBOUNCE_RETRIES: u8 = 3;

/// Process-wide configuration, set once at startup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SupervisorConfig {
    pub bus_address: u8,
    pub pat_timeout: Duration,
    pub turnoff_delay: Duration,
    pub watchdog_poll_interval: Duration,
    pub boot_grace: Duration,
    pub minimum_off_interval: Duration,
    pub debounce_interval: Duration,
    pub debounce_retries: u8,
    /// When false the watchdog never polls and the supervisor only ever
    /// powers the board on.
    pub watchdog_enabled: bool,
    /// Gates the diagnostic command group on the bus.
    pub debug_mode: bool,
}

impl SupervisorConfig {
    /// Configuration with the deployed defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bus_address: DEFAULT_BUS_ADDRESS,
            pat_timeout: DEFAULT_PAT_TIMEOUT,
            turnoff_delay: DEFAULT_TURNOFF_DELAY,
            watchdog_poll_interval: DEFAULT_WATCHDOG_POLL_INTERVAL,
            boot_grace: DEFAULT_BOOT_GRACE,
            minimum_off_interval: DEFAULT_MINIMUM_OFF_INTERVAL,
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
            debounce_retries: DEFAULT_DEBOUNCE_RETRIES,
            watchdog_enabled: true,
            debug_mode: false,
        }
    }

    /// Enables the diagnostic command group.
    #[must_use]
    pub const fn with_debug(mut self) -> Self {
        self.debug_mode = true;
        self
    }

    /// Disables the watchdog; shutdowns then never happen autonomously.
    #[must_use]
    pub const fn without_watchdog(mut self) -> Self {
        self.watchdog_enabled = false;
        self
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new()
    }
}
