#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Lock-free status mirror for transition logging.
//!
//! After each polling tick the loop publishes a snapshot of the observable
//! supervisor state into these atomics, so tasks can notice and log
//! transitions without re-entering the critical section.

use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use supervisor_core::watchdog::WatchdogPhase;

static POWERED: AtomicBool = AtomicBool::new(false);
static IGNITION: AtomicBool = AtomicBool::new(false);
static WATCHDOG_PHASE: AtomicU8 = AtomicU8::new(WatchdogPhase::Idle.to_raw());

/// Observable supervisor state captured at the end of a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    pub powered: bool,
    pub ignition_on: bool,
    pub phase: u8,
}

/// Publishes the latest snapshot, returning the previously stored one.
pub fn publish(snapshot: Snapshot) -> Snapshot {
    Snapshot {
        powered: POWERED.swap(snapshot.powered, Ordering::Relaxed),
        ignition_on: IGNITION.swap(snapshot.ignition_on, Ordering::Relaxed),
        phase: WATCHDOG_PHASE.swap(snapshot.phase, Ordering::Relaxed),
    }
}
