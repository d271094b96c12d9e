//! Structured diagnostics shared by firmware and host tooling.
//!
//! Noteworthy occurrences are written to a bounded ring with a wrapping event
//! id, so host tooling can read recent history instead of scraping a serial
//! console.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::clock::Instant;
use crate::protocol::ProtocolError;

/// Identifier assigned to recorded events, wrapping at the type width.
pub type EventId = u32;

/// Default number of records retained in memory.
pub const EVENT_LOG_CAPACITY: usize = 32;

/// Noteworthy supervisor occurrences.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SupervisorEvent {
    /// The debounce filter accepted an ignition change.
    IgnitionLatched { on: bool },
    /// A diagnostic command forced the ignition latch.
    IgnitionForced { on: bool },
    /// The board sent a watchdog pat.
    PatReceived,
    /// Pats stopped arriving; shutdown pending.
    PatTimeout,
    /// The boot grace period expired without a pat.
    BootTimeout,
    /// Board power was removed.
    ShutdownIssued,
    /// Board power was applied; boot grace running.
    BootStarted,
    /// A protocol error was reported to the host.
    ProtocolFault(ProtocolError),
}

impl fmt::Display for SupervisorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorEvent::IgnitionLatched { on } => {
                write!(f, "ignition-latched {}", if *on { "on" } else { "off" })
            }
            SupervisorEvent::IgnitionForced { on } => {
                write!(f, "ignition-forced {}", if *on { "on" } else { "off" })
            }
            SupervisorEvent::PatReceived => f.write_str("pat-received"),
            SupervisorEvent::PatTimeout => f.write_str("pat-timeout"),
            SupervisorEvent::BootTimeout => f.write_str("boot-timeout"),
            SupervisorEvent::ShutdownIssued => f.write_str("shutdown-issued"),
            SupervisorEvent::BootStarted => f.write_str("boot-started"),
            SupervisorEvent::ProtocolFault(error) => {
                write!(f, "protocol-fault code={}", error.to_raw())
            }
        }
    }
}

/// Timestamped record in the diagnostics ring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EventRecord {
    pub id: EventId,
    pub at: Instant,
    pub event: SupervisorEvent,
}

/// Bounded event history with wrapping ids.
pub struct EventLog<const CAPACITY: usize = EVENT_LOG_CAPACITY> {
    ring: HistoryBuf<EventRecord, CAPACITY>,
    next_id: EventId,
}

impl<const CAPACITY: usize> EventLog<CAPACITY> {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_id: 0,
        }
    }

    /// Appends a record, returning its id.
    pub fn record(&mut self, event: SupervisorEvent, at: Instant) -> EventId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.ring.write(EventRecord { id, at, event });
        id
    }

    /// Id the next record will receive.
    #[must_use]
    pub const fn next_id(&self) -> EventId {
        self.next_id
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<&EventRecord> {
        self.ring.recent()
    }

    /// Iterates records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, EventRecord> {
        self.ring.oldest_ordered()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<const CAPACITY: usize> Default for EventLog<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increment_per_record() {
        let mut log = EventLog::<8>::new();
        let first = log.record(SupervisorEvent::PatReceived, Instant::from_millis(100));
        let second = log.record(
            SupervisorEvent::IgnitionLatched { on: true },
            Instant::from_millis(150),
        );
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(log.latest().unwrap().id, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn ring_keeps_only_the_most_recent_records() {
        let mut log = EventLog::<4>::new();
        for step in 0..6 {
            log.record(SupervisorEvent::PatReceived, Instant::from_millis(step));
        }

        assert_eq!(log.len(), 4);
        let ids: heapless::Vec<EventId, 4> = log.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids.as_slice(), &[2, 3, 4, 5]);
    }

    #[test]
    fn display_is_compact_and_stable() {
        // Rendered via core::fmt without allocation; spot-check one variant
        // by formatting into a fixed buffer.
        use core::fmt::Write as _;

        struct Buffer {
            data: [u8; 32],
            len: usize,
        }

        impl core::fmt::Write for Buffer {
            fn write_str(&mut self, s: &str) -> core::fmt::Result {
                let bytes = s.as_bytes();
                if self.len + bytes.len() > self.data.len() {
                    return Err(core::fmt::Error);
                }
                self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
                self.len += bytes.len();
                Ok(())
            }
        }

        let mut buffer = Buffer {
            data: [0; 32],
            len: 0,
        };
        write!(buffer, "{}", SupervisorEvent::IgnitionLatched { on: true }).unwrap();
        assert_eq!(&buffer.data[..buffer.len], b"ignition-latched on");
    }
}
