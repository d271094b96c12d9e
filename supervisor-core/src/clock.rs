//! Wrapping millisecond time base shared by every supervisor component.
//!
//! The platform counter is a free-running u32 of milliseconds that overflows
//! roughly every 49.7 days. All elapsed-time math therefore goes through
//! [`Instant::elapsed_since`], which subtracts in the counter's native modulus
//! and stays correct across the wrap.

use core::fmt;
use core::ops::Add;

/// Span of time in whole milliseconds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct Duration(u32);

impl Duration {
    /// Zero-length span.
    pub const ZERO: Self = Self(0);

    /// Builds a duration from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    /// Builds a duration from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs * 1_000)
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Returns the duration in whole seconds, rounding down.
    #[must_use]
    pub const fn as_secs(self) -> u32 {
        self.0 / 1_000
    }

    /// Returns the duration in whole minutes, rounding down.
    #[must_use]
    pub const fn as_minutes(self) -> u32 {
        self.0 / 60_000
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Monotonic millisecond timestamp that wraps at the counter width.
///
/// `Instant` deliberately does not implement `Ord`: two wrapped timestamps
/// have no total order, only a wraparound-safe distance.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Instant(u32);

impl Instant {
    /// Timestamp at counter value zero.
    pub const ZERO: Self = Self(0);

    /// Builds a timestamp from a raw counter reading.
    #[must_use]
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Elapsed time since `earlier`, computed in the counter's modulus.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Self) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0))
    }

    /// Whether at least `interval` has passed since `earlier`.
    #[must_use]
    pub const fn has_elapsed(self, earlier: Self, interval: Duration) -> bool {
        self.0.wrapping_sub(earlier.0) >= interval.0
    }
}

impl Add<Duration> for Instant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}
