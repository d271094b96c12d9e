//! Ignition line debouncing and the latched ignition state.
//!
//! The raw ignition signal rises and falls slowly and may bounce; the filter
//! requires a run of agreeing samples before it accepts a change, bounding
//! latch latency to `retries × poll interval`.

use crate::clock::{Duration, Instant};

/// Samples the raw ignition input level.
pub trait IgnitionSampler {
    /// Reads the line; `true` means ignition voltage present.
    fn sample(&mut self) -> bool;
}

/// Latched ignition state plus the time of the last accepted change.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IgnitionState {
    latched: bool,
    changed_at: Instant,
}

impl IgnitionState {
    /// Initial state: ignition off, change timestamp at counter zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latched: false,
            changed_at: Instant::ZERO,
        }
    }

    /// Current latched level.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.latched
    }

    /// Time of the last accepted change.
    #[must_use]
    pub const fn changed_at(&self) -> Instant {
        self.changed_at
    }

    /// Elapsed time since the latch last changed.
    #[must_use]
    pub fn elapsed_since_change(&self, now: Instant) -> Duration {
        now.elapsed_since(self.changed_at)
    }

    /// Latches `on`, stamping the change time only on an actual flip.
    ///
    /// Returns `true` when the latch changed. Both the debounce filter and the
    /// diagnostic force-state command go through here, so the invariant that
    /// `changed_at` moves only with the latch holds everywhere.
    pub fn latch(&mut self, on: bool, now: Instant) -> bool {
        if self.latched == on {
            return false;
        }
        self.latched = on;
        self.changed_at = now;
        true
    }
}

impl Default for IgnitionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run-length filter that rejects transient glitches on the ignition line.
pub struct DebounceFilter {
    last_sample: bool,
    run_length: u8,
    next_check_at: Instant,
    interval: Duration,
    retries: u8,
}

impl DebounceFilter {
    /// Creates a filter that samples every `interval` and accepts a change
    /// after `retries` consecutive agreeing samples.
    #[must_use]
    pub const fn new(interval: Duration, retries: u8) -> Self {
        Self {
            last_sample: false,
            run_length: 0,
            next_check_at: Instant::ZERO,
            interval,
            retries,
        }
    }

    /// Runs one debounce check if the poll interval has elapsed.
    ///
    /// Samples the line at most once per interval. The check schedule advances
    /// by exactly one interval per executed check, so missed loop iterations
    /// do not stretch the cadence. Returns `true` when the latch flipped.
    pub fn poll<S: IgnitionSampler>(
        &mut self,
        sampler: &mut S,
        state: &mut IgnitionState,
        now: Instant,
    ) -> bool {
        if !now.has_elapsed(self.next_check_at, self.interval) {
            return false;
        }

        let sample = sampler.sample();
        let mut flipped = false;

        if sample == self.last_sample {
            self.run_length = self.run_length.saturating_add(1);
            if self.run_length >= self.retries {
                self.run_length = 0;
                flipped = state.latch(sample, now);
            }
        } else {
            // Flapping; no partial credit.
            self.run_length = 0;
        }

        self.last_sample = sample;
        self.next_check_at = self.next_check_at + self.interval;
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        level: bool,
        samples: u32,
    }

    impl Line {
        fn high() -> Self {
            Self {
                level: true,
                samples: 0,
            }
        }
    }

    impl IgnitionSampler for Line {
        fn sample(&mut self) -> bool {
            self.samples += 1;
            self.level
        }
    }

    const INTERVAL: Duration = Duration::from_millis(50);
    const RETRIES: u8 = 3;

    fn filter() -> DebounceFilter {
        DebounceFilter::new(INTERVAL, RETRIES)
    }

    #[test]
    fn latch_flips_once_after_the_confirming_run() {
        let mut filter = filter();
        let mut state = IgnitionState::new();
        let mut line = Line::high();

        // Seed the previous-sample memory, then confirm RETRIES times.
        let mut now = Instant::from_millis(INTERVAL.as_millis());
        filter.poll(&mut line, &mut state, now);
        for check in 1..=u32::from(RETRIES) {
            now = Instant::from_millis((check + 1) * INTERVAL.as_millis());
            let flipped = filter.poll(&mut line, &mut state, now);
            if check == u32::from(RETRIES) {
                assert!(flipped, "latch must flip on the final confirming check");
            } else {
                assert!(!flipped);
            }
        }

        assert!(state.is_on());
        assert_eq!(state.changed_at(), now);

        // Further agreeing samples never re-stamp the change time.
        let later = now + Duration::from_millis(10 * INTERVAL.as_millis());
        assert!(!filter.poll(&mut line, &mut state, later));
        assert_eq!(state.changed_at(), now);
    }

    #[test]
    fn a_single_differing_sample_resets_the_run() {
        let mut filter = filter();
        let mut state = IgnitionState::new();
        let mut line = Line::high();

        filter.poll(&mut line, &mut state, Instant::from_millis(50));
        filter.poll(&mut line, &mut state, Instant::from_millis(100));

        // One glitch low wipes the accumulated run.
        line.level = false;
        filter.poll(&mut line, &mut state, Instant::from_millis(150));
        line.level = true;

        // The run must start over: a reseed plus two agreeing checks are not
        // enough to reach the threshold again.
        filter.poll(&mut line, &mut state, Instant::from_millis(200));
        filter.poll(&mut line, &mut state, Instant::from_millis(250));
        assert!(!filter.poll(&mut line, &mut state, Instant::from_millis(300)));
        assert!(!state.is_on());
        assert!(filter.poll(&mut line, &mut state, Instant::from_millis(350)));
        assert!(state.is_on());
    }

    #[test]
    fn sampling_is_gated_by_the_poll_interval() {
        let mut filter = filter();
        let mut state = IgnitionState::new();
        let mut line = Line::high();

        // Nothing is due before the first interval boundary.
        for millis in 0..INTERVAL.as_millis() {
            assert!(!filter.poll(&mut line, &mut state, Instant::from_millis(millis)));
        }
        assert_eq!(line.samples, 0);

        // Repeated calls inside one interval sample the line exactly once.
        filter.poll(&mut line, &mut state, Instant::from_millis(50));
        filter.poll(&mut line, &mut state, Instant::from_millis(60));
        filter.poll(&mut line, &mut state, Instant::from_millis(99));
        assert_eq!(line.samples, 1);
    }

    #[test]
    fn schedule_advances_one_interval_per_check() {
        let mut filter = filter();
        let mut state = IgnitionState::new();
        let mut line = Line::high();

        // A late first check must not push the whole schedule late: the next
        // check is due one interval after the previous *scheduled* time.
        filter.poll(&mut line, &mut state, Instant::from_millis(70));
        assert!(!filter.poll(&mut line, &mut state, Instant::from_millis(99)));
        filter.poll(&mut line, &mut state, Instant::from_millis(100));
        filter.poll(&mut line, &mut state, Instant::from_millis(150));
        assert!(filter.poll(&mut line, &mut state, Instant::from_millis(200)));
        assert!(state.is_on());
    }

    #[test]
    fn latch_invariant_only_stamps_on_flip() {
        let mut state = IgnitionState::new();
        assert!(state.latch(true, Instant::from_millis(10)));
        assert!(!state.latch(true, Instant::from_millis(20)));
        assert_eq!(state.changed_at(), Instant::from_millis(10));
        assert!(state.latch(false, Instant::from_millis(30)));
        assert_eq!(state.changed_at(), Instant::from_millis(30));
    }
}
