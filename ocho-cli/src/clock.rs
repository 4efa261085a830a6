//! Run loop pacing.
use std::{
    thread,
    time::{Duration, Instant},
};

/// Interpreter cycle rate in cycles per second. Zero means unthrottled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl Hz {
    /// Duration of one cycle at this rate.
    pub fn cycle_time(self) -> Duration {
        if self.0 == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(1_000_000_000 / self.0)
        }
    }
}

/// Timer that paces the step loop at a fixed cycle rate.
///
/// The machine itself has no notion of wall time, so the driver spaces out
/// its `step` calls instead.
pub struct Clock {
    started: Instant,
    cycle_time: Duration,
}

impl Clock {
    pub fn new(rate: Hz) -> Self {
        Clock {
            started: Instant::now(),
            cycle_time: rate.cycle_time(),
        }
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.started = Instant::now();
    }

    /// Block the current thread until the next clock cycle.
    pub fn wait(&mut self) {
        if self.cycle_time.is_zero() {
            return;
        }

        while self.started.elapsed() < self.cycle_time {
            // Sleep does not have enough resolution, and spinning burns a
            // core. Yielding in a loop sits in between.
            thread::yield_now();
        }

        // Reset back to zero rather than trying to catch up. A process
        // that was stopped for a while should continue at its usual
        // speed, not burst.
        self.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cycle_time() {
        assert_eq!(Hz(0).cycle_time(), Duration::ZERO);
        assert_eq!(Hz(500).cycle_time(), Duration::from_millis(2));
    }

    #[test]
    fn test_unthrottled_clock_does_not_block() {
        let mut clock = Clock::new(Hz(0));
        let start = Instant::now();
        for _ in 0..1000 {
            clock.wait();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
