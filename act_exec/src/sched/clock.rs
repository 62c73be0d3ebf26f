//! Time sources for the scheduler

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    thread,
    time::{Duration, Instant},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A monotonic clock which the scheduler can sleep on.
pub trait Clock {

    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Suspend the caller until `now()` has reached `deadline`.
    ///
    /// Returns immediately if the deadline has already passed.
    fn sleep_until(&mut self, deadline: Duration);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Wall clock, sleeping the calling thread.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    epoch: Instant,
}

/// Simulated clock, time only moves when the scheduler sleeps.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimClock {
    now: Duration,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SystemClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep_until(&mut self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep_until(&mut self, deadline: Duration) {
        if deadline > self.now {
            self.now = deadline;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_clock() {
        let mut c = SimClock::new();
        assert_eq!(c.now(), Duration::from_secs(0));

        c.sleep_until(Duration::from_millis(500));
        assert_eq!(c.now(), Duration::from_millis(500));

        // Sleeping into the past does nothing
        c.sleep_until(Duration::from_millis(100));
        assert_eq!(c.now(), Duration::from_millis(500));

        c.advance(Duration::from_secs(1));
        assert_eq!(c.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_system_clock_sleeps() {
        let mut c = SystemClock::new();
        let deadline = c.now() + Duration::from_millis(5);
        c.sleep_until(deadline);
        assert!(c.now() >= deadline);
    }
}
