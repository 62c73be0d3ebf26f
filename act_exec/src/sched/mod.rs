//! # Scheduler Module
//!
//! Runs periodic activities cooperatively on the calling thread. Each activity is ticked when its
//! period comes due, and the only place the scheduler suspends is the sleep until the next
//! activity is due. An activity's tick always runs to completion.
//!
//! Activities can be cancelled individually or all together through a [`CancelToken`].
//! Cancellation is observed when the scheduler wakes, so it never interrupts a tick.
//!
//! Ticks that fail are counted and the activity carries on at its next period, a failure in one
//! activity never stops another.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Sensing and commanding activities.
pub mod activities;

/// Real and simulated clocks.
pub mod clock;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::actuator::ActuatorError;
pub use activities::{CommandingActivity, SensingActivity};
pub use clock::{Clock, SimClock, SystemClock};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A unit of periodic work.
pub trait Activity {

    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Time between the starts of two ticks.
    fn period(&self) -> Duration;

    /// Perform one iteration of the activity.
    ///
    /// Errors have already been reported by the activity, they are returned so the scheduler can
    /// account for them.
    fn tick(&mut self) -> Result<(), ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Shared flag used to cancel activities.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

/// Cooperative scheduler for periodic activities.
pub struct Scheduler<C> {
    clock: C,
    entries: Vec<Entry>,
    cancel: CancelToken,
}

struct Entry {
    activity: Box<dyn Activity>,
    cancel: CancelToken,
    next_due: Duration,
    report: ActivityReport,
}

/// Tick counts of every activity since the scheduler was created.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct RunReport {
    pub activities: Vec<ActivityReport>,
}

/// Tick counts for one activity.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ActivityReport {
    pub name: String,

    /// Ticks performed, including failed ones.
    pub ticks: u64,

    /// Ticks which returned an error.
    pub faults: u64,

    /// Periods skipped because a tick started later than its next period.
    pub overruns: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchedError {
    #[error("The {0} activity must have a non-zero period")]
    ZeroPeriod(String),

    #[error("The commanding activity needs at least one position in its sequence")]
    EmptySequence,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation, takes effect at the next suspension point.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            entries: Vec::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Token which cancels every activity in the scheduler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Add an activity, first due immediately.
    ///
    /// Activities due at the same time are ticked in the order they were added. The returned
    /// token cancels just this activity.
    pub fn add(&mut self, activity: Box<dyn Activity>) -> Result<CancelToken, SchedError> {
        if activity.period() == Duration::from_secs(0) {
            return Err(SchedError::ZeroPeriod(activity.name().to_string()))
        }

        let cancel = CancelToken::new();

        debug!(
            "Adding {} activity with a period of {:?}",
            activity.name(),
            activity.period()
        );

        self.entries.push(Entry {
            report: ActivityReport {
                name: activity.name().to_string(),
                ..Default::default()
            },
            activity,
            cancel: cancel.clone(),
            next_due: self.clock.now(),
        });

        Ok(cancel)
    }

    /// Run until every activity has been cancelled.
    pub fn run(&mut self) -> RunReport {
        self.run_inner(None)
    }

    /// Run until `end` on the scheduler's clock, or until every activity has been cancelled.
    ///
    /// Ticks due before `end` are performed, the clock is left at `end`.
    pub fn run_until(&mut self, end: Duration) -> RunReport {
        self.run_inner(Some(end))
    }

    fn run_inner(&mut self, end: Option<Duration>) -> RunReport {
        info!("Scheduler started with {} activities", self.entries.len());

        loop {
            if self.cancel.is_cancelled() {
                info!("Scheduler cancelled");
                break
            }

            // Earliest due activity which is still live, min_by_key keeps the first of equals
            let idx = match self.entries
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.cancel.is_cancelled())
                .min_by_key(|(_, e)| e.next_due)
                .map(|(i, _)| i)
            {
                Some(i) => i,
                None => {
                    info!("All activities cancelled");
                    break
                }
            };

            let due = self.entries[idx].next_due;

            if let Some(end) = end {
                if due >= end {
                    self.clock.sleep_until(end);
                    break
                }
            }

            // Suspension point
            self.clock.sleep_until(due);

            if self.cancel.is_cancelled() {
                continue
            }

            let entry = &mut self.entries[idx];
            if entry.cancel.is_cancelled() {
                debug!("{} activity cancelled", entry.report.name);
                continue
            }

            trace!("Ticking {} at {:?}", entry.report.name, due);

            entry.report.ticks += 1;
            if entry.activity.tick().is_err() {
                entry.report.faults += 1;
            }

            // Keep a fixed cadence from the first tick, skipping periods that were missed
            let period = entry.activity.period();
            let now = self.clock.now();
            entry.next_due = due + period;
            while entry.next_due <= now {
                entry.next_due += period;
                entry.report.overruns += 1;
                trace!("{} activity overran, skipping a period", entry.report.name);
            }
        }

        let report = self.report();

        for a in report.activities.iter() {
            if a.faults > 0 {
                warn!("{} activity: {} of {} ticks failed", a.name, a.faults, a.ticks);
            }
        }

        report
    }

    /// Tick counts of every activity since the scheduler was created.
    pub fn report(&self) -> RunReport {
        RunReport {
            activities: self.entries.iter().map(|e| e.report.clone()).collect()
        }
    }
}
