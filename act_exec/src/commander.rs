//! # Position commander
//!
//! Converts a demanded stroke percentage into the PWM duty value which produces the matching
//! pulse width. Demands outside the physical travel are saturated, never rejected.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use log::trace;
use serde::Serialize;
use util::maths::{clamp, lin_map};

use crate::calib::Calibration;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Fully retracted, in percent of stroke.
pub const MIN_STROKE_PCT: f64 = 0.0;

/// Fully extended, in percent of stroke.
pub const MAX_STROKE_PCT: f64 = 100.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Maps stroke percentages onto PWM duty values for one calibration.
#[derive(Clone, Debug)]
pub struct PositionCommander {
    calib: Arc<Calibration>,
}

/// The result of commanding a position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CommandedPosition {
    /// Percentage that was asked for, before saturation.
    pub requested: f64,

    /// Percentage actually commanded, in `[0, 100]`.
    pub percentage: f64,

    /// Pulse width matching `percentage`.
    ///
    /// Units: milliseconds
    pub pulse_width_ms: f64,

    /// Duty value written to the PWM channel, in `[0, resolution_max]`.
    pub duty_value: u32,

    /// `true` if `requested` was outside the travel and had to be saturated.
    pub clamped: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PositionCommander {
    pub fn new(calib: Arc<Calibration>) -> Self {
        Self { calib }
    }

    pub fn calib(&self) -> &Calibration {
        &self.calib
    }

    /// Compute the command for a demanded stroke percentage.
    ///
    /// This is pure, calling it again with the same percentage gives the same duty value.
    pub fn command(&self, percentage: f64) -> CommandedPosition {
        let limited = clamp(&percentage, &MIN_STROKE_PCT, &MAX_STROKE_PCT);

        let pulse_width_ms = lin_map(
            (MIN_STROKE_PCT, MAX_STROKE_PCT),
            (self.calib.pulse_min_ms(), self.calib.pulse_max_ms()),
            limited
        );

        let duty_value = self.duty_from_pulse(pulse_width_ms);

        // NaN compares unequal so it is flagged too
        let clamped = limited != percentage;

        trace!(
            "Commanding {}% (requested {}%): {:.3} ms, duty {}",
            limited, percentage, pulse_width_ms, duty_value
        );

        CommandedPosition {
            requested: percentage,
            percentage: limited,
            pulse_width_ms,
            duty_value,
            clamped,
        }
    }

    /// Stroke percentage a duty value corresponds to.
    ///
    /// This is the inverse of [`PositionCommander::command`] up to the truncation of the duty.
    /// The result is not limited to the travel.
    pub fn percentage_from_duty(&self, duty_value: u32) -> f64 {
        let pulse_width_ms = duty_value as f64 / self.calib.resolution_max() as f64
            * self.calib.pwm_period_ms();

        lin_map(
            (self.calib.pulse_min_ms(), self.calib.pulse_max_ms()),
            (MIN_STROKE_PCT, MAX_STROKE_PCT),
            pulse_width_ms
        )
    }

    /// Scale a pulse width to a duty value, truncating toward zero.
    fn duty_from_pulse(&self, pulse_width_ms: f64) -> u32 {
        let max = self.calib.resolution_max();
        let duty = (pulse_width_ms / self.calib.pwm_period_ms()) * max as f64;

        // Pulse is inside the period, so only rounding can push this past max
        (duty as u32).min(max)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn commander() -> PositionCommander {
        PositionCommander::new(Arc::new(Calibration::default()))
    }

    #[test]
    fn test_reference_endpoints() {
        let c = commander();

        let zero = c.command(0.0);
        assert_eq!(zero.pulse_width_ms, 1.0);
        assert_eq!(zero.duty_value, 3276);
        assert!(!zero.clamped);

        let full = c.command(100.0);
        assert_eq!(full.pulse_width_ms, 2.0);
        assert_eq!(full.duty_value, 6553);
        assert!(!full.clamped);

        let half = c.command(50.0);
        assert_eq!(half.pulse_width_ms, 1.5);
        assert_eq!(half.duty_value, 4915);
    }

    #[test]
    fn test_out_of_range_saturates() {
        let c = commander();

        for (p, limit) in [(-10.0, 0.0), (-1e9, 0.0), (100.5, 100.0), (1e9, 100.0)].iter() {
            let cmd = c.command(*p);
            let expected = c.command(*limit);

            assert!(cmd.clamped);
            assert_eq!(cmd.requested, *p);
            assert_eq!(cmd.percentage, expected.percentage);
            assert_eq!(cmd.pulse_width_ms, expected.pulse_width_ms);
            assert_eq!(cmd.duty_value, expected.duty_value);
        }

        let nan = c.command(f64::NAN);
        assert!(nan.clamped);
        assert_eq!(nan.duty_value, c.command(0.0).duty_value);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let c = commander();
        let max = c.calib().resolution_max();

        let mut prev = 0;
        for i in 0..=1000 {
            let cmd = c.command(i as f64 / 10.0);
            assert!(cmd.duty_value >= prev);
            assert!(cmd.duty_value <= max);
            prev = cmd.duty_value;
        }
    }

    #[test]
    fn test_idempotent() {
        let c = commander();
        let first = c.command(37.5);
        for _ in 0..10 {
            assert_eq!(c.command(37.5), first);
        }
    }

    #[test]
    fn test_percentage_from_duty() {
        let c = commander();
        for p in [0.0, 12.5, 25.0, 60.0, 100.0].iter() {
            let back = c.percentage_from_duty(c.command(*p).duty_value);
            assert!((back - p).abs() < 0.1, "{} came back as {}", p, back);
        }
    }
}
