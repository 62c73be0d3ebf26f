//! # Actuator calibration
//!
//! The calibration holds the physical constants of one actuator installation. It is built once at
//! startup, checked, and then shared read-only (behind an `Arc`) by the commanding and sensing
//! sides of the actuator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::params::ActExecParams;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of milliseconds in one second, used to turn a PWM frequency into a period.
const MS_PER_S: f64 = 1000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Immutable calibration constants for a linear actuator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Calibration {
    /// Physical full-travel length of the actuator.
    ///
    /// Units: millimeters
    stroke_length_mm: f64,

    /// Full-scale voltage of the analog feedback channel.
    ///
    /// Units: volts
    reference_voltage: f64,

    /// Maximum raw value of both the ADC sample and the PWM duty.
    resolution_max: u32,

    /// Period of the PWM control signal.
    ///
    /// Units: milliseconds
    pwm_period_ms: f64,

    /// Pulse width mapped to 0% stroke.
    ///
    /// Units: milliseconds
    pulse_min_ms: f64,

    /// Pulse width mapped to 100% stroke.
    ///
    /// Units: milliseconds
    pulse_max_ms: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a set of calibration constants can be rejected.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CalibError {
    #[error("Calibration value `{0}` must be a finite number")]
    NotFinite(&'static str),

    #[error("Stroke length must be greater than zero, found {0} mm")]
    NonPositiveStroke(f64),

    #[error("Reference voltage must be greater than zero, found {0} V")]
    NonPositiveReferenceVoltage(f64),

    #[error("Resolution must be greater than zero")]
    ZeroResolution,

    #[error("PWM frequency must be greater than zero, found {0} Hz")]
    InvalidPwmFrequency(f64),

    #[error(
        "Pulse bounds must satisfy 0 <= min < max < period, found min = {min} ms, max = {max} ms, \
        period = {period} ms"
    )]
    InvalidPulseBounds {
        min: f64,
        max: f64,
        period: f64
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Calibration {

    /// Create a new calibration, checking every constant.
    pub fn new(
        stroke_length_mm: f64,
        reference_voltage: f64,
        resolution_max: u32,
        pwm_period_ms: f64,
        pulse_min_ms: f64,
        pulse_max_ms: f64,
    ) -> Result<Self, CalibError> {

        let finite_checks = [
            ("stroke_length_mm", stroke_length_mm),
            ("reference_voltage", reference_voltage),
            ("pwm_period_ms", pwm_period_ms),
            ("pulse_min_ms", pulse_min_ms),
            ("pulse_max_ms", pulse_max_ms),
        ];
        for (name, value) in finite_checks.iter() {
            if !value.is_finite() {
                return Err(CalibError::NotFinite(*name))
            }
        }

        if stroke_length_mm <= 0.0 {
            return Err(CalibError::NonPositiveStroke(stroke_length_mm))
        }

        if reference_voltage <= 0.0 {
            return Err(CalibError::NonPositiveReferenceVoltage(reference_voltage))
        }

        if resolution_max == 0 {
            return Err(CalibError::ZeroResolution)
        }

        if pulse_min_ms < 0.0 || pulse_min_ms >= pulse_max_ms || pulse_max_ms >= pwm_period_ms {
            return Err(CalibError::InvalidPulseBounds {
                min: pulse_min_ms,
                max: pulse_max_ms,
                period: pwm_period_ms
            })
        }

        Ok(Self {
            stroke_length_mm,
            reference_voltage,
            resolution_max,
            pwm_period_ms,
            pulse_min_ms,
            pulse_max_ms,
        })
    }

    /// Build the calibration described by the executable's parameters.
    ///
    /// The PWM period is derived from the configured frequency.
    pub fn from_params(params: &ActExecParams) -> Result<Self, CalibError> {
        if !params.pwm_frequency_hz.is_finite() || params.pwm_frequency_hz <= 0.0 {
            return Err(CalibError::InvalidPwmFrequency(params.pwm_frequency_hz))
        }

        Self::new(
            params.stroke_length_mm,
            params.reference_voltage,
            params.resolution_max,
            MS_PER_S / params.pwm_frequency_hz,
            params.pulse_min_ms,
            params.pulse_max_ms,
        )
    }

    pub fn stroke_length_mm(&self) -> f64 {
        self.stroke_length_mm
    }

    pub fn reference_voltage(&self) -> f64 {
        self.reference_voltage
    }

    pub fn resolution_max(&self) -> u32 {
        self.resolution_max
    }

    pub fn pwm_period_ms(&self) -> f64 {
        self.pwm_period_ms
    }

    pub fn pulse_min_ms(&self) -> f64 {
        self.pulse_min_ms
    }

    pub fn pulse_max_ms(&self) -> f64 {
        self.pulse_max_ms
    }

    /// Width of the usable pulse band.
    pub fn pulse_span_ms(&self) -> f64 {
        self.pulse_max_ms - self.pulse_min_ms
    }

    /// Voltage represented by one raw ADC count.
    pub fn volts_per_count(&self) -> f64 {
        self.reference_voltage / self.resolution_max as f64
    }
}

impl Default for Calibration {
    /// 100 mm stroke, 16 bit channels with a 3.3 V reference, 1-2 ms pulses at 50 Hz.
    fn default() -> Self {
        Self {
            stroke_length_mm: 100.0,
            reference_voltage: 3.3,
            resolution_max: 65535,
            pwm_period_ms: 20.0,
            pulse_min_ms: 1.0,
            pulse_max_ms: 2.0,
        }
    }
}
