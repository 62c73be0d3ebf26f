//! # Actuator Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use util::time::{millis_to_duration, seconds_to_duration};

use crate::sensor::SensorWiring;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the actuator executable, loaded from `act_exec.toml`.
///
/// Every field has a default so a parameter file only needs to list what differs from the
/// reference installation.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ActExecParams {

    /// Frequency of the PWM control signal.
    ///
    /// Units: hertz
    pub pwm_frequency_hz: f64,

    /// Physical full-travel length of the actuator.
    ///
    /// Units: millimeters
    pub stroke_length_mm: f64,

    /// Maximum raw value of the PWM duty and the ADC sample.
    pub resolution_max: u32,

    /// Full-scale voltage of the analog feedback channel.
    ///
    /// Units: volts
    pub reference_voltage: f64,

    /// Pulse width commanding 0% stroke.
    ///
    /// Units: milliseconds
    pub pulse_min_ms: f64,

    /// Pulse width commanding 100% stroke.
    ///
    /// Units: milliseconds
    pub pulse_max_ms: f64,

    /// How the feedback potentiometer is wired.
    pub sensor_wiring: SensorWiring,

    /// Period of the sensing activity.
    ///
    /// Units: milliseconds
    pub sensing_interval_ms: f64,

    /// Period of the commanding activity.
    ///
    /// Units: milliseconds
    pub commanding_interval_ms: f64,

    /// Stroke percentages the commanding activity cycles through.
    pub position_sequence: Vec<f64>,

    /// If set the executable stops after this long, otherwise it runs until killed.
    ///
    /// Units: seconds
    pub run_duration_s: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The position sequence must contain at least one position")]
    EmptySequence,

    #[error("The {0} interval must be a positive number of milliseconds, found {1}")]
    InvalidInterval(&'static str, f64),

    #[error("The run duration must be a positive number of seconds, found {0}")]
    InvalidRunDuration(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ActExecParams {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: 50.0,
            stroke_length_mm: 100.0,
            resolution_max: 65535,
            reference_voltage: 3.3,
            pulse_min_ms: 1.0,
            pulse_max_ms: 2.0,
            sensor_wiring: SensorWiring::Inverted,
            sensing_interval_ms: 500.0,
            commanding_interval_ms: 10_000.0,
            position_sequence: vec![0.0, 25.0, 50.0, 75.0, 100.0, 75.0, 50.0, 25.0],
            run_duration_s: None,
        }
    }
}

impl ActExecParams {
    /// Check the scheduling parameters.
    ///
    /// The calibration constants are checked when the
    /// [`Calibration`](crate::calib::Calibration) is built from these parameters.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.position_sequence.is_empty() {
            return Err(ParamsError::EmptySequence)
        }

        for (name, interval) in [
            ("sensing", self.sensing_interval_ms),
            ("commanding", self.commanding_interval_ms),
        ].iter() {
            if *interval <= 0.0 || millis_to_duration(*interval).is_none() {
                return Err(ParamsError::InvalidInterval(*name, *interval))
            }
        }

        if let Some(d) = self.run_duration_s {
            if d <= 0.0 || seconds_to_duration(d).is_none() {
                return Err(ParamsError::InvalidRunDuration(d))
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let params: ActExecParams = util::params::parse(
            "stroke_length_mm = 150.0\nposition_sequence = [10.0, 90.0]"
        ).unwrap();

        assert_eq!(params.stroke_length_mm, 150.0);
        assert_eq!(params.position_sequence, vec![10.0, 90.0]);
        assert_eq!(params.pwm_frequency_hz, 50.0);
        assert_eq!(params.sensing_interval_ms, 500.0);
        assert_eq!(params.sensor_wiring, SensorWiring::Inverted);
        assert_eq!(params.run_duration_s, None);
        assert_eq!(params.are_valid(), Ok(()));
    }

    #[test]
    fn test_wiring_from_file() {
        let params: ActExecParams = util::params::parse("sensor_wiring = \"direct\"").unwrap();
        assert_eq!(params.sensor_wiring, SensorWiring::Direct);
    }

    #[test]
    fn test_invalid() {
        let mut params = ActExecParams::default();
        params.position_sequence.clear();
        assert_eq!(params.are_valid(), Err(ParamsError::EmptySequence));

        let mut params = ActExecParams::default();
        params.sensing_interval_ms = 0.0;
        assert_eq!(params.are_valid(), Err(ParamsError::InvalidInterval("sensing", 0.0)));

        let mut params = ActExecParams::default();
        params.run_duration_s = Some(-1.0);
        assert_eq!(params.are_valid(), Err(ParamsError::InvalidRunDuration(-1.0)));
    }

    #[test]
    fn test_huge_values_rejected() {
        let params: ActExecParams = util::params::parse("commanding_interval_ms = 1e30").unwrap();
        assert_eq!(
            params.are_valid(),
            Err(ParamsError::InvalidInterval("commanding", 1e30))
        );

        let params: ActExecParams = util::params::parse("run_duration_s = 1e30").unwrap();
        assert_eq!(params.are_valid(), Err(ParamsError::InvalidRunDuration(1e30)));
    }
}
