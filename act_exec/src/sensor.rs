//! # Position sensor
//!
//! Converts raw feedback samples into a stroke position. The feedback potentiometer is normally
//! wired so that the measured voltage falls as the actuator extends (0 V at full extension), so
//! the voltage is inverted against the reference before it becomes a percentage. The wiring is
//! fixed by configuration and never detected at runtime.
//!
//! Percentages are not limited to `[0, 100]`: calibration drift or a sensor fault can produce a
//! reading slightly outside the travel and the caller decides what to do with it. Raw samples
//! beyond the resolution are a wiring or ADC fault and are rejected.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::calib::Calibration;
use crate::commander::{MAX_STROKE_PCT, MIN_STROKE_PCT};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Maps raw ADC samples onto stroke positions for one calibration.
#[derive(Clone, Debug)]
pub struct PositionSensor {
    calib: Arc<Calibration>,
    wiring: SensorWiring,
}

/// A single converted feedback sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SensedPosition {
    /// Sample as read from the ADC.
    pub raw_value: u32,

    /// Voltage at the ADC pin.
    ///
    /// Units: volts
    pub measured_voltage: f64,

    /// Voltage after applying the wiring convention.
    ///
    /// Units: volts
    pub inverted_voltage: f64,

    /// Position as a percentage of the stroke. Not limited to `[0, 100]`.
    pub relative_percentage: f64,

    /// Position from the fully retracted end.
    ///
    /// Units: millimeters
    pub absolute_position_mm: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Wiring of the feedback potentiometer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorWiring {
    /// 0 V at full extension, the reference voltage at full retraction.
    Inverted,

    /// 0 V at full retraction, the reference voltage at full extension.
    Direct,
}

/// A raw sample which cannot have come from a healthy ADC.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum SensorFault {
    #[error("Raw sample {raw} is outside the ADC range [0, {max}]")]
    OutOfRange {
        raw: u32,
        max: u32
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SensorWiring {
    fn default() -> Self {
        SensorWiring::Inverted
    }
}

impl PositionSensor {
    pub fn new(calib: Arc<Calibration>, wiring: SensorWiring) -> Self {
        Self { calib, wiring }
    }

    pub fn calib(&self) -> &Calibration {
        &self.calib
    }

    pub fn wiring(&self) -> SensorWiring {
        self.wiring
    }

    /// Convert a raw sample into a position.
    pub fn convert(&self, raw_value: u32) -> Result<SensedPosition, SensorFault> {
        let max = self.calib.resolution_max();
        if raw_value > max {
            return Err(SensorFault::OutOfRange { raw: raw_value, max })
        }

        let reference = self.calib.reference_voltage();
        let measured_voltage = raw_value as f64 / max as f64 * reference;

        let inverted_voltage = match self.wiring {
            SensorWiring::Inverted => reference - measured_voltage,
            SensorWiring::Direct => measured_voltage,
        };

        let relative_percentage = inverted_voltage / reference * MAX_STROKE_PCT;
        let absolute_position_mm =
            relative_percentage / MAX_STROKE_PCT * self.calib.stroke_length_mm();

        Ok(SensedPosition {
            raw_value,
            measured_voltage,
            inverted_voltage,
            relative_percentage,
            absolute_position_mm,
        })
    }

    /// Raw sample the sensor would report at the given stroke percentage.
    ///
    /// Used to model the feedback path of an ideal actuator.
    pub fn raw_at(&self, percentage: f64) -> u32 {
        let max = self.calib.resolution_max() as f64;
        let fraction = util::maths::clamp(&(percentage / MAX_STROKE_PCT), &0.0, &1.0);

        let raw = match self.wiring {
            SensorWiring::Inverted => (1.0 - fraction) * max,
            SensorWiring::Direct => fraction * max,
        };

        raw.round() as u32
    }
}

impl SensedPosition {
    /// `true` if the reading lies within the physical travel.
    pub fn is_within_stroke(&self) -> bool {
        self.relative_percentage >= MIN_STROKE_PCT && self.relative_percentage <= MAX_STROKE_PCT
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sensor() -> PositionSensor {
        PositionSensor::new(Arc::new(Calibration::default()), SensorWiring::Inverted)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_zero_raw_is_full_extension() {
        let s = sensor().convert(0).unwrap();

        assert_eq!(s.measured_voltage, 0.0);
        assert_close(s.inverted_voltage, 3.3);
        assert_close(s.relative_percentage, 100.0);
        assert_close(s.absolute_position_mm, 100.0);
        assert!(s.is_within_stroke());
    }

    #[test]
    fn test_full_raw_is_full_retraction() {
        let s = sensor().convert(65535).unwrap();

        assert_close(s.measured_voltage, 3.3);
        assert_close(s.inverted_voltage, 0.0);
        assert_close(s.relative_percentage, 0.0);
        assert_close(s.absolute_position_mm, 0.0);
    }

    #[test]
    fn test_midpoint() {
        let s = sensor().convert(65535 / 2).unwrap();
        assert!((s.relative_percentage - 50.0).abs() < 0.01);
        assert!((s.absolute_position_mm - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_direct_wiring() {
        let s = PositionSensor::new(Arc::new(Calibration::default()), SensorWiring::Direct);

        assert_close(s.convert(0).unwrap().relative_percentage, 0.0);
        assert_close(s.convert(65535).unwrap().relative_percentage, 100.0);
    }

    #[test]
    fn test_out_of_range_is_fault() {
        assert_eq!(
            sensor().convert(65536),
            Err(SensorFault::OutOfRange { raw: 65536, max: 65535 })
        );

        // A 12 bit ADC on a 16 bit read
        let calib = Calibration::new(50.0, 3.3, 4095, 20.0, 1.0, 2.0).unwrap();
        let s = PositionSensor::new(Arc::new(calib), SensorWiring::Inverted);
        assert!(s.convert(4095).is_ok());
        assert!(s.convert(4096).is_err());
    }

    #[test]
    fn test_monotonic_inversion() {
        let s = sensor();
        let mut prev = f64::INFINITY;
        for raw in (0..=65535).step_by(257) {
            let pct = s.convert(raw).unwrap().relative_percentage;
            assert!(pct <= prev);
            prev = pct;
        }
    }

    #[test]
    fn test_raw_at_inverts_convert() {
        let s = sensor();
        assert_eq!(s.raw_at(100.0), 0);
        assert_eq!(s.raw_at(0.0), 65535);

        for p in [0.0, 25.0, 50.0, 75.0, 100.0].iter() {
            let sensed = s.convert(s.raw_at(*p)).unwrap();
            assert!((sensed.relative_percentage - p).abs() < 0.01);
        }
    }
}
