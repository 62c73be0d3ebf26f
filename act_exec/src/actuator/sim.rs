//! Simulated actuator hardware
//!
//! The plant moves instantly to whatever position the last duty commanded and its feedback
//! channel reports the raw sample an ideal sensor with the configured wiring would produce there.
//! Faults can be injected to exercise the error paths of the activities.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use log::trace;

use super::{AnalogInput, HwError, PwmOutput};
use crate::{
    calib::Calibration,
    commander::{PositionCommander, MIN_STROKE_PCT},
    sensor::{PositionSensor, SensorWiring},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated actuator, shared between its PWM and ADC halves.
#[derive(Clone)]
pub struct SimPlant {
    shared: Arc<Shared>,
}

/// PWM half of a [`SimPlant`].
pub struct SimPwm {
    shared: Arc<Shared>,
}

/// ADC half of a [`SimPlant`].
pub struct SimAdc {
    shared: Arc<Shared>,
}

struct Shared {
    commander: PositionCommander,
    sensor: PositionSensor,
    state: Mutex<PlantState>,
}

#[derive(Default)]
struct PlantState {
    /// Last duty written, `None` until the first command.
    duty: Option<u32>,

    fail_next_write: bool,
    fail_next_read: bool,

    /// Raw sample to report on the next read instead of the modelled one.
    injected_raw: Option<u32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimPlant {
    /// Create a new plant, starting fully retracted.
    pub fn new(calib: Arc<Calibration>, wiring: SensorWiring) -> Self {
        Self {
            shared: Arc::new(Shared {
                commander: PositionCommander::new(calib.clone()),
                sensor: PositionSensor::new(calib, wiring),
                state: Mutex::new(PlantState::default()),
            })
        }
    }

    /// Get the PWM output driving this plant.
    pub fn pwm(&self) -> SimPwm {
        SimPwm { shared: self.shared.clone() }
    }

    /// Get the analog input reading this plant's feedback.
    pub fn adc(&self) -> SimAdc {
        SimAdc { shared: self.shared.clone() }
    }

    /// The last duty written to the plant.
    pub fn last_duty(&self) -> Option<u32> {
        self.shared.state.lock().ok().and_then(|s| s.duty)
    }

    /// Current position of the plant in percent of stroke.
    pub fn position_pct(&self) -> Option<f64> {
        self.shared.state.lock().ok().map(|s| self.shared.position_pct(&s))
    }

    /// Make the next duty write fail.
    pub fn fail_next_write(&self) {
        if let Ok(mut s) = self.shared.state.lock() {
            s.fail_next_write = true;
        }
    }

    /// Make the next sample read fail.
    pub fn fail_next_read(&self) {
        if let Ok(mut s) = self.shared.state.lock() {
            s.fail_next_read = true;
        }
    }

    /// Report `raw` on the next sample read, regardless of the range of the ADC.
    pub fn inject_raw(&self, raw: u32) {
        if let Ok(mut s) = self.shared.state.lock() {
            s.injected_raw = Some(raw);
        }
    }
}

impl Shared {
    fn position_pct(&self, state: &PlantState) -> f64 {
        match state.duty {
            Some(d) => self.commander.percentage_from_duty(d),
            None => MIN_STROKE_PCT
        }
    }
}

impl PwmOutput for SimPwm {
    fn write_duty(&mut self, duty: u32) -> Result<(), HwError> {
        let mut state = self.shared.state.lock().map_err(|_| HwError::Poisoned)?;

        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(HwError::Simulated)
        }

        let max = self.shared.commander.calib().resolution_max();
        if duty > max {
            return Err(HwError::DutyOutOfRange { duty, max })
        }

        trace!("Sim plant duty set to {}", duty);
        state.duty = Some(duty);

        Ok(())
    }
}

impl AnalogInput for SimAdc {
    fn read_raw(&mut self) -> Result<u32, HwError> {
        let mut state = self.shared.state.lock().map_err(|_| HwError::Poisoned)?;

        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(HwError::Simulated)
        }

        if let Some(raw) = state.injected_raw.take() {
            return Ok(raw)
        }

        Ok(self.shared.sensor.raw_at(self.shared.position_pct(&state)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn plant() -> SimPlant {
        SimPlant::new(Arc::new(Calibration::default()), SensorWiring::Inverted)
    }

    #[test]
    fn test_starts_retracted() {
        let p = plant();
        assert_eq!(p.last_duty(), None);
        assert_eq!(p.position_pct(), Some(0.0));

        // Retracted reads as full scale with inverted wiring
        assert_eq!(p.adc().read_raw(), Ok(65535));
    }

    #[test]
    fn test_follows_duty() {
        let p = plant();
        let mut pwm = p.pwm();
        let mut adc = p.adc();

        pwm.write_duty(6553).unwrap();
        let pct = p.position_pct().unwrap();
        assert!((pct - 100.0).abs() < 0.1);
        assert!(adc.read_raw().unwrap() < 100);

        assert_eq!(
            pwm.write_duty(70000),
            Err(HwError::DutyOutOfRange { duty: 70000, max: 65535 })
        );
        assert_eq!(p.last_duty(), Some(6553));
    }

    #[test]
    fn test_injected_raw_is_one_shot() {
        let p = plant();
        let mut adc = p.adc();

        p.inject_raw(123);
        assert_eq!(adc.read_raw(), Ok(123));
        assert_eq!(adc.read_raw(), Ok(65535));
    }
}
