//! # Actuator Module
//!
//! The actuator entity owns the two hardware channels of a linear actuator, the PWM output which
//! commands its position and the analog input which reads its feedback potentiometer, together
//! with the commander and sensor which convert between stroke positions and raw channel values.
//!
//! The hardware is abstracted behind the [`PwmOutput`] and [`AnalogInput`] traits so the same
//! actuator can drive different boards, or the simulated plant in [`sim`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Adapters for `embedded-hal` PWM pins and one-shot ADCs.
pub mod hal;

/// [`PwmOutput`] implementation for the PCA9685 16 channel PWM driver board.
pub mod pca9685;

/// Simulated actuator, an ideal noiseless loopback from command to feedback.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use crate::{
    calib::Calibration,
    commander::{CommandedPosition, PositionCommander},
    sensor::{PositionSensor, SensedPosition, SensorFault, SensorWiring},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A PWM output channel with a fixed period.
pub trait PwmOutput {

    /// Set the duty of the channel.
    ///
    /// ## Arguments
    /// - `duty` - The duty value, between 0 and the calibration's `resolution_max`. Values outside
    ///   this range will be rejected.
    fn write_duty(&mut self, duty: u32) -> Result<(), HwError>;
}

/// An analog input channel.
pub trait AnalogInput {

    /// Acquire one raw sample.
    ///
    /// Healthy hardware returns a value between 0 and the calibration's `resolution_max`. The
    /// value may be stale or noisy but the read must not block indefinitely.
    fn read_raw(&mut self) -> Result<u32, HwError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A linear actuator driven by PWM with analog position feedback.
pub struct Actuator<P, A> {
    command: CommandChannel<P>,
    sense: SenseChannel<A>,
}

/// The commanding half of an actuator, owning its PWM output.
pub struct CommandChannel<P> {
    commander: PositionCommander,
    pwm: P,
}

/// The sensing half of an actuator, owning its analog input.
pub struct SenseChannel<A> {
    sensor: PositionSensor,
    adc: A,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by the hardware behind a channel.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HwError {
    #[error("An I2C error occured")]
    I2c,

    #[error("The ADC failed to convert a sample")]
    Adc,

    #[error("Duty value {duty} exceeds the channel resolution {max}")]
    DutyOutOfRange {
        duty: u32,
        max: u32
    },

    #[error("Simulated hardware fault")]
    Simulated,

    #[error("The hardware state lock was poisoned")]
    Poisoned,
}

/// Errors which can occur while commanding or sensing the actuator.
///
/// None of these are fatal, the periodic activities report them and carry on with their next
/// tick.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("Sensor fault: {0}")]
    SensorFault(#[from] SensorFault),

    #[error("Could not write the PWM duty: {0}")]
    HardwareWriteFailure(HwError),

    #[error("Could not read the feedback sample: {0}")]
    HardwareReadFailure(HwError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P, A> Actuator<P, A>
where
    P: PwmOutput,
    A: AnalogInput
{
    /// Create a new actuator owning the given hardware channels.
    pub fn new(calib: Arc<Calibration>, wiring: SensorWiring, pwm: P, adc: A) -> Self {
        Self {
            command: CommandChannel {
                commander: PositionCommander::new(calib.clone()),
                pwm
            },
            sense: SenseChannel {
                sensor: PositionSensor::new(calib, wiring),
                adc
            }
        }
    }

    /// Command the actuator to a stroke percentage, see [`CommandChannel::set_position`].
    pub fn set_position(&mut self, percentage: f64) -> Result<CommandedPosition, ActuatorError> {
        self.command.set_position(percentage)
    }

    /// Read the actuator's position, see [`SenseChannel::read_position`].
    pub fn read_position(&mut self) -> Result<SensedPosition, ActuatorError> {
        self.sense.read_position()
    }

    /// Split the actuator so each channel can be given to the activity that uses it.
    pub fn split(self) -> (CommandChannel<P>, SenseChannel<A>) {
        (self.command, self.sense)
    }
}

impl<P: PwmOutput> CommandChannel<P> {

    /// Command the actuator to a stroke percentage.
    ///
    /// Percentages outside `[0, 100]` are saturated to the nearest end of travel, this is flagged
    /// in the returned command but is not an error. An error is only returned if the duty could
    /// not be written to the hardware.
    pub fn set_position(&mut self, percentage: f64) -> Result<CommandedPosition, ActuatorError> {
        let cmd = self.commander.command(percentage);

        self.pwm
            .write_duty(cmd.duty_value)
            .map_err(ActuatorError::HardwareWriteFailure)?;

        Ok(cmd)
    }

    pub fn commander(&self) -> &PositionCommander {
        &self.commander
    }
}

impl<A: AnalogInput> SenseChannel<A> {

    /// Acquire a sample from the feedback channel and convert it to a position.
    pub fn read_position(&mut self) -> Result<SensedPosition, ActuatorError> {
        let raw = self.adc
            .read_raw()
            .map_err(ActuatorError::HardwareReadFailure)?;

        Ok(self.sensor.convert(raw)?)
    }

    pub fn sensor(&self) -> &PositionSensor {
        &self.sensor
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sim::SimPlant;

    fn actuator() -> (SimPlant, Actuator<sim::SimPwm, sim::SimAdc>) {
        let calib = Arc::new(Calibration::default());
        let plant = SimPlant::new(calib.clone(), SensorWiring::Inverted);
        let act = Actuator::new(calib, SensorWiring::Inverted, plant.pwm(), plant.adc());
        (plant, act)
    }

    #[test]
    fn test_set_position_writes_duty() {
        let (plant, mut act) = actuator();

        let cmd = act.set_position(0.0).unwrap();
        assert_eq!(cmd.duty_value, 3276);
        assert_eq!(plant.last_duty(), Some(3276));

        let cmd = act.set_position(250.0).unwrap();
        assert!(cmd.clamped);
        assert_eq!(cmd.duty_value, 6553);
        assert_eq!(plant.last_duty(), Some(6553));
    }

    #[test]
    fn test_loopback_round_trip() {
        let (_plant, mut act) = actuator();

        for p in [0.0, 25.0, 50.0, 75.0, 100.0, 33.3, 99.0, 1.0].iter() {
            act.set_position(*p).unwrap();
            let sensed = act.read_position().unwrap();
            assert!(
                (sensed.relative_percentage - p).abs() <= 1.0,
                "commanded {}%, sensed {}%", p, sensed.relative_percentage
            );
        }
    }

    #[test]
    fn test_hardware_faults() {
        let (plant, mut act) = actuator();

        plant.fail_next_write();
        assert_eq!(
            act.set_position(50.0),
            Err(ActuatorError::HardwareWriteFailure(HwError::Simulated))
        );
        // Only the one write fails
        assert!(act.set_position(50.0).is_ok());

        plant.fail_next_read();
        assert_eq!(
            act.read_position(),
            Err(ActuatorError::HardwareReadFailure(HwError::Simulated))
        );
        assert!(act.read_position().is_ok());

        plant.inject_raw(70000);
        assert_eq!(
            act.read_position(),
            Err(ActuatorError::SensorFault(SensorFault::OutOfRange { raw: 70000, max: 65535 }))
        );
    }

    #[test]
    fn test_split_channels_are_independent() {
        let (plant, act) = actuator();
        let (mut cmd, mut sense) = act.split();

        cmd.set_position(100.0).unwrap();
        let sensed = sense.read_position().unwrap();
        assert!((sensed.absolute_position_mm - 100.0).abs() <= 1.0);
        assert_eq!(plant.last_duty(), Some(6553));
    }
}
