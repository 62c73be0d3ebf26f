//! [`PwmOutput`] implementation for one channel of the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use pwm_pca9685::{Channel, Pca9685};
use embedded_hal::blocking::i2c::{Write, WriteRead};

use super::{HwError, PwmOutput};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Highest count of the PCA9685's 12 bit PWM counter.
const MAX_PWM: u16 = 4095;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One channel of a PCA9685 board used as the actuator's PWM output.
///
/// The board's prescaler must already be set so its period matches the calibration's PWM period.
pub struct Pca9685Pwm<I2C> {
    driver: Pca9685<I2C>,
    channel: Channel,
    resolution_max: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> Pca9685Pwm<I2C>
where 
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    /// Use `channel` of an initialised board as a PWM output with duty values up to
    /// `resolution_max`.
    pub fn new(driver: Pca9685<I2C>, channel: Channel, resolution_max: u32) -> Self {
        Self {
            driver,
            channel,
            resolution_max
        }
    }

    /// Give the board back.
    pub fn release(self) -> Pca9685<I2C> {
        self.driver
    }
}

impl<I2C, E> PwmOutput for Pca9685Pwm<I2C>
where 
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    fn write_duty(&mut self, duty: u32) -> Result<(), HwError> {

        // If the duty is out of range return an error
        if duty > self.resolution_max {
            return Err(HwError::DutyOutOfRange { duty, max: self.resolution_max })
        }

        // The pulse starts at the beginning of the period and ends at the scaled count
        let off = (duty as u64 * MAX_PWM as u64 / self.resolution_max as u64) as u16;

        match self.driver.set_channel_on_off(self.channel, 0, off) {
            Ok(_) => Ok(()),
            Err(pwm_pca9685::Error::I2C(_)) => Err(HwError::I2c),
            Err(pwm_pca9685::Error::InvalidInputData) => Err(HwError::DutyOutOfRange {
                duty,
                max: self.resolution_max
            })
        }
    }
}
