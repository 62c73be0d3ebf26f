//! [`PwmOutput`] and [`AnalogInput`] adapters for `embedded-hal` peripherals

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt::Debug, marker::PhantomData};

use embedded_hal::{
    adc::{Channel, OneShot},
    PwmPin,
};
use log::warn;

use super::{AnalogInput, HwError, PwmOutput};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A 16 bit `embedded-hal` PWM pin.
///
/// Duty values are rescaled from the calibration's resolution to the pin's own maximum duty, so
/// the pin's timer can be configured with any top value.
pub struct HalPwm<P> {
    pin: P,
    resolution_max: u32,
}

/// A pin sampled by an `embedded-hal` one-shot ADC.
pub struct HalAdc<ADC, OS, PIN> {
    adc: OS,
    pin: PIN,
    _adc: PhantomData<ADC>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P> HalPwm<P>
where
    P: PwmPin<Duty = u16>
{
    /// Wrap and enable a PWM pin.
    ///
    /// The pin's period must already be set to the calibration's PWM period.
    pub fn new(mut pin: P, resolution_max: u32) -> Self {
        pin.enable();
        Self { pin, resolution_max }
    }

    /// Disable the pin and give it back.
    pub fn release(mut self) -> P {
        self.pin.disable();
        self.pin
    }
}

impl<P> PwmOutput for HalPwm<P>
where
    P: PwmPin<Duty = u16>
{
    fn write_duty(&mut self, duty: u32) -> Result<(), HwError> {
        if duty > self.resolution_max {
            return Err(HwError::DutyOutOfRange { duty, max: self.resolution_max })
        }

        let pin_max = self.pin.get_max_duty() as u64;
        let scaled = duty as u64 * pin_max / self.resolution_max as u64;

        // scaled <= pin_max so it fits the pin's duty type
        self.pin.set_duty(scaled as u16);

        Ok(())
    }
}

impl<ADC, OS, PIN> HalAdc<ADC, OS, PIN>
where
    OS: OneShot<ADC, u16, PIN>,
    PIN: Channel<ADC>
{
    pub fn new(adc: OS, pin: PIN) -> Self {
        Self { adc, pin, _adc: PhantomData }
    }

    pub fn release(self) -> (OS, PIN) {
        (self.adc, self.pin)
    }
}

impl<ADC, OS, PIN> AnalogInput for HalAdc<ADC, OS, PIN>
where
    OS: OneShot<ADC, u16, PIN>,
    OS::Error: Debug,
    PIN: Channel<ADC>
{
    fn read_raw(&mut self) -> Result<u32, HwError> {
        match nb::block!(self.adc.read(&mut self.pin)) {
            Ok(raw) => Ok(raw as u32),
            Err(e) => {
                warn!("ADC conversion failed: {:?}", e);
                Err(HwError::Adc)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;

    struct FakePin {
        enabled: bool,
        duty: u16,
        max: u16,
    }

    impl PwmPin for FakePin {
        type Duty = u16;

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn get_duty(&self) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            self.max
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    struct FakeAdc {
        results: VecDeque<nb::Result<u16, ()>>,
    }

    struct FakeAdcPin;

    impl Channel<FakeAdc> for FakeAdcPin {
        type ID = u8;

        fn channel() -> u8 {
            0
        }
    }

    impl OneShot<FakeAdc, u16, FakeAdcPin> for FakeAdc {
        type Error = ();

        fn read(&mut self, _pin: &mut FakeAdcPin) -> nb::Result<u16, ()> {
            self.results.pop_front().unwrap_or(Err(nb::Error::Other(())))
        }
    }

    #[test]
    fn test_pwm_same_resolution() {
        let pin = FakePin { enabled: false, duty: 0, max: 65535 };
        let mut pwm = HalPwm::new(pin, 65535);

        pwm.write_duty(3276).unwrap();
        let pin = pwm.release();
        assert_eq!(pin.duty, 3276);
        assert!(!pin.enabled);
    }

    #[test]
    fn test_pwm_rescales() {
        let pin = FakePin { enabled: false, duty: 0, max: 1000 };
        let mut pwm = HalPwm::new(pin, 65535);
        assert!(pwm.pin.enabled);

        // 1 ms of a 20 ms period is 5% of the timer
        pwm.write_duty(3276).unwrap();
        assert_eq!(pwm.pin.get_duty(), 49);

        pwm.write_duty(65535).unwrap();
        assert_eq!(pwm.pin.get_duty(), 1000);

        assert_eq!(
            pwm.write_duty(65536),
            Err(HwError::DutyOutOfRange { duty: 65536, max: 65535 })
        );
        assert_eq!(pwm.pin.get_duty(), 1000);
    }

    #[test]
    fn test_adc_blocks_until_ready() {
        let adc = FakeAdc {
            results: vec![Err(nb::Error::WouldBlock), Err(nb::Error::WouldBlock), Ok(40000)]
                .into_iter()
                .collect(),
        };
        let mut input: HalAdc<FakeAdc, _, _> = HalAdc::new(adc, FakeAdcPin);

        assert_eq!(input.read_raw(), Ok(40000));

        // Queue exhausted, the fake reports a conversion error
        assert_eq!(input.read_raw(), Err(HwError::Adc));
    }
}
