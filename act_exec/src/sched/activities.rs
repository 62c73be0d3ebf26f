//! The periodic activities driving an actuator

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use log::trace;

use super::{Activity, SchedError};
use crate::{
    actuator::{ActuatorError, AnalogInput, CommandChannel, PwmOutput, SenseChannel},
    telemetry::TelemetrySink,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const SENSING_NAME: &str = "sensing";

const COMMANDING_NAME: &str = "commanding";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Reads the actuator's position every period and publishes it.
pub struct SensingActivity<A, S> {
    channel: SenseChannel<A>,
    sink: S,
    period: Duration,
}

/// Walks a fixed sequence of positions, commanding one per period and wrapping back to the start
/// at the end.
pub struct CommandingActivity<P, S> {
    channel: CommandChannel<P>,
    sink: S,
    period: Duration,
    sequence: Vec<f64>,

    /// Index of the position commanded on the next tick.
    index: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<A, S> SensingActivity<A, S>
where
    A: AnalogInput,
    S: TelemetrySink
{
    pub fn new(channel: SenseChannel<A>, sink: S, period: Duration) -> Result<Self, SchedError> {
        if period == Duration::from_secs(0) {
            return Err(SchedError::ZeroPeriod(SENSING_NAME.to_string()))
        }

        Ok(Self { channel, sink, period })
    }
}

impl<A, S> Activity for SensingActivity<A, S>
where
    A: AnalogInput,
    S: TelemetrySink
{
    fn name(&self) -> &str {
        SENSING_NAME
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn tick(&mut self) -> Result<(), ActuatorError> {
        match self.channel.read_position() {
            Ok(position) => {
                self.sink.sensed(&position);
                Ok(())
            },
            Err(e) => {
                self.sink.fault(SENSING_NAME, &e);
                Err(e)
            }
        }
    }
}

impl<P, S> CommandingActivity<P, S>
where
    P: PwmOutput,
    S: TelemetrySink
{
    pub fn new(
        channel: CommandChannel<P>,
        sink: S,
        period: Duration,
        sequence: Vec<f64>
    ) -> Result<Self, SchedError> {
        if period == Duration::from_secs(0) {
            return Err(SchedError::ZeroPeriod(COMMANDING_NAME.to_string()))
        }

        if sequence.is_empty() {
            return Err(SchedError::EmptySequence)
        }

        Ok(Self {
            channel,
            sink,
            period,
            sequence,
            index: 0
        })
    }

    /// Index into the sequence of the next position to command.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The position the next tick will command.
    pub fn next_target(&self) -> f64 {
        self.sequence[self.index]
    }
}

impl<P, S> Activity for CommandingActivity<P, S>
where
    P: PwmOutput,
    S: TelemetrySink
{
    fn name(&self) -> &str {
        COMMANDING_NAME
    }

    fn period(&self) -> Duration {
        self.period
    }

    fn tick(&mut self) -> Result<(), ActuatorError> {
        let target = self.next_target();
        trace!("Commanding position {} of the sequence: {}%", self.index, target);

        // Advance even if the write fails, the next tick moves on to the next position
        self.index = (self.index + 1) % self.sequence.len();

        match self.channel.set_position(target) {
            Ok(cmd) => {
                self.sink.commanded(&cmd);
                Ok(())
            },
            Err(e) => {
                self.sink.fault(COMMANDING_NAME, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        actuator::{sim::{SimAdc, SimPlant, SimPwm}, Actuator},
        calib::Calibration,
        sched::test::RecordingSink,
        sensor::SensorWiring,
    };
    use std::sync::Arc;

    fn channels(plant: &SimPlant) -> (CommandChannel<SimPwm>, SenseChannel<SimAdc>) {
        let calib = Arc::new(Calibration::default());
        Actuator::new(calib, SensorWiring::Inverted, plant.pwm(), plant.adc()).split()
    }

    fn plant() -> SimPlant {
        SimPlant::new(Arc::new(Calibration::default()), SensorWiring::Inverted)
    }

    #[test]
    fn test_sequence_wraps() {
        let plant = plant();
        let (cmd, _) = channels(&plant);
        let sink = RecordingSink::default();

        let mut act = CommandingActivity::new(
            cmd,
            sink.clone(),
            Duration::from_secs(10),
            vec![0.0, 25.0, 50.0, 75.0, 100.0, 75.0, 50.0, 25.0]
        ).unwrap();

        for _ in 0..8 {
            act.tick().unwrap();
        }
        assert_eq!(act.index(), 0);
        assert_eq!(act.next_target(), 0.0);

        act.tick().unwrap();
        assert_eq!(
            sink.commanded_percentages(),
            vec![0.0, 25.0, 50.0, 75.0, 100.0, 75.0, 50.0, 25.0, 0.0]
        );
    }

    #[test]
    fn test_write_failure_advances() {
        let plant = plant();
        let (cmd, _) = channels(&plant);
        let sink = RecordingSink::default();

        let mut act = CommandingActivity::new(
            cmd, sink.clone(), Duration::from_secs(1), vec![10.0, 20.0]
        ).unwrap();

        plant.fail_next_write();
        assert!(act.tick().is_err());
        assert_eq!(act.index(), 1);
        assert_eq!(sink.fault_count(), 1);

        act.tick().unwrap();
        assert_eq!(sink.commanded_percentages(), vec![20.0]);
    }

    #[test]
    fn test_rejects_bad_config() {
        let plant = plant();
        let (cmd, sense) = channels(&plant);

        assert!(matches!(
            CommandingActivity::new(
                cmd, RecordingSink::default(), Duration::from_secs(1), Vec::new()
            ),
            Err(SchedError::EmptySequence)
        ));
        assert!(matches!(
            SensingActivity::new(sense, RecordingSink::default(), Duration::from_secs(0)),
            Err(SchedError::ZeroPeriod(ref name)) if name == "sensing"
        ));
    }

    #[test]
    fn test_sensing_reports_faults() {
        let plant = plant();
        let (_, sense) = channels(&plant);
        let sink = RecordingSink::default();

        let mut act = SensingActivity::new(sense, sink.clone(), Duration::from_millis(500))
            .unwrap();

        act.tick().unwrap();
        plant.inject_raw(100_000);
        assert!(matches!(act.tick(), Err(ActuatorError::SensorFault(_))));
        act.tick().unwrap();

        assert_eq!(sink.sensed_percentages().len(), 2);
        assert_eq!(sink.fault_count(), 1);
    }
}
