//! # Telemetry
//!
//! Sinks receive one record per activity tick. The format of the records is for display only.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use crate::{
    actuator::ActuatorError,
    commander::CommandedPosition,
    sensor::SensedPosition,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Receiver for the records produced by the periodic activities.
pub trait TelemetrySink {

    /// A feedback sample was converted.
    fn sensed(&mut self, position: &SensedPosition);

    /// A position was commanded.
    fn commanded(&mut self, command: &CommandedPosition);

    /// A tick of `activity` failed and was skipped.
    fn fault(&mut self, activity: &str, error: &ActuatorError);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sink which writes records to the log.
#[derive(Default, Clone, Copy, Debug)]
pub struct LogSink;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TelemetrySink for LogSink {
    fn sensed(&mut self, position: &SensedPosition) {
        if !position.is_within_stroke() {
            warn!(
                "Position reading outside the stroke: {:.1}% (raw {})",
                position.relative_percentage,
                position.raw_value
            );
        }

        info!(
            "Raw ADC: {:5} | Voltage: {:.2} V | Relative: {:.1}% | Absolute: {:.1} mm",
            position.raw_value,
            position.measured_voltage,
            position.relative_percentage,
            position.absolute_position_mm
        );
    }

    fn commanded(&mut self, command: &CommandedPosition) {
        if command.clamped {
            warn!(
                "Demand of {}% is outside the stroke, limited to {}%",
                command.requested,
                command.percentage
            );
        }

        info!(
            "Set actuator to {}% stroke (pulse width: {:.2} ms)",
            command.percentage,
            command.pulse_width_ms
        );
    }

    fn fault(&mut self, activity: &str, error: &ActuatorError) {
        warn!("{} tick skipped: {}", activity, error);
    }
}
