//! # Linear Actuator Control Library
//!
//! Commands a linear actuator through a PWM channel and reads its position back through an analog
//! feedback channel.
//!
//! Dependency order, leaves first:
//! - [`calib`] - the immutable calibration constants
//! - [`commander`] and [`sensor`] - pure conversions over the calibration
//! - [`actuator`] - the actuator entity owning the hardware channels
//! - [`sched`] - the periodic sensing and commanding activities

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod actuator;
pub mod calib;
pub mod commander;
pub mod params;
pub mod sched;
pub mod sensor;
pub mod telemetry;
