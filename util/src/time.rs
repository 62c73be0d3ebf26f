//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a number of milliseconds from a parameter file into a `std` duration.
///
/// Negative, non-finite or unrepresentably large values give `None`.
pub fn millis_to_duration(millis: f64) -> Option<std::time::Duration> {
    seconds_to_duration(millis / 1000.0)
}

/// Convert a number of seconds into a `std` duration, with the same checks as
/// [`millis_to_duration`].
pub fn seconds_to_duration(seconds: f64) -> Option<std::time::Duration> {
    std::time::Duration::try_from_secs_f64(seconds).ok()
}
