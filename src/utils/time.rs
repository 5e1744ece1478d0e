//! Time-window utilities shared by the window scanner and the interval stitcher.

use chrono::{Duration, NaiveDateTime};

/// Microseconds in one hour
pub const MICROS_PER_HOUR: f64 = 3_600_000_000.0;

/// Nanoseconds in one hour
pub const NANOS_PER_HOUR: f64 = 3_600_000_000_000.0;

/// Convert a (finite) number of hours into a duration with nanosecond precision
///
/// Durations too long for nanoseconds (about 292 years) fall back to microseconds,
/// and values beyond that range saturate.
#[must_use]
pub fn hours_to_duration(hours: f64) -> Duration {
    let nanos = hours * NANOS_PER_HOUR;
    if nanos.abs() < i64::MAX as f64 {
        return Duration::nanoseconds(nanos.round() as i64);
    }
    // `as` saturates on overflow and maps NaN to zero
    Duration::microseconds((hours * MICROS_PER_HOUR).round() as i64)
}

/// Length of a duration in fractional hours
#[must_use]
pub fn duration_hours(duration: Duration) -> f64 {
    if let Some(nanos) = duration.num_nanoseconds() {
        return nanos as f64 / NANOS_PER_HOUR;
    }
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / MICROS_PER_HOUR,
        None => duration.num_seconds() as f64 / 3600.0,
    }
}

/// Signed gap in hours from `end` to a later `start` (negative when they overlap)
#[must_use]
pub fn gap_hours(end: NaiveDateTime, start: NaiveDateTime) -> f64 {
    duration_hours(start - end)
}

/// Closed window `[t - half_width, t + half_width]` around a timestamp
///
/// A bound that falls outside the representable range is `None`, meaning unbounded
/// on that side.
#[must_use]
pub fn window_bounds(
    t: NaiveDateTime,
    half_width: Duration,
) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    (
        t.checked_sub_signed(half_width),
        t.checked_add_signed(half_width),
    )
}
