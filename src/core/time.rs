//! Time representation for subtitle playback.
//! All subtitle and clock times are milliseconds since the start of the subtitle file.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Time in milliseconds since the subtitle-file epoch
pub type Time = i64;

/// Time constants for conversions
pub mod constants {
    use super::Time;

    pub const MILLIS_PER_SECOND: Time = 1_000;
    pub const MILLIS_PER_MINUTE: Time = 60 * MILLIS_PER_SECOND;
    pub const MILLIS_PER_HOUR: Time = 60 * MILLIS_PER_MINUTE;
}

/// Convert seconds (f64) to milliseconds, rounding to the nearest millisecond
#[inline]
pub fn from_seconds(seconds: f64) -> Time {
    (seconds * constants::MILLIS_PER_SECOND as f64).round() as Time
}

/// Convert milliseconds to seconds (f64)
#[inline]
pub fn to_seconds(millis: Time) -> f64 {
    millis as f64 / constants::MILLIS_PER_SECOND as f64
}

/// Time zero constant
pub const ZERO: Time = 0;

/// Format a position for display next to a subtitle.
///
/// `mm:ss.mmm`, or `hh:mm:ss.mmm` when `total` is at least one hour.
/// Negative positions display as zero.
pub fn format_duration(millis: Time, total: Time) -> String {
    let millis = millis.max(0);
    let ms = millis % constants::MILLIS_PER_SECOND;
    let secs = (millis / constants::MILLIS_PER_SECOND) % 60;
    let mins = (millis / constants::MILLIS_PER_MINUTE) % 60;

    if total >= constants::MILLIS_PER_HOUR {
        let hours = millis / constants::MILLIS_PER_HOUR;
        return format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms);
    }

    format!("{:02}:{:02}.{:03}", mins, secs, ms)
}

/// Read a millisecond value that may arrive as a fractional number.
///
/// Use with `#[serde(deserialize_with = "...")]` on `Time` fields received
/// from the wire; the value is rounded to the nearest millisecond.
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = f64::deserialize(deserializer)?;
    if !millis.is_finite() {
        return Err(D::Error::custom(format!("invalid millisecond value {}", millis)));
    }
    Ok(millis.round() as Time)
}
