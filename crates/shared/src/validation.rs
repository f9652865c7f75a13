//! Field validators shared by request DTOs.
//!
//! Each validator returns a `validator::ValidationError` carrying a readable
//! message so handlers can surface it unchanged.

use chrono::{DateTime, Duration, Utc};
use validator::ValidationError;

/// Oldest accepted `captured_at` for an uploaded GPS point.
const MAX_CAPTURE_AGE_DAYS: i64 = 7;

/// Clock skew tolerated for `captured_at` values ahead of server time.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

fn range_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Latitude in degrees, -90 to 90 inclusive.
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(range_error(
            "latitude_range",
            "Latitude must be between -90 and 90",
        ))
    }
}

/// Longitude in degrees, -180 to 180 inclusive.
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(range_error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Horizontal accuracy radius in meters.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy.is_finite() && accuracy >= 0.0 {
        Ok(())
    } else {
        Err(range_error(
            "accuracy_range",
            "Accuracy must be non-negative",
        ))
    }
}

/// Heading in degrees clockwise from north.
pub fn validate_heading(heading: f64) -> Result<(), ValidationError> {
    if (0.0..=360.0).contains(&heading) {
        Ok(())
    } else {
        Err(range_error(
            "heading_range",
            "Heading must be between 0 and 360",
        ))
    }
}

/// Ground speed in meters per second.
pub fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed.is_finite() && speed >= 0.0 {
        Ok(())
    } else {
        Err(range_error("speed_range", "Speed must be non-negative"))
    }
}

/// Battery charge percentage.
pub fn validate_battery_level(level: i32) -> Result<(), ValidationError> {
    if (0..=100).contains(&level) {
        Ok(())
    } else {
        Err(range_error(
            "battery_range",
            "Battery level must be between 0 and 100",
        ))
    }
}

/// Capture time of a GPS sample.
///
/// Rejects values more than 5 minutes ahead of the server clock and values
/// older than 7 days.
pub fn validate_captured_at(captured_at: &DateTime<Utc>) -> Result<(), ValidationError> {
    check_captured_at(*captured_at, Utc::now())
}

fn check_captured_at(captured_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if captured_at > now + Duration::seconds(MAX_FUTURE_SKEW_SECS) {
        return Err(range_error(
            "timestamp_future",
            "Timestamp cannot be in the future",
        ));
    }

    if captured_at < now - Duration::days(MAX_CAPTURE_AGE_DAYS) {
        return Err(range_error(
            "timestamp_old",
            "Timestamp cannot be older than 7 days",
        ));
    }

    Ok(())
}

/// Wall clock time of day in `HH:MM` 24-hour form.
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    match chrono::NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(_) if value.len() == 5 => Ok(()),
        _ => Err(range_error(
            "time_of_day_format",
            "Time must be in HH:MM format",
        )),
    }
}
