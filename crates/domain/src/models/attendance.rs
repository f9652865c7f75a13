//! Attendance (clock in/out) domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// What opened or closed an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceSource {
    Manual,
    Geofence,
    System,
}

impl AttendanceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Geofence => "geofence",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "geofence" => Some(Self::Geofence),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// A clock-in/clock-out interval. Open while `clock_out_at` is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clock_in_at: DateTime<Utc>,
    pub clock_out_at: Option<DateTime<Utc>>,
    pub clock_in_source: AttendanceSource,
    pub clock_out_source: Option<AttendanceSource>,
    pub geofence_id: Option<Uuid>,
    pub clock_in_latitude: Option<f64>,
    pub clock_in_longitude: Option<f64>,
    pub clock_out_latitude: Option<f64>,
    pub clock_out_longitude: Option<f64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.clock_out_at.is_none()
    }

    /// Worked seconds, counting an open record up to `now`.
    pub fn worked_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = self.clock_out_at.unwrap_or(now);
        (end - self.clock_in_at).num_seconds().max(0)
    }
}

/// Values for opening a record.
#[derive(Debug, Clone)]
pub struct NewClockIn {
    pub user_id: Uuid,
    pub at: DateTime<Utc>,
    pub source: AttendanceSource,
    pub geofence_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
}

/// Values for closing the open record.
#[derive(Debug, Clone)]
pub struct ClockOut {
    pub at: DateTime<Utc>,
    pub source: AttendanceSource,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
}

/// Body for manual clock-in and clock-out. All fields optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClockRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: Option<f64>,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceStatusResponse {
    pub clocked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceRecord>,
    /// Seconds since clock-in for the open record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<i64>,
}

impl AttendanceStatusResponse {
    /// `record` is the user's open record; a closed one reports clocked out.
    pub fn new(record: Option<AttendanceRecord>, now: DateTime<Utc>) -> Self {
        let record = record.filter(AttendanceRecord::is_open);
        let elapsed_seconds = record.as_ref().map(|r| r.worked_seconds(now));
        Self {
            clocked_in: record.is_some(),
            record,
            elapsed_seconds,
        }
    }
}

/// Query parameters for record listings and summaries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRangeQuery {
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecordsResponse {
    pub records: Vec<AttendanceRecord>,
}

/// Worked time on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub worked_seconds: i64,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSummaryResponse {
    pub user_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_seconds: i64,
    pub days: Vec<DailyAttendance>,
}

/// Splits records on UTC midnight and sums worked seconds per day.
///
/// Only the part of each record inside `[from, to)` counts. Open records run
/// until `now`.
pub fn summarize_by_day(
    records: &[AttendanceRecord],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<DailyAttendance> {
    let mut days: BTreeMap<NaiveDate, (i64, usize)> = BTreeMap::new();

    for record in records {
        let start = record.clock_in_at.max(from);
        let end = record.clock_out_at.unwrap_or(now).min(to);
        if end <= start {
            continue;
        }

        let mut cursor = start;
        while cursor < end {
            let day = cursor.date_naive();
            let next_midnight = match day.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
                Some(midnight) => midnight.and_utc(),
                None => end,
            };
            let segment_end = next_midnight.min(end);

            let entry = days.entry(day).or_insert((0, 0));
            entry.0 += (segment_end - cursor).num_seconds();
            if cursor == start {
                entry.1 += 1;
            }
            cursor = segment_end;
        }
    }

    days.into_iter()
        .map(|(date, (worked_seconds, records))| DailyAttendance {
            date,
            worked_seconds,
            records,
        })
        .collect()
}

/// Default summary window: the last 7 days up to now.
pub fn default_range(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::days(7), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, h, m, 0).unwrap()
    }

    fn record(clock_in: DateTime<Utc>, clock_out: Option<DateTime<Utc>>) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            clock_in_at: clock_in,
            clock_out_at: clock_out,
            clock_in_source: AttendanceSource::Manual,
            clock_out_source: clock_out.map(|_| AttendanceSource::Manual),
            geofence_id: None,
            clock_in_latitude: None,
            clock_in_longitude: None,
            clock_out_latitude: None,
            clock_out_longitude: None,
            note: None,
            created_at: clock_in,
            updated_at: clock_in,
        }
    }

    #[test]
    fn test_source_strings() {
        assert_eq!(AttendanceSource::Geofence.as_str(), "geofence");
        assert_eq!(AttendanceSource::parse("system"), Some(AttendanceSource::System));
        assert_eq!(AttendanceSource::parse("auto"), None);
    }

    #[test]
    fn test_worked_seconds_open_record() {
        let r = record(at(1, 9, 0), None);
        assert!(r.is_open());
        assert_eq!(r.worked_seconds(at(1, 10, 30)), 5400);
    }

    #[test]
    fn test_summary_single_day() {
        let records = [
            record(at(1, 8, 0), Some(at(1, 12, 0))),
            record(at(1, 13, 0), Some(at(1, 17, 0))),
        ];
        let days = summarize_by_day(&records, at(1, 0, 0), at(2, 0, 0), at(3, 0, 0));
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].worked_seconds, 8 * 3600);
        assert_eq!(days[0].records, 2);
    }

    #[test]
    fn test_summary_splits_across_midnight() {
        let records = [record(at(1, 22, 0), Some(at(2, 2, 0)))];
        let days = summarize_by_day(&records, at(1, 0, 0), at(3, 0, 0), at(5, 0, 0));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, at(1, 0, 0).date_naive());
        assert_eq!(days[0].worked_seconds, 2 * 3600);
        assert_eq!(days[0].records, 1);
        assert_eq!(days[1].worked_seconds, 2 * 3600);
        assert_eq!(days[1].records, 0);
    }

    #[test]
    fn test_summary_clips_to_range_and_now() {
        let records = [
            record(at(1, 6, 0), Some(at(1, 10, 0))),
            record(at(2, 9, 0), None),
        ];
        let days = summarize_by_day(&records, at(1, 8, 0), at(3, 0, 0), at(2, 11, 0));
        assert_eq!(days[0].worked_seconds, 2 * 3600);
        assert_eq!(days[1].worked_seconds, 2 * 3600);
    }

    #[test]
    fn test_summary_ignores_records_outside_range() {
        let records = [record(at(1, 8, 0), Some(at(1, 9, 0)))];
        assert!(summarize_by_day(&records, at(2, 0, 0), at(3, 0, 0), at(4, 0, 0)).is_empty());
    }

    #[test]
    fn test_status_response() {
        let status = AttendanceStatusResponse::new(Some(record(at(1, 9, 0), None)), at(1, 9, 15));
        assert!(status.clocked_in);
        assert_eq!(status.elapsed_seconds, Some(900));

        let idle = AttendanceStatusResponse::new(None, at(1, 9, 15));
        let json = serde_json::to_value(&idle).unwrap();
        assert_eq!(json["clocked_in"], false);
        assert!(json.get("record").is_none());
    }

    #[test]
    fn test_status_ignores_closed_record() {
        let closed = record(at(1, 9, 0), Some(at(1, 12, 0)));
        let status = AttendanceStatusResponse::new(Some(closed), at(1, 13, 0));
        assert!(!status.clocked_in);
        assert!(status.record.is_none());
        assert_eq!(status.elapsed_seconds, None);
    }

    #[test]
    fn test_clock_request_validation() {
        let req: ClockRequest = serde_json::from_str(r#"{"latitude": 120.0}"#).unwrap();
        assert!(req.validate().is_err());
        assert!(ClockRequest::default().validate().is_ok());
    }
}
