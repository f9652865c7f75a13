//! GPS ingestion filter: accuracy, rate and ordering checks.

use chrono::{DateTime, Duration, Utc};

use crate::models::gps_point::{GpsPointInput, PointRejection, RejectionReason};
use crate::models::organization_settings::OrganizationSettings;

/// Thresholds applied to an upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub min_interval_secs: i64,
    pub max_accuracy_meters: f64,
}

impl From<&OrganizationSettings> for FilterSettings {
    fn from(settings: &OrganizationSettings) -> Self {
        Self {
            min_interval_secs: i64::from(settings.gps_min_interval_secs),
            max_accuracy_meters: settings.gps_max_accuracy_meters,
        }
    }
}

/// Split of an upload into accepted and rejected points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    /// Indices of accepted points, in capture order.
    pub accepted: Vec<usize>,
    /// Rejected points, by ascending index.
    pub rejections: Vec<PointRejection>,
}

/// Filters a batch against the user's last stored point.
///
/// Points are visited in `captured_at` order (ties keep submission order).
/// Each is compared with the previous accepted point, which starts as
/// `last_captured_at`:
///
/// - `low_accuracy` when `accuracy` exceeds the organization maximum;
/// - `out_of_order` when it is not strictly newer than the previous point;
/// - `too_frequent` when it arrives sooner than the minimum interval.
pub fn filter_batch(
    points: &[GpsPointInput],
    last_captured_at: Option<DateTime<Utc>>,
    settings: FilterSettings,
) -> FilterOutcome {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| points[i].captured_at);

    let min_interval = Duration::seconds(settings.min_interval_secs.max(0));
    let mut previous = last_captured_at;
    let mut outcome = FilterOutcome::default();

    for index in order {
        let point = &points[index];

        let reason = if point.accuracy > settings.max_accuracy_meters {
            Some(RejectionReason::LowAccuracy)
        } else {
            match previous {
                Some(prev) if point.captured_at <= prev => Some(RejectionReason::OutOfOrder),
                Some(prev) if point.captured_at - prev < min_interval => {
                    Some(RejectionReason::TooFrequent)
                }
                _ => None,
            }
        };

        match reason {
            Some(reason) => outcome.rejections.push(PointRejection { index, reason }),
            None => {
                previous = Some(point.captured_at);
                outcome.accepted.push(index);
            }
        }
    }

    outcome.rejections.sort_by_key(|r| r.index);
    outcome
}
