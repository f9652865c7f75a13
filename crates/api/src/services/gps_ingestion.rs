//! GPS ingestion pipeline.
//!
//! One upload runs in a single transaction, serialized per user:
//!
//! 1. lock the user and read the newest stored `captured_at`;
//! 2. filter the batch (accuracy, ordering, minimum interval);
//! 3. for each accepted point in capture order: store it, evaluate geofence
//!    membership, decide automatic attendance, persist geo-events,
//!    attendance changes and notifications;
//! 4. persist the final membership of every evaluated geofence;
//! 5. commit, then record metrics.
//!
//! Points may arrive days late. An automatic clock-in never starts before the
//! user's last clock-out, so closed time is not counted twice.

use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use domain::models::attendance::{ClockOut, NewClockIn};
use domain::models::geo_event::NewGeoEvent;
use domain::models::gps_point::{AttendanceChange, IngestGpsPointsResponse};
use domain::models::{
    AttendanceRecord, AttendanceSource, GeoEvent, Geofence, GpsPointInput, NewNotification,
    OrganizationSettings,
};
use domain::services::{
    apply_states, decide, drop_stale_clock_in, evaluate, filter_batch, AttendanceAction,
    FilterSettings,
};
use persistence::repositories::{
    AttendanceRepository, GeoEventRepository, GeofenceRepository, GeofenceStateRepository,
    GpsPointRepository, NotificationRepository, OrganizationSettingsRepository,
};

use crate::error::ApiError;
use crate::middleware::metrics::{record_geo_event, record_gps_ingested, record_gps_rejected};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("GPS tracking is disabled for this organization")]
    TrackingDisabled,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<IngestionError> for ApiError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::TrackingDisabled => ApiError::Forbidden(err.to_string()),
            IngestionError::Database(e) => ApiError::from(e),
        }
    }
}

pub struct GpsIngestionService {
    pool: PgPool,
    settings: OrganizationSettingsRepository,
    points: GpsPointRepository,
    geofences: GeofenceRepository,
    states: GeofenceStateRepository,
    events: GeoEventRepository,
    attendance: AttendanceRepository,
    notifications: NotificationRepository,
}

impl GpsIngestionService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            settings: OrganizationSettingsRepository::new(pool.clone()),
            points: GpsPointRepository::new(pool.clone()),
            geofences: GeofenceRepository::new(pool.clone()),
            states: GeofenceStateRepository::new(),
            events: GeoEventRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn ingest(
        &self,
        user_id: Uuid,
        points: &[GpsPointInput],
    ) -> Result<IngestGpsPointsResponse, IngestionError> {
        let settings: OrganizationSettings = self
            .settings
            .get()
            .await?
            .map(Into::into)
            .unwrap_or_default();
        if !settings.gps_tracking_enabled {
            return Err(IngestionError::TrackingDisabled);
        }

        let mut tx = self.pool.begin().await?;
        self.points.lock_user(&mut *tx, user_id).await?;

        let last_captured_at = self.points.latest_captured_at(&mut *tx, user_id).await?;
        let filtered = filter_batch(points, last_captured_at, FilterSettings::from(&settings));

        let mut response = IngestGpsPointsResponse {
            accepted: filtered.accepted.len(),
            rejected: filtered.rejections.len(),
            rejections: filtered.rejections.clone(),
            events: Vec::new(),
            attendance: None,
        };

        if filtered.accepted.is_empty() {
            tx.commit().await?;
            record_outcome(&response);
            return Ok(response);
        }

        let geofences: Vec<Geofence> = self
            .geofences
            .list_evaluable(&mut *tx)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let names: HashMap<Uuid, &str> = geofences
            .iter()
            .map(|g| (g.id, g.name.as_str()))
            .collect();

        let mut membership: HashMap<Uuid, bool> = self
            .states
            .find_for_user(&mut *tx, user_id)
            .await?
            .into_iter()
            .map(|s| (s.geofence_id, s.inside))
            .collect();

        let mut open_record: Option<AttendanceRecord> = self
            .attendance
            .find_open_for_update(&mut *tx, user_id)
            .await?
            .map(Into::into);
        let mut last_clock_out = self.attendance.latest_clock_out(&mut *tx, user_id).await?;

        let mut pending_notifications: Vec<NewNotification> = Vec::new();

        let mut last_point_id = None;

        for &index in &filtered.accepted {
            let input = &points[index];
            let stored = self.points.insert(&mut *tx, user_id, input).await?;
            last_point_id = Some(stored.id);

            let evaluation = evaluate(&membership, &geofences, input.position());
            let mut decision = decide(
                &evaluation,
                &geofences,
                settings.auto_clock_enabled,
                open_record.is_some(),
            );
            drop_stale_clock_in(&mut decision, input.captured_at, last_clock_out);

            for (transition, action) in evaluation.transitions.iter().zip(&decision.actions) {
                let new_event = NewGeoEvent {
                    user_id,
                    geofence_id: transition.geofence_id,
                    event_type: transition.event_type,
                    latitude: input.latitude,
                    longitude: input.longitude,
                    gps_point_id: Some(stored.id),
                    action: *action,
                    occurred_at: input.captured_at,
                };
                let mut event: GeoEvent = self.events.insert(&mut *tx, &new_event).await?.into();
                event.geofence_name = Some(transition.geofence_name.clone());

                pending_notifications.push(NewNotification::geofence_crossing(
                    user_id,
                    transition.event_type,
                    transition.geofence_id,
                    &transition.geofence_name,
                    event.id,
                ));
                response.events.push(event.into());
            }
            apply_states(&mut membership, &evaluation);

            match decision.attendance {
                Some(AttendanceAction::ClockIn { geofence_id }) => {
                    let record: AttendanceRecord = self
                        .attendance
                        .clock_in(
                            &mut *tx,
                            &NewClockIn {
                                user_id,
                                at: input.captured_at,
                                source: AttendanceSource::Geofence,
                                geofence_id: Some(geofence_id),
                                latitude: Some(input.latitude),
                                longitude: Some(input.longitude),
                                note: None,
                            },
                        )
                        .await?
                        .into();
                    tracing::info!(
                        user_id = %user_id,
                        geofence_id = %geofence_id,
                        record_id = %record.id,
                        "Automatic clock-in"
                    );
                    pending_notifications.push(NewNotification::auto_clock_in(
                        user_id,
                        names.get(&geofence_id).copied().unwrap_or("a geofence"),
                        record.id,
                    ));
                    response.attendance = Some(AttendanceChange::ClockedIn);
                    open_record = Some(record);
                }
                Some(AttendanceAction::ClockOut { geofence_id }) => {
                    let closed = self
                        .attendance
                        .clock_out(
                            &mut *tx,
                            user_id,
                            &ClockOut {
                                at: input.captured_at,
                                source: AttendanceSource::Geofence,
                                latitude: Some(input.latitude),
                                longitude: Some(input.longitude),
                                note: None,
                            },
                        )
                        .await?;
                    if let Some(record) = closed {
                        tracing::info!(
                            user_id = %user_id,
                            geofence_id = %geofence_id,
                            record_id = %record.id,
                            "Automatic clock-out"
                        );
                        pending_notifications.push(NewNotification::auto_clock_out(
                            user_id,
                            names.get(&geofence_id).copied().unwrap_or("a geofence"),
                            record.id,
                        ));
                        response.attendance = Some(AttendanceChange::ClockedOut);
                        last_clock_out = record.clock_out_at;
                    }
                    open_record = None;
                }
                None => {}
            }
        }

        if let Some(last_point_id) = last_point_id {
            let states: Vec<(Uuid, bool)> = geofences
                .iter()
                .filter_map(|g| membership.get(&g.id).map(|&inside| (g.id, inside)))
                .collect();
            self.states
                .upsert_all(&mut *tx, user_id, &states, last_point_id)
                .await?;
        }

        for notification in &pending_notifications {
            self.notifications.insert(&mut *tx, notification).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            accepted = response.accepted,
            rejected = response.rejected,
            events = response.events.len(),
            "GPS batch ingested"
        );
        record_outcome(&response);
        Ok(response)
    }
}

fn record_outcome(response: &IngestGpsPointsResponse) {
    record_gps_ingested(response.accepted);
    for rejection in &response.rejections {
        record_gps_rejected(rejection.reason);
    }
    for event in &response.events {
        record_geo_event(event.event_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_tracking_disabled_is_forbidden() {
        let response = ApiError::from(IngestionError::TrackingDisabled).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_database_error_maps_through_api_error() {
        let err = IngestionError::Database(sqlx::Error::PoolTimedOut);
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
