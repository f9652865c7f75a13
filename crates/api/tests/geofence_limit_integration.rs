//! Geofence creation limit. Kept in its own binary so no concurrent test
//! changes the geofence count.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{
    create_test_pool, delete_request, json_request, parse_response_body, send, test_config,
    unique_site, TestUser,
};
use domain::models::UserRole;
use worktrack_api::app::create_app;

fn circle(active: bool) -> Value {
    let (lat, lon) = unique_site();
    json!({
        "name": format!("Depot {}", Uuid::new_v4()),
        "shape": "circle",
        "center_latitude": lat,
        "center_longitude": lon,
        "radius_meters": 150.0,
        "active": active,
    })
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_inactive_geofences_count_toward_limit() {
    let pool = create_test_pool().await;
    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM geofences WHERE deleted_at IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();

    let mut config = test_config();
    config.limits.max_geofences = existing + 1;
    let app = create_app(config, pool.clone()).unwrap();
    let manager = TestUser::create(&pool, UserRole::Manager).await;
    let token = manager.token();

    let response = send(
        &app,
        json_request(Method::POST, "/api/v1/gps/geofences", circle(false), Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_response_body(response).await;
    assert_eq!(created["active"], false);

    let response = send(
        &app,
        json_request(Method::POST, "/api/v1/gps/geofences", circle(true), Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let uri = format!("/api/v1/gps/geofences/{}", created["id"].as_str().unwrap());
    let response = send(&app, delete_request(&uri, &token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
