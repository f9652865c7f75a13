//! Geofence CRUD and point-check tests.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{
    create_test_app, create_test_pool, delete_request, get_request, issue_token, json_request,
    lazy_pool, parse_response_body, send, unique_site, TestUser,
};
use domain::models::UserRole;

#[tokio::test]
async fn test_employee_cannot_create_geofence() {
    let app = create_test_app(lazy_pool());
    let token = issue_token(Uuid::new_v4(), UserRole::Employee);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/gps/geofences",
            json!({
                "name": "Office",
                "shape": "circle",
                "center_latitude": 48.0,
                "center_longitude": 17.0,
                "radius_meters": 100.0
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_circle_without_radius_rejected() {
    let app = create_test_app(lazy_pool());
    let token = issue_token(Uuid::new_v4(), UserRole::Manager);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/gps/geofences",
            json!({
                "name": "Office",
                "shape": "circle",
                "center_latitude": 48.0,
                "center_longitude": 17.0
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_polygon_with_two_vertices_rejected() {
    let app = create_test_app(lazy_pool());
    let token = issue_token(Uuid::new_v4(), UserRole::Manager);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/gps/geofences",
            json!({
                "name": "Line",
                "shape": "polygon",
                "vertices": [
                    { "latitude": 48.0, "longitude": 17.0 },
                    { "latitude": 48.1, "longitude": 17.1 }
                ]
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_geofence_lifecycle() {
    let pool = create_test_pool().await;
    let app = create_test_app(pool.clone());
    let manager = TestUser::create(&pool, UserRole::Manager).await;
    let worker = TestUser::create(&pool, UserRole::Employee).await;
    let (lat, lon) = unique_site();
    let name = format!("Depot {}", Uuid::new_v4());

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/gps/geofences",
            json!({
                "name": name,
                "shape": "circle",
                "center_latitude": lat,
                "center_longitude": lon,
                "radius_meters": 150.0,
                "auto_clock_in": true
            }),
            Some(&manager.token()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_response_body(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["shape"], "circle");
    assert_eq!(created["auto_clock_in"], true);
    assert_eq!(created["auto_clock_out"], false);
    let uri = format!("/api/v1/gps/geofences/{}", id);

    // Employees can read.
    let response = send(&app, get_request(&uri, Some(&worker.token()))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Partial update keeps the centre.
    let response = send(
        &app,
        json_request(
            Method::PATCH,
            &uri,
            json!({ "radius_meters": 300.0 }),
            Some(&manager.token()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = parse_response_body(response).await;
    assert_eq!(updated["radius_meters"], 300.0);
    assert_eq!(updated["center_latitude"], lat);
    assert_eq!(updated["name"], name);

    // About 220 m north: inside only after the radius change.
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/gps/geofences/check",
            json!({ "latitude": lat + 0.002, "longitude": lon }),
            Some(&worker.token()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let check = parse_response_body(response).await;
    let ids: Vec<&str> = check["inside"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&id.as_str()));

    let response = send(&app, delete_request(&uri, &worker.token())).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, delete_request(&uri, &manager.token())).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, get_request(&uri, Some(&worker.token()))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, delete_request(&uri, &manager.token())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_patch_null_description_clears_it() {
    let pool = create_test_pool().await;
    let app = create_test_app(pool.clone());
    let manager = TestUser::create(&pool, UserRole::Manager).await;
    let (lat, lon) = unique_site();

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/gps/geofences",
            json!({
                "name": format!("Yard {}", Uuid::new_v4()),
                "description": "North entrance",
                "shape": "circle",
                "center_latitude": lat,
                "center_longitude": lon,
                "radius_meters": 100.0
            }),
            Some(&manager.token()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_response_body(response).await;
    assert_eq!(created["description"], "North entrance");
    let uri = format!("/api/v1/gps/geofences/{}", created["id"].as_str().unwrap());

    // Absent keeps the description.
    let response = send(
        &app,
        json_request(Method::PATCH, &uri, json!({ "active": false }), Some(&manager.token())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = parse_response_body(response).await;
    assert_eq!(updated["description"], "North entrance");

    let response = send(
        &app,
        json_request(Method::PATCH, &uri, json!({ "description": null }), Some(&manager.token())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = parse_response_body(response).await;
    assert!(updated["description"].is_null());

    let response = send(&app, get_request(&uri, Some(&manager.token()))).await;
    assert!(parse_response_body(response).await["description"].is_null());

    let response = send(&app, delete_request(&uri, &manager.token())).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
