//! Authentication, session and access-control tests.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{
    create_test_app, create_test_pool, get_request, issue_token, json_request, lazy_pool,
    parse_response_body, send, TestUser, TEST_PASSWORD,
};
use domain::models::UserRole;

// ----------------------------------------------------------------------------
// Router-level (no database)
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_liveness_is_public() {
    let app = create_test_app(lazy_pool());
    let response = send(&app, get_request("/api/health/live", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = create_test_app(lazy_pool());
    let response = send(&app, get_request("/api/v1/auth/me", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = create_test_app(lazy_pool());
    let response = send(&app, get_request("/api/v1/gps/points", Some("not-a-jwt"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = create_test_app(lazy_pool());
    let mut request = get_request("/api/health/live", None);
    request
        .headers_mut()
        .insert("x-request-id", "req-12345".parse().unwrap());

    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "req-12345");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_login_rejects_malformed_email() {
    let app = create_test_app(lazy_pool());
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/auth/login",
            json!({ "email": "not-an-email", "password": "whatever" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_employee_cannot_manage_users() {
    let app = create_test_app(lazy_pool());
    let token = issue_token(Uuid::new_v4(), UserRole::Employee);

    let response = send(&app, get_request("/api/v1/users", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users",
            json!({
                "email": "new@worktrack.test",
                "password": "Sup3r-Secret",
                "display_name": "New Hire",
                "role": "employee"
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_admin_updates_organization_settings() {
    let app = create_test_app(lazy_pool());
    let token = issue_token(Uuid::new_v4(), UserRole::Manager);

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/organization/settings",
            json!({ "gps_retention_days": 30 }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_employee_cannot_read_other_users_history() {
    let app = create_test_app(lazy_pool());
    let token = issue_token(Uuid::new_v4(), UserRole::Employee);
    let uri = format!("/api/v1/gps/points?user_id={}", Uuid::new_v4());

    let response = send(&app, get_request(&uri, Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ----------------------------------------------------------------------------
// Database
// ----------------------------------------------------------------------------

async fn login(app: &axum::Router, email: &str, password: &str) -> axum::response::Response {
    send(
        app,
        json_request(
            Method::POST,
            "/api/v1/auth/login",
            json!({ "email": email, "password": password }),
            None,
        ),
    )
    .await
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_login_and_me() {
    let pool = create_test_pool().await;
    let app = create_test_app(pool.clone());
    let user = TestUser::create(&pool, UserRole::Employee).await;

    let response = login(&app, &user.email.to_uppercase(), TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["user"]["email"], user.email);
    assert_eq!(body["tokens"]["token_type"], "Bearer");

    let access = body["tokens"]["access_token"].as_str().unwrap();
    let response = send(&app, get_request("/api/v1/auth/me", Some(access))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = parse_response_body(response).await;
    assert_eq!(me["id"], user.id.to_string());
    assert_eq!(me["role"], "employee");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_wrong_password_is_unauthorized() {
    let pool = create_test_pool().await;
    let app = create_test_app(pool.clone());
    let user = TestUser::create(&pool, UserRole::Employee).await;

    let response = login(&app, &user.email, "Wrong-Password-1").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_refresh_rotates_and_reuse_revokes() {
    let pool = create_test_pool().await;
    let app = create_test_app(pool.clone());
    let user = TestUser::create(&pool, UserRole::Employee).await;

    let body = parse_response_body(login(&app, &user.email, TEST_PASSWORD).await).await;
    let first = body["tokens"]["refresh_token"].as_str().unwrap().to_string();

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            json!({ "refresh_token": first }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = parse_response_body(response).await;
    let second = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    // Replaying the old token ends every session, including the new one.
    let replay = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            json!({ "refresh_token": first }),
            None,
        ),
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let after = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            json!({ "refresh_token": second }),
            None,
        ),
    )
    .await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_logout_ends_session() {
    let pool = create_test_pool().await;
    let app = create_test_app(pool.clone());
    let user = TestUser::create(&pool, UserRole::Employee).await;

    let body = parse_response_body(login(&app, &user.email, TEST_PASSWORD).await).await;
    let refresh = body["tokens"]["refresh_token"].as_str().unwrap().to_string();

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/auth/logout",
            json!({ "refresh_token": refresh }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["sessions_ended"], 1);

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            json!({ "refresh_token": refresh }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_admin_creates_user_and_duplicate_conflicts() {
    let pool = create_test_pool().await;
    let app = create_test_app(pool.clone());
    let admin = TestUser::create(&pool, UserRole::Admin).await;
    let email = format!("hire-{}@worktrack.test", Uuid::new_v4());

    let payload = json!({
        "email": email,
        "password": "Sup3r-Secret-Pass",
        "display_name": "New Hire",
        "role": "employee"
    });
    let response = send(
        &app,
        json_request(Method::POST, "/api/v1/users", payload.clone(), Some(&admin.token())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        json_request(Method::POST, "/api/v1/users", payload, Some(&admin.token())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
