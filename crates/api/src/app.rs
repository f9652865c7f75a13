use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    attendance, auth, geo_events, geofences, gps, health, notifications, organization,
    restrictions, tasks, timer, users,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let config = Arc::new(config);
    let jwt = Arc::new(config.jwt.build()?);

    // rate_limit_per_minute = 0 disables limiting
    let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
        rate_limiter,
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Auth is the outermost route layer so the rate limiter sees UserAuth.
    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        // Users
        .route("/api/v1/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/v1/users/:user_id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        // GPS
        .route(
            "/api/v1/gps/points",
            post(gps::ingest_points).get(gps::history),
        )
        .route("/api/v1/gps/latest", get(gps::latest_positions))
        .route("/api/v1/gps/events", get(geo_events::list_geo_events))
        .route(
            "/api/v1/gps/geofences",
            get(geofences::list_geofences).post(geofences::create_geofence),
        )
        .route(
            "/api/v1/gps/geofences/check",
            post(geofences::check_geofences),
        )
        .route(
            "/api/v1/gps/geofences/:geofence_id",
            get(geofences::get_geofence)
                .patch(geofences::update_geofence)
                .delete(geofences::delete_geofence),
        )
        // Attendance
        .route("/api/v1/attendance/clock-in", post(attendance::clock_in))
        .route("/api/v1/attendance/clock-out", post(attendance::clock_out))
        .route("/api/v1/attendance/status", get(attendance::status))
        .route("/api/v1/attendance/records", get(attendance::records))
        .route("/api/v1/attendance/summary", get(attendance::summary))
        // Timer
        .route("/api/v1/timer/start", post(timer::start_timer))
        .route("/api/v1/timer/stop", post(timer::stop_timer))
        .route("/api/v1/timer/current", get(timer::current_timer))
        .route("/api/v1/timer/entries", get(timer::list_entries))
        // Tasks
        .route("/api/v1/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/v1/tasks/:task_id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        // Notifications
        .route(
            "/api/v1/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
        // Organization
        .route(
            "/api/v1/organization/settings",
            get(organization::get_settings).put(organization::update_settings),
        )
        .route(
            "/api/v1/restrictions",
            get(restrictions::list_restrictions),
        )
        .route("/api/v1/restrictions/check", post(restrictions::check_url))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Token endpoints authenticate with the body, not a bearer token.
    let public_routes = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::readiness))
        .route("/api/health/live", get(health::liveness))
        .route("/metrics", get(metrics_handler));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state);

    Ok(router)
}
