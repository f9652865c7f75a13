//! Application services that coordinate repositories.

pub mod admin_bootstrap;
pub mod auth;
pub mod gps_ingestion;

pub use auth::AuthService;
pub use gps_ingestion::GpsIngestionService;
