//! Domain layer for the Worktrack backend.
//!
//! This crate contains:
//! - Domain models and request/response DTOs
//! - Pure services: geometry, geofence evaluation, attendance automation,
//!   GPS ingestion filtering and website restriction matching

pub mod models;
pub mod services;
