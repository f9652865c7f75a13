//! Shared utilities for the Worktrack backend.
//!
//! Used by every other crate in the workspace:
//! - SHA-256 helpers for token fingerprints
//! - Password hashing with Argon2id
//! - JWT issuing and validation
//! - Coordinate and sample validation for GPS payloads
//! - Cursor pagination

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
