//! Creates the first admin account on startup when configured.

use sqlx::PgPool;
use tracing::{info, warn};

use domain::models::user::normalize_email;
use domain::models::UserRole;
use persistence::repositories::UserRepository;
use shared::password::{check_password_strength, hash_password, PasswordError};

use crate::config::BootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

/// What [`bootstrap_admin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NotConfigured,
    AlreadyPresent,
    Created,
}

/// Creates `bootstrap.admin_email` as an admin unless an active admin or a
/// user with that email already exists. Safe to run on every start.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &BootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    if config.admin_email.is_empty() {
        return Ok(BootstrapOutcome::NotConfigured);
    }
    if config.admin_password.is_empty() {
        warn!("bootstrap.admin_email is set without bootstrap.admin_password; skipping");
        return Ok(BootstrapOutcome::NotConfigured);
    }

    let users = UserRepository::new(pool.clone());
    let email = normalize_email(&config.admin_email);

    if users.count_active_admins().await? > 0 || users.find_by_email(&email).await?.is_some() {
        info!("Admin account already present; skipping bootstrap");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    check_password_strength(&config.admin_password)?;
    let password_hash = hash_password(&config.admin_password)?;

    let admin = users
        .create(&email, &password_hash, &config.admin_display_name, UserRole::Admin)
        .await?;

    info!(user_id = %admin.id, email = %email, "Bootstrap admin created");
    Ok(BootstrapOutcome::Created)
}
