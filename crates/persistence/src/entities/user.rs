//! User and session entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use domain::models::{User, UserRole, UserSession};

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            password_hash: entity.password_hash,
            display_name: entity.display_name,
            // Unknown roles get the least privilege.
            role: UserRole::from_str(&entity.role).unwrap_or(UserRole::Employee),
            is_active: entity.is_active,
            last_login_at: entity.last_login_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            deleted_at: entity.deleted_at,
        }
    }
}

/// Database row mapping for the user_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSessionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl From<UserSessionEntity> for UserSession {
    fn from(entity: UserSessionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            refresh_token_hash: entity.refresh_token_hash,
            user_agent: entity.user_agent,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
            last_used_at: entity.last_used_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(role: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: "ops@example.com".into(),
            password_hash: "$argon2id$v=19$...".into(),
            display_name: "Ops".into(),
            role: role.into(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_user_entity_to_domain() {
        let user: User = entity("manager").into();
        assert_eq!(user.role, UserRole::Manager);
        assert_eq!(user.email, "ops@example.com");
    }

    #[test]
    fn test_unknown_role_falls_back_to_employee() {
        let user: User = entity("superuser").into();
        assert_eq!(user.role, UserRole::Employee);
    }
}
