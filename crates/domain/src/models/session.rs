//! Refresh-token session model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A signed-in device or browser. Identified by the SHA-256 fingerprint of
/// the current refresh token's `jti`; rotated on every refresh.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token_hash: String,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl UserSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let session = UserSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_token_hash: "ab".repeat(32),
            user_agent: None,
            expires_at: now + Duration::hours(1),
            created_at: now,
            last_used_at: now,
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(1)));
    }
}
