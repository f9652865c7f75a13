//! JWT token utilities.
//!
//! Access and refresh tokens are signed with RS256 in production. A shared
//! secret (HS256) is accepted for local development and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// JWT token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role of the user at issue time (`admin`, `manager`, `employee`)
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID, unique per token
    pub jti: String,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Type of JWT token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// A signed token together with its `jti`.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Signing keys and lifetimes for JWT issuing and validation.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    pub access_token_expiry_secs: i64,
    pub refresh_token_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("refresh_token_expiry_secs", &self.refresh_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// Creates an RS256 config from an RSA key pair in PEM format.
    pub fn from_rsa_pem(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            leeway_secs,
        })
    }

    /// Creates an HS256 config from a shared secret.
    ///
    /// The secret must be at least 32 bytes.
    pub fn from_secret(
        secret: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        if secret.len() < 32 {
            return Err(JwtError::InvalidKey(
                "Shared secret must be at least 32 bytes".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            leeway_secs,
        })
    }

    /// Signing algorithm in use.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issues an access token for the given user.
    pub fn generate_access_token(&self, user_id: Uuid, role: &str) -> Result<IssuedToken, JwtError> {
        self.generate_token(user_id, role, TokenType::Access, self.access_token_expiry_secs)
    }

    /// Issues a refresh token for the given user.
    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
        role: &str,
    ) -> Result<IssuedToken, JwtError> {
        self.generate_token(user_id, role, TokenType::Refresh, self.refresh_token_expiry_secs)
    }

    fn generate_token(
        &self,
        user_id: Uuid,
        role: &str,
        token_type: TokenType,
        expiry_secs: i64,
    ) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let expires_at = now + Duration::seconds(expiry_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
            token_type,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validates an access token specifically.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }

    /// Validates a refresh token specifically.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(JwtError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Extracts user ID from validated claims.
pub fn extract_user_id(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_for_jwt_testing_0123456789";

    fn create_test_config() -> JwtConfig {
        JwtConfig::from_secret(SECRET, 900, 604800, 0).unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = JwtConfig::from_secret("short", 900, 604800, 0);
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }

    #[test]
    fn test_invalid_rsa_pem_rejected() {
        let result = JwtConfig::from_rsa_pem("not a key", "not a key", 900, 604800, 30);
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }

    #[test]
    fn test_access_token_roundtrip_carries_role() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let issued = config.generate_access_token(user_id, "manager").unwrap();
        let claims = config.validate_access_token(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(extract_user_id(&claims).unwrap(), user_id);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = create_test_config();
        let issued = config
            .generate_refresh_token(Uuid::new_v4(), "employee")
            .unwrap();

        assert!(matches!(
            config.validate_access_token(&issued.token),
            Err(JwtError::InvalidToken)
        ));
        assert!(config.validate_refresh_token(&issued.token).is_ok());
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let config = create_test_config();
        let issued = config
            .generate_access_token(Uuid::new_v4(), "employee")
            .unwrap();

        assert!(matches!(
            config.validate_refresh_token(&issued.token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let mut config = create_test_config();
        config.access_token_expiry_secs = -120;

        let issued = config
            .generate_access_token(Uuid::new_v4(), "employee")
            .unwrap();

        let result = config.validate_access_token(&issued.token);
        assert!(
            matches!(result, Err(JwtError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let config = create_test_config();
        let other =
            JwtConfig::from_secret("another_secret_key_for_jwt_tests_987654", 900, 900, 0)
                .unwrap();
        let issued = other
            .generate_access_token(Uuid::new_v4(), "admin")
            .unwrap();

        assert!(config.validate_access_token(&issued.token).is_err());
    }

    #[test]
    fn test_malformed_token() {
        let config = create_test_config();
        assert!(config.validate_token("not_a_jwt").is_err());
    }

    #[test]
    fn test_unique_jti_per_token() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let first = config.generate_access_token(user_id, "employee").unwrap();
        let second = config.generate_access_token(user_id, "employee").unwrap();

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_claims_timestamps() {
        let config = create_test_config();
        let issued = config
            .generate_access_token(Uuid::new_v4(), "employee")
            .unwrap();
        let claims = config.validate_access_token(&issued.token).unwrap();

        assert_eq!(claims.exp - claims.iat, config.access_token_expiry_secs);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let debug = format!("{:?}", create_test_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(SECRET));
    }

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(serde_json::to_string(&TokenType::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenType::Refresh).unwrap(), "\"refresh\"");
    }
}
