use serde::Deserialize;
use std::net::SocketAddr;

use shared::jwt::{JwtConfig, JwtError};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
    /// JWT authentication configuration
    pub jwt: JwtAuthConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins; empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests per minute per authenticated user; 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Send Strict-Transport-Security. Only enable behind TLS.
    #[serde(default)]
    pub hsts_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_gps_batch_size")]
    pub max_gps_batch_size: usize,

    #[serde(default = "default_max_geofences")]
    pub max_geofences: i64,

    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// RSA private key in PEM format for signing tokens
    #[serde(default)]
    pub private_key: String,

    /// RSA public key in PEM format for verifying tokens
    #[serde(default)]
    pub public_key: String,

    /// HS256 shared secret, used only when no RSA keys are configured.
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,

    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: i64,

    /// Clock skew tolerance for `exp`.
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl JwtAuthConfig {
    /// Builds the token signer: RS256 when a key pair is configured,
    /// otherwise HS256 from `secret`.
    pub fn build(&self) -> Result<JwtConfig, JwtError> {
        if !self.private_key.is_empty() && !self.public_key.is_empty() {
            JwtConfig::from_rsa_pem(
                &normalize_pem_key(&self.private_key),
                &normalize_pem_key(&self.public_key),
                self.access_token_expiry_secs,
                self.refresh_token_expiry_secs,
                self.leeway_secs,
            )
        } else {
            JwtConfig::from_secret(
                &self.secret,
                self.access_token_expiry_secs,
                self.refresh_token_expiry_secs,
                self.leeway_secs,
            )
        }
    }
}

/// Turns escaped `\n` sequences from env files into real newlines.
fn normalize_pem_key(key: &str) -> String {
    key.trim_matches('"')
        .trim_matches('\'')
        .replace("\\n", "\n")
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_retention_interval")]
    pub retention_interval_secs: u64,

    #[serde(default = "default_retention_batch_size")]
    pub retention_batch_size: i64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_interval_secs: default_retention_interval(),
            retention_batch_size: default_retention_batch_size(),
        }
    }
}

/// Initial admin account created on first start.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub admin_email: String,

    #[serde(default)]
    pub admin_password: String,

    #[serde(default = "default_admin_name")]
    pub admin_display_name: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    120
}
fn default_max_gps_batch_size() -> usize {
    domain::models::gps_point::MAX_BATCH_SIZE
}
fn default_max_geofences() -> i64 {
    500
}
fn default_page_size() -> i64 {
    50
}
fn default_max_page_size() -> i64 {
    500
}
fn default_access_token_expiry() -> i64 {
    3600 // 1 hour
}
fn default_refresh_token_expiry() -> i64 {
    2_592_000 // 30 days
}
fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}
fn default_true() -> bool {
    true
}
fn default_retention_interval() -> u64 {
    3600
}
fn default_retention_batch_size() -> i64 {
    10_000
}
fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml
    /// 2. config/local.toml (optional, not in git)
    /// 3. Environment variables with WT__ prefix, e.g. `WT__DATABASE__URL`
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("WT")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Builds a config from embedded defaults plus `overrides`, without
    /// touching the filesystem. Skips validation.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""
            max_connections = 5
            min_connections = 1
            connect_timeout_secs = 5
            idle_timeout_secs = 60

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 0

            [limits]
            max_gps_batch_size = 100
            max_geofences = 500
            default_page_size = 50
            max_page_size = 500

            [jwt]
            secret = "worktrack-test-secret-worktrack-test-secret"
            access_token_expiry_secs = 3600
            refresh_token_expiry_secs = 2592000
            leeway_secs = 30

            [jobs]
            enabled = false
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "WT__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.limits.max_gps_batch_size == 0
            || self.limits.max_gps_batch_size > domain::models::gps_point::MAX_BATCH_SIZE
        {
            return Err(ConfigValidationError::InvalidValue(format!(
                "limits.max_gps_batch_size must be between 1 and {}",
                domain::models::gps_point::MAX_BATCH_SIZE
            )));
        }

        if self.limits.default_page_size < 1 || self.limits.default_page_size > self.limits.max_page_size {
            return Err(ConfigValidationError::InvalidValue(
                "limits.default_page_size must be between 1 and limits.max_page_size".to_string(),
            ));
        }

        let has_rsa = !self.jwt.private_key.is_empty() && !self.jwt.public_key.is_empty();
        if !has_rsa && self.jwt.secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "jwt.private_key and jwt.public_key (or jwt.secret) must be set".to_string(),
            ));
        }

        if !self.bootstrap.admin_email.is_empty() && self.bootstrap.admin_password.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "bootstrap.admin_password must be set together with bootstrap.admin_email"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                ConfigValidationError::InvalidValue(format!(
                    "Invalid listen address {}:{}",
                    self.server.host, self.server.port
                ))
            })
    }
}
