//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Absent means users are kept in memory
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Refresh token reuse policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshRotation {
    /// Refresh tokens stay usable until they expire
    #[default]
    Permissive,
    /// A refresh token is accepted once
    SingleUse,
}

/// Token issuance and password hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing key; there is no built-in value
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,

    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default)]
    pub refresh_rotation: RefreshRotation,

    /// Role assigned to self-registered users
    #[serde(default = "default_role")]
    pub default_role: String,
}

fn default_access_ttl() -> i64 {
    3600
}

fn default_refresh_ttl() -> i64 {
    24 * 3600
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_role() -> String {
    "merchant".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
            refresh_rotation: RefreshRotation::default(),
            default_role: default_role(),
        }
    }
}

/// Session tracking backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: SessionBackendKind,

    #[serde(default = "default_session_ttl")]
    pub ttl_secs: i64,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_ms: u64,

    /// Interval of the backstop eviction sweep, 0 disables it
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    #[default]
    Memory,
}

fn default_session_enabled() -> bool {
    true
}

fn default_session_ttl() -> i64 {
    24 * 3600
}

fn default_key_prefix() -> String {
    "session:".to_string()
}

fn default_backend_timeout() -> u64 {
    2000
}

fn default_sweep_interval() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: default_session_enabled(),
            backend: SessionBackendKind::default(),
            ttl_secs: default_session_ttl(),
            key_prefix: default_key_prefix(),
            backend_timeout_ms: default_backend_timeout(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl SessionConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

/// PostgreSQL connection for the credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// libpq style connection string
    pub url: String,

    #[serde(default = "default_db_timeout")]
    pub timeout_ms: u64,
}

fn default_db_timeout() -> u64 {
    5000
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Well-known secrets that must never sign real tokens
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "changeme", "secret"];

impl Config {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() {
            return Err(Error::Config(
                "auth.jwt_secret must be set (or JWT_SECRET exported)".to_string(),
            ));
        }
        if PLACEHOLDER_SECRETS.contains(&secret.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "auth.jwt_secret is the placeholder \"{}\", set a real secret",
                secret
            )));
        }
        if self.auth.access_ttl_secs <= 0 || self.auth.refresh_ttl_secs <= 0 {
            return Err(Error::Config("token TTLs must be positive".to_string()));
        }
        if self.session.ttl_secs <= 0 {
            return Err(Error::Config("session.ttl_secs must be positive".to_string()));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(Error::Config(format!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            )));
        }
        Ok(())
    }
}
