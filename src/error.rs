//! Error types for merchant-auth

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    CredentialsInvalid,

    #[error("Account inactive")]
    AccountInactive,

    #[error("Email already exists")]
    EmailExists,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session backend not available")]
    SessionBackendUnavailable,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Malformed token subject")]
    TokenMalformed,

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'merchant-auth init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error is an authentication failure as seen by a caller
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Error::CredentialsInvalid
                | Error::AccountInactive
                | Error::TokenInvalid
                | Error::TokenExpired
                | Error::TokenMalformed
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::BackendUnavailable("operation timed out".to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
