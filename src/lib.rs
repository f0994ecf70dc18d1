//! merchant-auth - Authentication and session lifecycle for merchant accounts
//!
//! Verifies email/password credentials, issues access and refresh tokens,
//! and optionally tracks server-side sessions with lazy expiry.

pub mod api;
pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use auth::AuthService;
pub use config::Config;
pub use error::Error;
