//! Authentication and session management

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use jwt::{Claims, TokenIssuer, TokenPair};
pub use middleware::{bearer_token, require_auth};
pub use models::{MerchantId, User, UserId};
pub use password::{hash_password, verify_password, CredentialVerifier};
pub use service::AuthService;
