//! Durable user records consumed by the authentication core

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PostgresCredentialStore;

use async_trait::async_trait;

use crate::auth::models::{NewUser, User, UserId};
use crate::error::Result;

/// User storage keyed by email
///
/// Implementations must enforce email uniqueness themselves and report a
/// duplicate insert as [`crate::Error::EmailExists`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn insert(&self, user: NewUser) -> Result<UserId>;

    async fn touch_last_login(&self, user_id: UserId) -> Result<()>;
}
