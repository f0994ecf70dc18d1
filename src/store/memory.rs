//! In-memory credential store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CredentialStore;
use crate::auth::models::{NewUser, User, UserId};
use crate::error::{Error, Result};

#[derive(Default)]
struct Users {
    by_email: HashMap<String, User>,
    next_id: UserId,
}

/// Credential store kept in process memory
///
/// Email uniqueness is enforced under the write lock, so concurrent inserts
/// of the same email admit exactly one.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    users: Arc<RwLock<Users>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable an account
    pub async fn set_active(&self, email: &str, active: bool) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .by_email
            .get_mut(email)
            .ok_or_else(|| Error::Validation(format!("no user with email {}", email)))?;
        user.active = active;
        user.updated_at = chrono::Utc::now();
        Ok(())
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.by_email.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.by_email.get(email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserId> {
        let mut users = self.users.write().await;
        if users.by_email.contains_key(&user.email) {
            return Err(Error::EmailExists);
        }

        users.next_id += 1;
        let id = users.next_id;
        let now = chrono::Utc::now();
        users.by_email.insert(
            user.email.clone(),
            User {
                id,
                merchant_id: user.merchant_id,
                email: user.email,
                name: user.name,
                password_hash: user.password_hash,
                role: user.role,
                active: true,
                last_login: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn touch_last_login(&self, user_id: UserId) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.by_email.values_mut().find(|u| u.id == user_id) {
            let now = chrono::Utc::now();
            user.last_login = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }
}
