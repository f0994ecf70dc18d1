//! Password hashing and credential verification

use std::sync::{Arc, OnceLock};

use crate::auth::models::User;
use crate::error::{Error, Result};
use crate::store::CredentialStore;

/// Hash a password with a per-record salt at the given bcrypt cost
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| Error::Other(format!("hashing task failed: {}", e)))?
        .map_err(|e| Error::Other(format!("Failed to hash password: {}", e)))
}

/// Compare a password against a stored bcrypt hash
///
/// An unparseable stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matched = tokio::task::spawn_blocking(move || match bcrypt::verify(&password, &hash) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!("Stored password hash could not be checked: {}", e);
            false
        }
    })
    .await
    .map_err(|e| Error::Other(format!("verification task failed: {}", e)))?;
    Ok(matched)
}

/// Decides whether an (email, password) pair authenticates a user
///
/// Verification only reads from the store. Unknown emails are checked against
/// a dummy hash of the same cost so the time taken does not reveal whether
/// the account exists.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    cost: u32,
    dummy_hash: Arc<OnceLock<String>>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>, cost: u32) -> Self {
        Self {
            store,
            cost,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    pub async fn verify(&self, email: &str, password: &str) -> Result<User> {
        let user = self.store.find_by_email(email).await?;

        let Some(user) = user else {
            let dummy = self.dummy_hash().await?;
            let _ = verify_password(password, &dummy).await?;
            return Err(Error::CredentialsInvalid);
        };

        if !verify_password(password, &user.password_hash).await? {
            return Err(Error::CredentialsInvalid);
        }
        if !user.active {
            return Err(Error::AccountInactive);
        }

        Ok(user)
    }

    async fn dummy_hash(&self) -> Result<String> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash.clone());
        }
        let hash = hash_password("merchant-auth-timing-equalizer", self.cost).await?;
        Ok(self.dummy_hash.get_or_init(|| hash).clone())
    }
}
