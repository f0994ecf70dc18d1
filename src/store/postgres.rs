//! PostgreSQL credential store

use std::time::Duration;

use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row};

use super::CredentialStore;
use crate::auth::models::{NewUser, User, UserId};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    merchant_id   BIGINT,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL,
    is_active     BOOLEAN NOT NULL DEFAULT TRUE,
    last_login    TIMESTAMPTZ,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const USER_COLUMNS: &str =
    "id, merchant_id, email, name, password_hash, role, is_active, last_login, created_at, updated_at";

/// Credential store backed by a `users` table
pub struct PostgresCredentialStore {
    client: Client,
    timeout: Duration,
}

impl PostgresCredentialStore {
    /// Connect and spawn the connection driver
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let (client, connection) = tokio::time::timeout(
            config.timeout(),
            tokio_postgres::connect(&config.url, NoTls),
        )
        .await?
        .map_err(|e| Error::BackendUnavailable(format!("PostgreSQL connect failed: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Create the users table if it does not exist
    pub async fn migrate(&self) -> Result<()> {
        tokio::time::timeout(self.timeout, self.client.batch_execute(CREATE_USERS_TABLE)).await??;
        tracing::debug!("users table ready");
        Ok(())
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        merchant_id: row.get("merchant_id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        active: row.get("is_active"),
        last_login: row.get("last_login"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = tokio::time::timeout(self.timeout, self.client.query_opt(&query, &[&email])).await??;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn insert(&self, user: NewUser) -> Result<UserId> {
        let result = tokio::time::timeout(
            self.timeout,
            self.client.query_one(
                "INSERT INTO users (email, name, password_hash, role, merchant_id)
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
                &[
                    &user.email,
                    &user.name,
                    &user.password_hash,
                    &user.role,
                    &user.merchant_id,
                ],
            ),
        )
        .await?;

        match result {
            Ok(row) => Ok(row.get(0)),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => Err(Error::EmailExists),
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn touch_last_login(&self, user_id: UserId) -> Result<()> {
        tokio::time::timeout(
            self.timeout,
            self.client.execute(
                "UPDATE users SET last_login = NOW(), updated_at = NOW() WHERE id = $1",
                &[&user_id],
            ),
        )
        .await??;
        Ok(())
    }
}
