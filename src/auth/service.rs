//! Login, registration, token refresh and session lifecycle
//!
//! `AuthService` is the only component that decides how failures of its
//! collaborators surface. Credential and token problems are returned to the
//! caller; session tracking and last-login bookkeeping degrade quietly.

use std::sync::Arc;

use crate::auth::jwt::{Claims, TokenIssuer};
use crate::auth::models::{
    LoginResponse, NewUser, RefreshResponse, RegisterRequest, RegisterResponse, StatusResponse,
    ValidateSessionResponse,
};
use crate::auth::password::{hash_password, CredentialVerifier};
use crate::clock::Clock;
use crate::config::{Config, RefreshRotation};
use crate::error::{Error, Result};
use crate::session::store::redact;
use crate::session::{generate_session_id, KvBackend, RefreshLedger, SessionRecord, SessionStore};
use crate::store::CredentialStore;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    verifier: CredentialVerifier,
    tokens: TokenIssuer,
    sessions: Option<SessionStore>,
    ledger: Option<RefreshLedger>,
    bcrypt_cost: u32,
    default_role: String,
}

impl AuthService {
    /// Service without session tracking and with permissive refresh tokens
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenIssuer, bcrypt_cost: u32) -> Self {
        Self {
            verifier: CredentialVerifier::new(store.clone(), bcrypt_cost),
            store,
            tokens,
            sessions: None,
            ledger: None,
            bcrypt_cost,
            default_role: "merchant".to_string(),
        }
    }

    /// Assemble the service from configuration
    ///
    /// `backend` is the session backend when one is reachable; without it the
    /// service runs with session tracking disabled.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        backend: Option<Arc<dyn KvBackend>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let tokens = TokenIssuer::from_config(&config.auth, clock.clone())?;
        let mut service = Self::new(store, tokens, config.auth.bcrypt_cost)
            .with_default_role(&config.auth.default_role);

        let backend = backend.filter(|_| config.session.enabled);
        if let Some(backend) = &backend {
            service = service.with_sessions(SessionStore::new(
                backend.clone(),
                clock.clone(),
                &config.session,
            ));
        }

        if config.auth.refresh_rotation == RefreshRotation::SingleUse {
            match backend {
                Some(backend) => {
                    service = service.with_refresh_ledger(RefreshLedger::new(
                        backend,
                        clock,
                        config.session.backend_timeout(),
                    ));
                }
                None => tracing::warn!(
                    "Single-use refresh tokens need a session backend; falling back to permissive"
                ),
            }
        }

        Ok(service)
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Reject refresh tokens that have already been exchanged
    pub fn with_refresh_ledger(mut self, ledger: RefreshLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_default_role(mut self, role: &str) -> Self {
        self.default_role = role.to_string();
        self
    }

    pub fn has_sessions(&self) -> bool {
        self.sessions.is_some()
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let user = match self.verifier.verify(email, password).await {
            Ok(user) => user,
            Err(e) => {
                tracing::info!("Login rejected: {}", e);
                return Err(e);
            }
        };

        let pair = self.tokens.issue_pair(user.id, &user.role)?;

        if let Err(e) = self.store.touch_last_login(user.id).await {
            tracing::warn!(user_id = user.id, "Failed to record last login: {}", e);
        }

        let session_id = match &self.sessions {
            Some(sessions) => {
                let session_id = generate_session_id();
                let record = SessionRecord::new(user.id, &user.role, user.merchant_id, &user.email);
                match sessions.create(&session_id, record).await {
                    Ok(_) => Some(session_id),
                    Err(e) => {
                        tracing::warn!(user_id = user.id, "Login continuing without session: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        tracing::info!(user_id = user.id, with_session = session_id.is_some(), "User logged in");

        Ok(LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: pair.expires_at,
            role: user.role,
            merchant_id: user.merchant_id,
            session_id,
            email: user.email,
        })
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(Error::Validation(
                "email and password are required".to_string(),
            ));
        }

        // Advisory only: the store's uniqueness constraint is what actually holds
        match self.store.find_by_email(&req.email).await {
            Ok(Some(_)) => return Err(Error::EmailExists),
            Ok(None) => {}
            Err(e) => tracing::warn!("Duplicate email pre-check failed: {}", e),
        }

        let password_hash = hash_password(&req.password, self.bcrypt_cost).await?;
        let name = Some(req.name.trim().to_string()).filter(|name| !name.is_empty());

        let user_id = self
            .store
            .insert(NewUser {
                email: req.email,
                name,
                password_hash,
                role: self.default_role.clone(),
                merchant_id: req.merchant_id,
            })
            .await?;

        let pair = self.tokens.issue_pair(user_id, &self.default_role)?;
        tracing::info!(user_id, "Registered user");

        Ok(RegisterResponse {
            user_id,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            merchant_id: req.merchant_id,
        })
    }

    /// Exchange a refresh token for a new pair
    ///
    /// Never fails: a token that is not accepted yields [`RefreshResponse::denied`].
    pub async fn refresh(&self, refresh_token: &str) -> RefreshResponse {
        let (user_id, claims) = match self.tokens.verify_refresh(refresh_token) {
            Ok(verified) => verified,
            Err(e) => {
                tracing::debug!("Refresh denied: {}", e);
                return RefreshResponse::denied();
            }
        };

        if let Some(ledger) = &self.ledger {
            match ledger.claim(&claims.jti, claims.exp).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(user_id, "Refresh token reused");
                    return RefreshResponse::denied();
                }
                Err(e) => {
                    tracing::warn!(user_id, "Refresh ledger unavailable: {}", e);
                    return RefreshResponse::denied();
                }
            }
        }

        match self.tokens.issue_pair(user_id, &claims.role) {
            Ok(pair) => RefreshResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                expires_at: pair.expires_at,
            },
            Err(e) => {
                tracing::error!(user_id, "Failed to issue refreshed tokens: {}", e);
                RefreshResponse::denied()
            }
        }
    }

    /// Drop the session if there is one; always acknowledges
    pub async fn logout(&self, session_id: &str) -> StatusResponse {
        if let Some(sessions) = &self.sessions {
            if !session_id.is_empty() {
                if let Err(e) = sessions.delete(session_id).await {
                    tracing::warn!(session = redact(session_id), "Failed to delete session: {}", e);
                }
            }
        }
        StatusResponse::new("logged_out")
    }

    pub async fn validate_session(&self, session_id: &str) -> Result<ValidateSessionResponse> {
        let sessions = self.sessions.as_ref().ok_or(Error::SessionBackendUnavailable)?;
        if session_id.is_empty() {
            return Ok(ValidateSessionResponse::invalid());
        }

        match sessions.get(session_id).await {
            Ok(record) => Ok(ValidateSessionResponse {
                valid: true,
                user_id: Some(record.user_id),
                role: Some(record.role),
                merchant_id: record.merchant_id,
                email: Some(record.email),
            }),
            Err(e) => {
                tracing::debug!(session = redact(session_id), "Session invalid: {}", e);
                Ok(ValidateSessionResponse::invalid())
            }
        }
    }

    /// Extend a live session by one TTL
    pub async fn refresh_session(&self, session_id: &str) -> Result<SessionRecord> {
        let sessions = self.sessions.as_ref().ok_or(Error::SessionBackendUnavailable)?;
        if session_id.is_empty() {
            return Err(Error::SessionNotFound);
        }
        sessions.refresh(session_id).await
    }

    /// Claims of a valid access token
    pub fn current_user(&self, access_token: &str) -> Result<Claims> {
        self.tokens.verify_access(access_token)
    }
}
