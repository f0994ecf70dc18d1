//! JWT token handling

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::UserId;
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Marker carried in the `type` claim of refresh tokens
pub const REFRESH_MARKER: &str = "refresh";

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User role
    pub role: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
    /// Present only on refresh tokens
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Claims {
    /// Interpret the subject as a user identifier
    pub fn user_id(&self) -> Result<UserId> {
        self.sub.parse().map_err(|_| Error::TokenMalformed)
    }

    pub fn is_refresh(&self) -> bool {
        self.kind.as_deref() == Some(REFRESH_MARKER)
    }
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, unix seconds
    pub expires_at: i64,
    /// Refresh token expiry, unix seconds
    pub refresh_expires_at: i64,
    /// `jti` of the refresh token
    pub refresh_id: String,
}

/// Signs and verifies HS256 token pairs with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl: i64, refresh_ttl: i64, clock: Arc<dyn Clock>) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("token secret must not be empty".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
            clock,
        })
    }

    pub fn from_config(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.access_ttl_secs,
            config.refresh_ttl_secs,
            clock,
        )
    }

    /// Issue an access token and a refresh token for the user
    pub fn issue_pair(&self, user_id: UserId, role: &str) -> Result<TokenPair> {
        let now = self.clock.now();

        let access = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + self.access_ttl,
            jti: uuid::Uuid::new_v4().to_string(),
            kind: None,
        };
        let refresh = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + self.refresh_ttl,
            jti: uuid::Uuid::new_v4().to_string(),
            kind: Some(REFRESH_MARKER.to_string()),
        };

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            expires_at: access.exp,
            refresh_expires_at: refresh.exp,
            refresh_id: refresh.jti,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::Other(format!("Failed to create token: {}", e)))
    }

    /// Verify signature, expiry and subject of any token
    pub fn parse_and_verify(&self, token: &str) -> Result<Claims> {
        self.verify_subject(token).map(|(_, claims)| claims)
    }

    fn verify_subject(&self, token: &str) -> Result<(UserId, Claims)> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock below, with no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        // Decode loosely first so a bad signature and a bad payload stay distinguishable
        let payload = decode::<serde_json::Value>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::MissingRequiredClaim(_) => Error::TokenMalformed,
                _ => Error::TokenInvalid,
            })?;
        let claims: Claims = serde_json::from_value(payload).map_err(|_| Error::TokenMalformed)?;

        if claims.exp < self.clock.now() {
            return Err(Error::TokenExpired);
        }
        let user_id = claims.user_id()?;

        Ok((user_id, claims))
    }

    /// Verify a token that must not be a refresh token
    pub fn verify_access(&self, token: &str) -> Result<Claims> {
        let claims = self.parse_and_verify(token)?;
        if claims.is_refresh() {
            return Err(Error::TokenInvalid);
        }
        Ok(claims)
    }

    /// Verify a token that must carry the refresh marker, returning its subject
    pub fn verify_refresh(&self, token: &str) -> Result<(UserId, Claims)> {
        let (user_id, claims) = self.verify_subject(token)?;
        if !claims.is_refresh() {
            return Err(Error::TokenInvalid);
        }
        Ok((user_id, claims))
    }
}
