//! Authentication middleware and extractors

use crate::api::SharedState;
use crate::auth::Claims;
use crate::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Header carrying a session id as an alternative to the request body
pub const SESSION_HEADER: &str = "X-Session-ID";

/// Pull the bearer token out of the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Session id from the `X-Session-ID` header, if present
pub fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Verify the request's access token and return its claims
pub fn extract_claims(state: &SharedState, headers: &HeaderMap) -> Result<Claims> {
    let token = bearer_token(headers).ok_or(Error::TokenInvalid)?;
    state.service.current_user(token)
}

/// Middleware requiring a valid access token; the claims are stored as a request extension
pub async fn require_auth(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, Error> {
    let claims = extract_claims(&state, req.headers())?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
