//! API route handlers

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::server::SharedState;
use crate::auth::middleware::session_header;
use crate::auth::models::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RegisterResponse, SessionRequest, StatusResponse, ValidateSessionResponse,
};
use crate::auth::Claims;
use crate::error::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    /// HTTP status reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_unauthorized() => StatusCode::UNAUTHORIZED,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::EmailExists => StatusCode::CONFLICT,
            Error::SessionNotFound => StatusCode::NOT_FOUND,
            Error::SessionBackendUnavailable | Error::BackendUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            "internal error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionRefreshResponse {
    pub status: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub role: String,
    pub expires_at: i64,
}

// Health check

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.service.has_sessions(),
    })
}

// Credentials

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Error> {
    let response = state.service.login(&req.email, &req.password).await?;
    Ok(Json(response))
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    let response = state.service.register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn refresh(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> (StatusCode, Json<RefreshResponse>) {
    let response = state.service.refresh(&req.refresh_token).await;
    let status = if response.is_denied() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}

// Sessions

pub async fn logout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<StatusResponse> {
    // Logout never fails, so an unreadable body is treated as empty
    let req: SessionRequest = serde_json::from_slice(&body).unwrap_or_default();
    let session_id = if req.session_id.is_empty() {
        session_header(&headers).unwrap_or_default().to_string()
    } else {
        req.session_id
    };
    Json(state.service.logout(&session_id).await)
}

pub async fn validate_session(
    State(state): State<SharedState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ValidateSessionResponse>, Error> {
    let response = state.service.validate_session(&req.session_id).await?;
    Ok(Json(response))
}

pub async fn refresh_session(
    State(state): State<SharedState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionRefreshResponse>, Error> {
    let record = state.service.refresh_session(&req.session_id).await?;
    Ok(Json(SessionRefreshResponse {
        status: "refreshed".to_string(),
        expires_at: record.expires_at,
    }))
}

// Token-protected

pub async fn me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: claims.sub,
        role: claims.role,
        expires_at: claims.exp,
    })
}
