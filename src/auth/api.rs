//! Authentication API Endpoints
//! Mission: Provide login, caller introspection and password reset endpoints

use crate::auth::{
    credentials::CredentialStore,
    jwt::JwtHandler,
    middleware::CurrentUser,
    models::{
        ContextResponse, ForgotPasswordRequest, IdentityResponse, LoginRequest, LoginResponse,
        ResetPasswordRequest,
    },
};
use crate::models::require_password;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub credentials: CredentialStore,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(credentials: CredentialStore, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            credentials,
            jwt_handler,
        }
    }
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.email);

    let identity = state
        .credentials
        .verify_credentials(payload.email.trim(), &payload.password)
        .map_err(|e| {
            error!("Credential lookup failed: {}", e);
            AuthApiError::InternalError
        })?;

    let Some(identity) = identity else {
        warn!("❌ Failed login attempt: {}", payload.email);
        return Err(AuthApiError::InvalidCredentials);
    };

    let (token, expires_in) = state
        .jwt_handler
        .generate_token(&identity)
        .map_err(|e| {
            error!("Token generation failed: {}", e);
            AuthApiError::InternalError
        })?;

    info!("✅ Login successful: {} ({})", identity.email, identity.role);

    Ok(Json(LoginResponse {
        token,
        expires_in,
        role: identity.role,
        identity: IdentityResponse::from_identity(&identity),
    }))
}

/// Current caller - GET /api/auth/me
/// Built from the request context alone, no database lookup
pub async fn me(CurrentUser(ctx): CurrentUser) -> Json<ContextResponse> {
    Json(ContextResponse::from_context(&ctx))
}

/// Start a password reset - POST /api/users/forgot-password
/// Answers the same whether or not the email exists
pub async fn forgot_password(
    State(state): State<AuthState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AuthApiError> {
    state
        .credentials
        .request_password_reset(payload.email.trim())
        .map_err(|e| {
            error!("Password reset request failed: {}", e);
            AuthApiError::InternalError
        })?;

    Ok(Json(json!({
        "message": "If the email is registered, reset instructions have been sent"
    })))
}

/// Finish a password reset - POST /api/users/reset-password
pub async fn reset_password(
    State(state): State<AuthState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AuthApiError> {
    require_password(&payload.new_password).map_err(|_| AuthApiError::WeakPassword)?;

    let changed = state
        .credentials
        .reset_password(payload.token.trim(), &payload.new_password)
        .map_err(|e| {
            error!("Password reset failed: {}", e);
            AuthApiError::InternalError
        })?;

    if !changed {
        return Err(AuthApiError::InvalidResetToken);
    }

    Ok(Json(json!({ "message": "Password updated" })))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    WeakPassword,
    InvalidResetToken,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 6 characters",
            ),
            AuthApiError::InvalidResetToken => {
                (StatusCode::BAD_REQUEST, "Invalid or expired reset token")
            }
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
