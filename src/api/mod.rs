//! REST API
//!
//! Every entity exposes `/list`, `/list/:id`, `/save`, `/update/:id` and
//! `/delete/:id` under `/api/<entity>`. The token filter runs on every
//! request; per-route role guards are attached with [`guarded`].

pub mod managers;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod restaurants;
pub mod users;

use crate::auth::{
    api as auth_api, auth_middleware, guarded, middleware::AuthError, AuthState, JwtHandler,
    ANY_ROLE,
};
use crate::middleware::request_logging;
use crate::models::ValidationError;
use crate::store::{Database, StoreError};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

/// Build the full application router
pub fn create_router(db: Database, auth_state: AuthState) -> Router {
    let jwt_handler: Arc<JwtHandler> = auth_state.jwt_handler.clone();

    let auth_router = Router::new()
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/me", guarded(ANY_ROLE, get(auth_api::me)))
        .route("/api/users/forgot-password", post(auth_api::forgot_password))
        .route("/api/users/reset-password", post(auth_api::reset_password))
        .with_state(auth_state);

    let entity_routes = Router::new()
        .merge(users::routes())
        .merge(managers::routes())
        .merge(restaurants::routes())
        .merge(menu::category_routes())
        .merge(menu::product_routes())
        .merge(orders::order_routes())
        .merge(orders::item_routes())
        .merge(payments::routes())
        .with_state(AppState { db });

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_router)
        .merge(entity_routes)
        .layer(middleware::from_fn_with_state(jwt_handler, auth_middleware))
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Auth(AuthError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::InvalidReference(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.0)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Auth(err) => return err.into_response(),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// 404 for a missing record, in the shape every `list/:id` handler returns
pub(crate) fn not_found(entity: &str, id: i64) -> ApiError {
    ApiError::NotFound(format!("{} {} not found", entity, id))
}

/// 204 when something was removed, 404 otherwise
pub(crate) fn deleted(removed: bool, entity: &str, id: i64) -> Result<StatusCode, ApiError> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(entity, id))
    }
}
