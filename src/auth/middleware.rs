//! Authentication Middleware
//! Mission: Turn a bearer token into a per-request authenticated context

use crate::auth::{
    jwt::JwtHandler,
    models::AuthContext,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the token filter decided for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// No usable token; later stages decide whether anonymous access is fine
    Anonymous,
    /// A context was already attached; left untouched
    AlreadyAuthenticated,
    Authenticated(AuthContext),
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Single-pass token filter decision.
///
/// Malformed tokens fall through as anonymous, while a well-signed but expired
/// token is a hard `ExpiredToken` failure.
pub fn authenticate(
    jwt_handler: &JwtHandler,
    headers: &HeaderMap,
    existing: Option<&AuthContext>,
) -> Result<FilterOutcome, AuthError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(FilterOutcome::Anonymous);
    };

    let claims = match jwt_handler.decode_claims(token) {
        Ok(claims) => claims,
        Err(_) => {
            debug!("Unreadable bearer token, continuing anonymously");
            return Ok(FilterOutcome::Anonymous);
        }
    };

    if existing.is_some() {
        return Ok(FilterOutcome::AlreadyAuthenticated);
    }

    if jwt_handler.is_expired(&claims) {
        warn!("Rejected expired token for {}", claims.sub);
        return Err(AuthError::ExpiredToken);
    }

    Ok(FilterOutcome::Authenticated(AuthContext::from_claims(&claims)))
}

/// Token filter applied to every route. Never rejects anonymous requests.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let outcome = authenticate(&jwt_handler, req.headers(), extract_context(&req))?;

    let FilterOutcome::Authenticated(ctx) = outcome else {
        return Ok(next.run(req).await);
    };

    debug!("Authenticated {} as {:?}", ctx.identity(), ctx.roles());
    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).await;
    response.extensions_mut().insert(ctx);
    Ok(response)
}

/// Extract the context from a request (use after auth middleware)
pub fn extract_context(req: &Request) -> Option<&AuthContext> {
    req.extensions().get::<AuthContext>()
}

/// Extractor for handlers that need the caller. Rejects anonymous requests.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Like `CurrentUser` but anonymous requests yield `None`
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthContext>().cloned()))
    }
}

/// Auth error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    ExpiredToken,
    Unauthenticated,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::ExpiredToken => (StatusCode::UNAUTHORIZED, "Expired Token"),
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
