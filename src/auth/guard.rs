//! Authorization Guard
//! Mission: Gate each route on a declared allow-list of roles

use crate::auth::{
    middleware::{extract_context, AuthError},
    models::{AuthContext, Role},
};
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use tracing::debug;

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const STAFF: &[Role] = &[Role::Manager, Role::Admin];
pub const ANY_ROLE: &[Role] = &Role::ALL;

/// Decide whether `ctx` may use a route allowing `allowed`.
pub fn authorize<'a>(
    ctx: Option<&'a AuthContext>,
    allowed: &[Role],
) -> Result<&'a AuthContext, AuthError> {
    let ctx = ctx.ok_or(AuthError::Unauthenticated)?;

    if ctx.has_any_role(allowed) {
        Ok(ctx)
    } else {
        debug!(
            "Denied {} (roles {:?}, allowed {:?})",
            ctx.identity(),
            ctx.roles(),
            allowed
        );
        Err(AuthError::Forbidden)
    }
}

/// Route layer enforcing an allow-list. Runs after `auth_middleware`.
pub async fn require_roles(
    State(allowed): State<&'static [Role]>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(extract_context(&req), allowed)?;
    Ok(next.run(req).await)
}

/// Protect a method router with an allow-list of roles.
///
/// ```ignore
/// .route("/api/users/list", guarded(STAFF, get(list_users)))
/// ```
pub fn guarded<S>(allowed: &'static [Role], route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(allowed, require_roles))
}
