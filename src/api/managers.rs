//! Staff account endpoints - /api/managers

use super::{deleted, not_found, ApiError, AppState};
use crate::auth::{
    guarded, middleware::AuthError, CurrentUser, Role, ADMIN_ONLY, ANY_ROLE, STAFF,
};
use crate::models::{Manager, ManagerInput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, warn};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/managers/list", guarded(ANY_ROLE, get(list_managers)))
        .route("/api/managers/list/:id", guarded(ANY_ROLE, get(get_manager)))
        .route("/api/managers/save", guarded(ADMIN_ONLY, post(save_manager)))
        .route("/api/managers/update/:id", guarded(STAFF, put(update_manager)))
        .route("/api/managers/delete/:id", guarded(ADMIN_ONLY, delete(delete_manager)))
}

async fn list_managers(State(state): State<AppState>) -> Result<Json<Vec<Manager>>, ApiError> {
    Ok(Json(state.db.list_managers()?))
}

async fn get_manager(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Manager>, ApiError> {
    state
        .db
        .get_manager(id)?
        .map(Json)
        .ok_or_else(|| not_found("Manager", id))
}

async fn save_manager(
    State(state): State<AppState>,
    Json(input): Json<ManagerInput>,
) -> Result<(StatusCode, Json<Manager>), ApiError> {
    input.validate()?;
    let manager = state.db.create_manager(&input)?;
    Ok((StatusCode::CREATED, Json(manager)))
}

/// An ADMIN may update any manager. A MANAGER may only update their own
/// record and never its role.
async fn update_manager(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Json(mut input): Json<ManagerInput>,
) -> Result<Json<Manager>, ApiError> {
    input.validate()?;

    if !caller.has_role(Role::Admin) {
        let existing = state
            .db
            .get_manager(id)?
            .ok_or_else(|| not_found("Manager", id))?;
        if existing.email != caller.identity() {
            warn!("{} tried to update manager {}", caller.identity(), id);
            return Err(AuthError::Forbidden.into());
        }
        if input.role.is_some_and(|r| r != existing.role) {
            warn!("Ignoring role change requested by {}", caller.identity());
        }
        input.role = None;
    }

    let manager = state.db.update_manager(id, &input)?;
    info!("✏️  Manager {} updated by {}", id, caller.identity());
    Ok(Json(manager))
}

async fn delete_manager(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_manager(id)?, "Manager", id)
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{send, test_app, token_for};
    use crate::auth::Role;
    use axum::http::StatusCode;
    use serde_json::json;

    fn bruno() -> serde_json::Value {
        json!({
            "name": "Bruno",
            "email": "bruno@example.com",
            "password": "gerente1"
        })
    }

    #[tokio::test]
    async fn test_only_admin_creates_managers() {
        let (app, _, jwt) = test_app();
        let manager = token_for(&jwt, "alice@example.com", Role::Manager);
        let admin = token_for(&jwt, "admin@totem.local", Role::Admin);

        let (status, _) =
            send(&app, "POST", "/api/managers/save", Some(&manager), Some(bruno())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            send(&app, "POST", "/api/managers/save", Some(&admin), Some(bruno())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "MANAGER");

        let (status, _) =
            send(&app, "POST", "/api/managers/save", Some(&admin), Some(bruno())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_manager_validation() {
        let (app, _, jwt) = test_app();
        let admin = token_for(&jwt, "admin@totem.local", Role::Admin);

        let mut blank = bruno();
        blank["name"] = json!("   ");
        let (status, _) = send(&app, "POST", "/api/managers/save", Some(&admin), Some(blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut missing_restaurant = bruno();
        missing_restaurant["restaurantId"] = json!(42);
        let (status, _) = send(
            &app,
            "POST",
            "/api/managers/save",
            Some(&admin),
            Some(missing_restaurant),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_manager_cannot_promote_itself() {
        let (app, _, jwt) = test_app();
        let admin = token_for(&jwt, "admin@totem.local", Role::Admin);
        let (_, created) =
            send(&app, "POST", "/api/managers/save", Some(&admin), Some(bruno())).await;
        let uri = format!("/api/managers/update/{}", created["id"]);

        let own = token_for(&jwt, "bruno@example.com", Role::Manager);
        let mut promote = bruno();
        promote["name"] = json!("Bruno Lima");
        promote["role"] = json!("ADMIN");
        let (status, body) = send(&app, "PUT", &uri, Some(&own), Some(promote.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Bruno Lima");
        assert_eq!(body["role"], "MANAGER");

        // Another manager may not touch bruno at all
        let other = token_for(&jwt, "alice@example.com", Role::Manager);
        let (status, _) = send(&app, "PUT", &uri, Some(&other), Some(bruno())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, "PUT", &uri, Some(&admin), Some(promote)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "ADMIN");
    }

    #[tokio::test]
    async fn test_manager_email_taken_by_user_conflicts() {
        let (app, _, jwt) = test_app();
        let admin = token_for(&jwt, "admin@totem.local", Role::Admin);
        let (status, _) = send(
            &app,
            "POST",
            "/api/users/save",
            None,
            Some(json!({ "name": "Bruno", "email": "bruno@example.com", "password": "cliente1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) =
            send(&app, "POST", "/api/managers/save", Some(&admin), Some(bruno())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "E-mail already registered");
    }

    #[tokio::test]
    async fn test_client_may_read_managers() {
        let (app, _, jwt) = test_app();
        let client = token_for(&jwt, "carla@example.com", Role::Client);

        let (status, _) = send(&app, "GET", "/api/managers/list", Some(&client), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/api/managers/list/9", Some(&client), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
