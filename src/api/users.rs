//! Customer account endpoints - /api/users

use super::{deleted, not_found, ApiError, AppState};
use crate::auth::{
    guarded, middleware::AuthError, AuthContext, CurrentUser, MaybeUser, Role, ANY_ROLE,
    STAFF,
};
use crate::models::{User, UserInput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, warn};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/list", guarded(STAFF, get(list_users)))
        .route("/api/users/list/:id", guarded(STAFF, get(get_user)))
        .route("/api/users/save", post(save_user))
        .route("/api/users/update/:id", guarded(ANY_ROLE, put(update_user)))
        .route("/api/users/delete/:id", guarded(STAFF, delete(delete_user)))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.db.list_users()?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    state
        .db
        .get_user(id)?
        .map(Json)
        .ok_or_else(|| not_found("User", id))
}

/// Public sign-up. Only staff may pick a role; everyone else becomes CLIENT.
async fn save_user(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Json(mut input): Json<UserInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    input.validate()?;

    match caller {
        Some(ref c) if c.is_staff() => forbid_admin_grant(c, &input)?,
        _ => {
            if input.role.is_some_and(|r| r != Role::Client) {
                warn!("Ignoring requested role {:?} on self sign-up", input.role);
            }
            input.role = Some(Role::Client);
        }
    }

    let user = state.db.create_user(&input)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Staff may update anyone. A CLIENT may only update their own record and
/// never its role.
async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Json(mut input): Json<UserInput>,
) -> Result<Json<User>, ApiError> {
    input.validate()?;

    if !caller.is_staff() {
        let existing = state.db.get_user(id)?.ok_or_else(|| not_found("User", id))?;
        if existing.email != caller.identity() {
            warn!("{} tried to update user {}", caller.identity(), id);
            return Err(AuthError::Forbidden.into());
        }
        input.role = None;
    } else {
        forbid_admin_grant(&caller, &input)?;
    }

    let user = state.db.update_user(id, &input)?;
    info!("✏️  User {} updated by {}", id, caller.identity());
    Ok(Json(user))
}

/// Only an ADMIN hands out ADMIN
fn forbid_admin_grant(caller: &AuthContext, input: &UserInput) -> Result<(), ApiError> {
    if input.role == Some(Role::Admin) && !caller.has_role(Role::Admin) {
        warn!("{} tried to grant ADMIN to {}", caller.identity(), input.email);
        return Err(AuthError::Forbidden.into());
    }
    Ok(())
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_user(id)?, "User", id)
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{send, test_app, token_for};
    use crate::auth::Role;
    use axum::http::StatusCode;
    use serde_json::json;

    fn sign_up(email: &str) -> serde_json::Value {
        json!({
            "name": "Carla",
            "email": email,
            "password": "cliente1",
            "cpf": "123.456.789-00",
            "role": "ADMIN"
        })
    }

    #[tokio::test]
    async fn test_sign_up_with_staff_email_conflicts() {
        let (app, db, _) = test_app();
        db.ensure_admin("Admin", "admin@totem.local", "admin123").unwrap();

        let (status, body) =
            send(&app, "POST", "/api/users/save", None, Some(sign_up("admin@totem.local"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "E-mail already registered");
        assert!(db.find_user_by_email("admin@totem.local").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_anonymous_sign_up_is_forced_to_client() {
        let (app, _, _) = test_app();

        let (status, body) =
            send(&app, "POST", "/api/users/save", None, Some(sign_up("carla@example.com"))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "CLIENT");
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_cpf_conflicts() {
        let (app, _, _) = test_app();
        send(&app, "POST", "/api/users/save", None, Some(sign_up("carla@example.com"))).await;

        let (status, body) =
            send(&app, "POST", "/api/users/save", None, Some(sign_up("outra@example.com"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CPF already registered");
    }

    #[tokio::test]
    async fn test_listing_users_requires_staff() {
        let (app, _, jwt) = test_app();
        let client = token_for(&jwt, "carla@example.com", Role::Client);
        let manager = token_for(&jwt, "alice@example.com", Role::Manager);

        let (status, _) = send(&app, "GET", "/api/users/list", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/users/list", Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, "GET", "/api/users/list", Some(&manager), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_client_updates_only_own_record() {
        let (app, _, jwt) = test_app();
        let (_, carla) =
            send(&app, "POST", "/api/users/save", None, Some(sign_up("carla@example.com"))).await;
        let mut other = sign_up("davi@example.com");
        other["cpf"] = json!("987.654.321-00");
        let (_, davi) = send(&app, "POST", "/api/users/save", None, Some(other)).await;

        let carla_token = token_for(&jwt, "carla@example.com", Role::Client);
        let mut change = sign_up("carla@example.com");
        change["name"] = json!("Carla Dias");

        let uri = format!("/api/users/update/{}", carla["id"]);
        let (status, body) = send(&app, "PUT", &uri, Some(&carla_token), Some(change.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Carla Dias");
        assert_eq!(body["role"], "CLIENT");

        let uri = format!("/api/users/update/{}", davi["id"]);
        let (status, _) = send(&app, "PUT", &uri, Some(&carla_token), Some(change)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_only_admin_grants_admin_role() {
        let (app, _, jwt) = test_app();
        let manager = token_for(&jwt, "alice@example.com", Role::Manager);
        let admin = token_for(&jwt, "admin@totem.local", Role::Admin);

        let (status, _) = send(
            &app,
            "POST",
            "/api/users/save",
            Some(&manager),
            Some(sign_up("carla@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut staff = sign_up("carla@example.com");
        staff["role"] = json!("MANAGER");
        let (status, carla) =
            send(&app, "POST", "/api/users/save", Some(&manager), Some(staff)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(carla["role"], "MANAGER");

        let uri = format!("/api/users/update/{}", carla["id"]);
        let (status, _) =
            send(&app, "PUT", &uri, Some(&manager), Some(sign_up("carla@example.com"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            send(&app, "PUT", &uri, Some(&admin), Some(sign_up("carla@example.com"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "ADMIN");
    }

    #[tokio::test]
    async fn test_delete_user_then_404() {
        let (app, _, jwt) = test_app();
        let admin = token_for(&jwt, "admin@totem.local", Role::Admin);
        let (_, carla) =
            send(&app, "POST", "/api/users/save", None, Some(sign_up("carla@example.com"))).await;

        let uri = format!("/api/users/delete/{}", carla["id"]);
        let (status, _) = send(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let uri = format!("/api/users/list/{}", carla["id"]);
        let (status, _) = send(&app, "GET", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
