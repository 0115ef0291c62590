//! Restaurant endpoints - /api/restaurants

use super::{deleted, not_found, ApiError, AppState};
use crate::auth::{guarded, ADMIN_ONLY, STAFF};
use crate::models::{Restaurant, RestaurantInput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/restaurants/list", get(list_restaurants))
        .route("/api/restaurants/list/:id", get(get_restaurant))
        .route("/api/restaurants/save", guarded(ADMIN_ONLY, post(save_restaurant)))
        .route("/api/restaurants/update/:id", guarded(STAFF, put(update_restaurant)))
        .route("/api/restaurants/delete/:id", guarded(ADMIN_ONLY, delete(delete_restaurant)))
}

async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Restaurant>>, ApiError> {
    Ok(Json(state.db.list_restaurants()?))
}

async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Restaurant>, ApiError> {
    state
        .db
        .get_restaurant(id)?
        .map(Json)
        .ok_or_else(|| not_found("Restaurant", id))
}

async fn save_restaurant(
    State(state): State<AppState>,
    Json(input): Json<RestaurantInput>,
) -> Result<(StatusCode, Json<Restaurant>), ApiError> {
    input.validate()?;
    let restaurant = state.db.create_restaurant(&input)?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<RestaurantInput>,
) -> Result<Json<Restaurant>, ApiError> {
    input.validate()?;
    Ok(Json(state.db.update_restaurant(id, &input)?))
}

async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_restaurant(id)?, "Restaurant", id)
}
