//! Menu endpoints - /api/menu-categories and /api/products

use super::{deleted, not_found, ApiError, AppState};
use crate::auth::{guarded, STAFF};
use crate::models::{MenuCategory, MenuCategoryInput, Product, ProductInput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/api/menu-categories/list", get(list_categories))
        .route("/api/menu-categories/list/:id", get(get_category))
        .route("/api/menu-categories/save", guarded(STAFF, post(save_category)))
        .route("/api/menu-categories/update/:id", guarded(STAFF, put(update_category)))
        .route("/api/menu-categories/delete/:id", guarded(STAFF, delete(delete_category)))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products/list", get(list_products))
        .route("/api/products/list/:id", get(get_product))
        .route("/api/products/save", guarded(STAFF, post(save_product)))
        .route("/api/products/update/:id", guarded(STAFF, put(update_product)))
        .route("/api/products/delete/:id", guarded(STAFF, delete(delete_product)))
}

// ===== Categories =====

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<MenuCategory>>, ApiError> {
    Ok(Json(state.db.list_menu_categories()?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MenuCategory>, ApiError> {
    state
        .db
        .get_menu_category(id)?
        .map(Json)
        .ok_or_else(|| not_found("Menu category", id))
}

async fn save_category(
    State(state): State<AppState>,
    Json(input): Json<MenuCategoryInput>,
) -> Result<(StatusCode, Json<MenuCategory>), ApiError> {
    input.validate()?;
    let category = state.db.create_menu_category(&input)?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<MenuCategoryInput>,
) -> Result<Json<MenuCategory>, ApiError> {
    input.validate()?;
    Ok(Json(state.db.update_menu_category(id, &input)?))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_menu_category(id)?, "Menu category", id)
}

// ===== Products =====

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.db.list_products()?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    state
        .db
        .get_product(id)?
        .map(Json)
        .ok_or_else(|| not_found("Product", id))
}

async fn save_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    input.validate()?;
    let product = state.db.create_product(&input)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    input.validate()?;
    Ok(Json(state.db.update_product(id, &input)?))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_product(id)?, "Product", id)
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{send, test_app, token_for};
    use crate::auth::Role;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_menu_flow() {
        let (app, _, jwt) = test_app();
        let admin = token_for(&jwt, "admin@totem.local", Role::Admin);
        let manager = token_for(&jwt, "alice@example.com", Role::Manager);

        let (_, restaurant) = send(
            &app,
            "POST",
            "/api/restaurants/save",
            Some(&admin),
            Some(json!({ "name": "Totem Café" })),
        )
        .await;

        let (status, category) = send(
            &app,
            "POST",
            "/api/menu-categories/save",
            Some(&manager),
            Some(json!({ "name": "Cafés", "restaurantId": restaurant["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, product) = send(
            &app,
            "POST",
            "/api/products/save",
            Some(&manager),
            Some(json!({
                "name": "Cappuccino",
                "price": 11.5,
                "ingredients": ["espresso", "milk", "cocoa"],
                "menuCategoryId": category["id"],
                "restaurantId": restaurant["id"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["ingredients"], json!(["espresso", "milk", "cocoa"]));

        // Anyone can browse the menu
        let (status, body) = send(&app, "GET", "/api/products/list", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_client_cannot_edit_menu() {
        let (app, _, jwt) = test_app();
        let client = token_for(&jwt, "carla@example.com", Role::Client);

        let (status, _) = send(
            &app,
            "POST",
            "/api/products/save",
            Some(&client),
            Some(json!({ "name": "Free coffee", "price": 0.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_category_for_missing_restaurant() {
        let (app, _, jwt) = test_app();
        let manager = token_for(&jwt, "alice@example.com", Role::Manager);

        let (status, body) = send(
            &app,
            "POST",
            "/api/menu-categories/save",
            Some(&manager),
            Some(json!({ "name": "Doces", "restaurantId": 404 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "restaurants 404 does not exist");
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let (app, _, jwt) = test_app();
        let manager = token_for(&jwt, "alice@example.com", Role::Manager);

        let (status, _) = send(
            &app,
            "POST",
            "/api/products/save",
            Some(&manager),
            Some(json!({ "name": "Refund", "price": -1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
