//! Order endpoints - /api/orders and /api/order-items

use super::{deleted, not_found, ApiError, AppState};
use crate::auth::{guarded, ANY_ROLE, STAFF};
use crate::models::{Order, OrderInput, OrderItem, OrderItemInput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders/list", guarded(STAFF, get(list_orders)))
        .route("/api/orders/list/:id", guarded(ANY_ROLE, get(get_order)))
        .route("/api/orders/save", guarded(ANY_ROLE, post(save_order)))
        .route("/api/orders/update/:id", guarded(STAFF, put(update_order)))
        .route("/api/orders/delete/:id", guarded(STAFF, delete(delete_order)))
}

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/api/order-items/list", guarded(STAFF, get(list_items)))
        .route("/api/order-items/list/:id", guarded(ANY_ROLE, get(get_item)))
        .route("/api/order-items/save", guarded(ANY_ROLE, post(save_item)))
        .route("/api/order-items/update/:id", guarded(STAFF, put(update_item)))
        .route("/api/order-items/delete/:id", guarded(STAFF, delete(delete_item)))
}

// ===== Orders =====

async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.db.list_orders()?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    state
        .db
        .get_order(id)?
        .map(Json)
        .ok_or_else(|| not_found("Order", id))
}

async fn save_order(
    State(state): State<AppState>,
    Json(input): Json<OrderInput>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    input.validate()?;
    let order = state.db.create_order(&input)?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<OrderInput>,
) -> Result<Json<Order>, ApiError> {
    input.validate()?;
    Ok(Json(state.db.update_order(id, &input)?))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_order(id)?, "Order", id)
}

// ===== Order items =====

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<OrderItem>>, ApiError> {
    Ok(Json(state.db.list_order_items()?))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderItem>, ApiError> {
    state
        .db
        .get_order_item(id)?
        .map(Json)
        .ok_or_else(|| not_found("Order item", id))
}

async fn save_item(
    State(state): State<AppState>,
    Json(input): Json<OrderItemInput>,
) -> Result<(StatusCode, Json<OrderItem>), ApiError> {
    input.validate()?;
    let item = state.db.create_order_item(&input)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<OrderItemInput>,
) -> Result<Json<OrderItem>, ApiError> {
    input.validate()?;
    Ok(Json(state.db.update_order_item(id, &input)?))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_order_item(id)?, "Order item", id)
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{send, test_app, token_for};
    use crate::auth::Role;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_client_places_order_with_items() {
        let (app, _, jwt) = test_app();
        let client = token_for(&jwt, "carla@example.com", Role::Client);
        let manager = token_for(&jwt, "alice@example.com", Role::Manager);

        let (_, carla) = send(
            &app,
            "POST",
            "/api/users/save",
            None,
            Some(json!({ "name": "Carla", "email": "carla@example.com", "password": "cliente1" })),
        )
        .await;

        let (status, order) = send(
            &app,
            "POST",
            "/api/orders/save",
            Some(&client),
            Some(json!({ "name": "Mesa 4", "price": 23.0, "userId": carla["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, item) = send(
            &app,
            "POST",
            "/api/order-items/save",
            Some(&client),
            Some(json!({ "name": "Cappuccino", "price": 11.5, "quantity": 2, "orderId": order["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["status"], "PENDING");

        let uri = format!("/api/orders/list/{}", order["id"]);
        let (status, _) = send(&app, "GET", &uri, Some(&client), None).await;
        assert_eq!(status, StatusCode::OK);

        // Listing every order is staff-only
        let (status, _) = send(&app, "GET", "/api/orders/list", Some(&client), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = send(&app, "GET", "/api/order-items/list", Some(&manager), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_for_unknown_user_is_bad_request() {
        let (app, _, jwt) = test_app();
        let client = token_for(&jwt, "carla@example.com", Role::Client);

        let (status, _) = send(
            &app,
            "POST",
            "/api/orders/save",
            Some(&client),
            Some(json!({ "name": "Mesa 1", "price": 5.0, "userId": 77 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_anonymous_cannot_order() {
        let (app, _, _) = test_app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/orders/save",
            None,
            Some(json!({ "name": "Mesa 1", "price": 5.0, "userId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }
}
