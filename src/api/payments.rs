//! Payment endpoints - /api/payments

use super::{deleted, not_found, ApiError, AppState};
use crate::auth::{guarded, ANY_ROLE, STAFF};
use crate::models::{Payment, PaymentInput};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/list", guarded(STAFF, get(list_payments)))
        .route("/api/payments/list/:id", guarded(STAFF, get(get_payment)))
        .route("/api/payments/save", guarded(ANY_ROLE, post(save_payment)))
        .route("/api/payments/update/:id", guarded(STAFF, put(update_payment)))
        .route("/api/payments/delete/:id", guarded(STAFF, delete(delete_payment)))
}

async fn list_payments(State(state): State<AppState>) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.db.list_payments()?))
}

async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Payment>, ApiError> {
    state
        .db
        .get_payment(id)?
        .map(Json)
        .ok_or_else(|| not_found("Payment", id))
}

async fn save_payment(
    State(state): State<AppState>,
    Json(input): Json<PaymentInput>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    input.validate()?;
    let payment = state.db.create_payment(&input)?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PaymentInput>,
) -> Result<Json<Payment>, ApiError> {
    input.validate()?;
    Ok(Json(state.db.update_payment(id, &input)?))
}

async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    deleted(state.db.delete_payment(id)?, "Payment", id)
}
