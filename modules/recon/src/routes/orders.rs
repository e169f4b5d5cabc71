//! Order endpoints: creation, purchase initiation, lookup

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CreateOrderRequest, Order};
use crate::routes::{ledger_error_response, ApiError, AppState};
use crate::services::order_service;

/// Response for POST /api/orders/{id}/purchase
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub status: &'static str,
    pub order: Order,
}

/// Handler for POST /api/orders
///
/// One order per cart snapshot; a duplicate create is rejected with 409.
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = order_service::create_order(
        state.store.as_ref(),
        body.user_id,
        body.cart_id,
        body.amount_minor,
    )
    .await
    .map_err(ledger_error_response)?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for POST /api/orders/{order_id}/purchase
///
/// Starts the purchase (pending -> initiated). If the order is already
/// initiated or paid the guard fires and the current state is reported as
/// `already_processed` — starting a purchase twice is not an error.
pub async fn begin_purchase(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let transition = order_service::begin_purchase(state.store.as_ref(), order_id)
        .await
        .map_err(ledger_error_response)?;

    let status = if transition.transitioned {
        "initiated"
    } else {
        "already_processed"
    };

    Ok(Json(PurchaseResponse {
        status,
        order: transition.order,
    }))
}

/// Handler for GET /api/orders/{order_id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = order_service::get_order(state.store.as_ref(), order_id)
        .await
        .map_err(ledger_error_response)?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "order_not_found"))?;

    Ok(Json(order))
}
