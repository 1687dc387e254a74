use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::models::ErrorResponse;
use crate::order_id::OrderId;
use crate::orders::OrderRecord;

/// GET /api/orders/{order_id} - snapshot for the success/return/cancelled pages
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderRecord>, ApiError> {
    state
        .orders
        .get(&OrderId::new(order_id))
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Order not found"))))
}
