use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::{parse_gateway, ApiError, AppState};
use crate::models::{CreatePaymentRequest, CreatePaymentResponse, ErrorResponse, Gateway, Offer};

/// GET /api/offers
pub async fn list_offers(State(state): State<Arc<AppState>>) -> Json<Vec<Offer>> {
    Json(state.catalog.offers().to_vec())
}

/// POST /api/{gateway}/create-payment
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Path(gateway): Path<String>,
    body: Bytes,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    let gateway = parse_gateway(&gateway)?;
    create_payment_for(&state, gateway, &body).await
}

/// POST /api/cryptomus/create-invoice
pub async fn create_cryptomus_invoice(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    create_payment_for(&state, Gateway::Cryptomus, &body).await
}

/// POST /api/coingate/create-order
pub async fn create_coingate_order(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    create_payment_for(&state, Gateway::CoinGate, &body).await
}

async fn create_payment_for(
    state: &AppState,
    gateway: Gateway,
    body: &[u8],
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    let counter = |result: &str| {
        state
            .metrics
            .payments_created_total
            .with_label_values(&[gateway.as_str(), result])
            .inc();
    };

    let request: CreatePaymentRequest = serde_json::from_slice(body).map_err(|e| {
        counter("validation");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Invalid request body", e.to_string())),
        )
    })?;

    let intent = state
        .intents
        .build_from_request(&state.catalog, &request, gateway)
        .map_err(|e| {
            counter("validation");
            tracing::info!(gateway = %gateway, error = %e, "Checkout validation failed");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details("Validation failed", e.to_string())),
            )
        })?;

    if state.orders.is_taken(&intent.order_id) {
        counter("conflict");
        tracing::warn!(gateway = %gateway, order_id = %intent.order_id, "Order id reused");
        return Err(order_conflict());
    }

    let adapter = state.gateways.get(gateway).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Payment gateway not enabled")),
        )
    })?;

    let response = adapter.create_payment(&intent).await.map_err(|e| {
        counter(e.kind());
        // Full gateway error stays in the logs; the client gets the kind only.
        tracing::error!(
            gateway = %gateway,
            order_id = %intent.order_id,
            error = %e,
            "Payment creation failed"
        );
        if e.is_auth_rejection() {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Payment provider rejected credentials")),
            )
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details("Failed to create payment", e.kind())),
            )
        }
    })?;

    // A concurrent checkout can claim the same id while the gateway call is in flight.
    state
        .orders
        .record_created(gateway, &intent, &response)
        .map_err(|e| {
            counter("conflict");
            tracing::error!(
                gateway = %gateway,
                error = %e,
                payment_id = ?response.payment_id,
                "Gateway payment created for an order id that was taken meanwhile"
            );
            order_conflict()
        })?;
    counter("success");

    tracing::info!(
        gateway = %gateway,
        order_id = %response.order_id,
        payment_id = ?response.payment_id,
        "Payment created"
    );

    Ok(Json(CreatePaymentResponse {
        success: response.success,
        payment_url: response.payment_url,
        payment_id: response.payment_id,
        order_id: response.order_id,
        amount: intent.amount,
        currency: intent.currency,
    }))
}

fn order_conflict() -> ApiError {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse::new("Order already exists")),
    )
}
