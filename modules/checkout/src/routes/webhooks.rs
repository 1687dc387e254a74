use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{parse_gateway, ApiError, AppState};
use crate::models::{ErrorResponse, Gateway};
use crate::webhook::{NotificationError, SignatureScheme, WebhookNotification};

/// GET /api/{gateway}/webhook - liveness check for the gateway dashboard
pub async fn webhook_status(Path(gateway): Path<String>) -> Result<Json<Value>, ApiError> {
    let gateway = parse_gateway(&gateway)?;
    Ok(status_payload(gateway))
}

/// GET /api/coingate/callback
pub async fn coingate_callback_status() -> Json<Value> {
    status_payload(Gateway::CoinGate)
}

fn status_payload(gateway: Gateway) -> Json<Value> {
    Json(json!({ "status": "active", "gateway": gateway.as_str() }))
}

/// POST /api/{gateway}/webhook
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let gateway = parse_gateway(&gateway)?;
    handle_notification(&state, gateway, &headers, body).await
}

/// POST /api/coingate/callback
pub async fn receive_coingate_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    handle_notification(&state, Gateway::CoinGate, &headers, body).await
}

async fn handle_notification(
    state: &AppState,
    gateway: Gateway,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let counter = |result: &str| {
        state
            .metrics
            .webhooks_total
            .with_label_values(&[gateway.as_str(), result])
            .inc();
    };

    // Verify against the raw bytes before anything parses them.
    let scheme = SignatureScheme::for_gateway(gateway);
    let signature = headers
        .get(scheme.header())
        .and_then(|v| v.to_str().ok());

    if !scheme.verify(&body, signature, state.webhook_secret(gateway)) {
        counter("invalid_signature");
        tracing::warn!(
            gateway = %gateway,
            header = scheme.header(),
            signature_present = signature.is_some(),
            "Webhook signature verification failed"
        );
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid signature")),
        ));
    }
    let signature = signature.unwrap_or_default().to_string();

    let notification = WebhookNotification::parse(gateway, body, signature).map_err(|e| {
        counter("malformed");
        tracing::error!(gateway = %gateway, error = %e, "Failed to parse webhook");
        let message = match &e {
            NotificationError::MalformedJson(_) => "Malformed JSON",
            NotificationError::MissingField(_) => "Missing required field",
        };
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details(message, e.to_string())),
        )
    })?;

    tracing::info!(
        gateway = %gateway,
        order_id = %notification.order_id,
        status = %notification.status,
        "Webhook received"
    );

    match state.reconciler.reconcile(&notification).await {
        Ok(status) => {
            counter(status.as_str());
            Ok(Json(json!({
                "status": "ok",
                "received_status": notification.status,
            })))
        }
        Err(e) => {
            counter("error");
            tracing::error!(
                gateway = %gateway,
                order_id = %notification.order_id,
                error = %e,
                "Webhook processing failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Webhook processing failed")),
            ))
        }
    }
}
