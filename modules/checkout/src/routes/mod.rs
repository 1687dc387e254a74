pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod webhooks;

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::gateways::GatewayRegistry;
use crate::intent::IntentBuilder;
use crate::metrics::Metrics;
use crate::models::{ErrorResponse, Gateway};
use crate::orders::OrderStore;
use crate::reconcile::Reconciler;

/// Shared, read-mostly state behind every handler.
pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
    pub intents: IntentBuilder,
    pub gateways: GatewayRegistry,
    pub orders: OrderStore,
    pub reconciler: Reconciler,
    pub metrics: Metrics,
}

impl AppState {
    /// Secret used to verify notifications from `gateway`.
    pub fn webhook_secret(&self, gateway: Gateway) -> Option<&str> {
        match gateway {
            Gateway::Atlos => self.config.atlos.webhook_secret.as_deref(),
            Gateway::Cryptomus => self.config.cryptomus.api_key.as_deref(),
            Gateway::CoinGate => self.config.coingate.webhook_secret.as_deref(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Resolve the `{gateway}` path segment, 404 for anything unsupported.
pub(crate) fn parse_gateway(raw: &str) -> Result<Gateway, ApiError> {
    raw.parse::<Gateway>().map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::with_details("Unknown payment gateway", e)),
        )
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health/live", get(health::health_live))
        .route("/api/health", get(health::health))
        .route("/metrics", get(metrics::metrics))
        .route("/api/offers", get(payments::list_offers))
        .route("/api/{gateway}/create-payment", post(payments::create_payment))
        .route("/api/cryptomus/create-invoice", post(payments::create_cryptomus_invoice))
        .route("/api/coingate/create-order", post(payments::create_coingate_order))
        .route(
            "/api/{gateway}/webhook",
            post(webhooks::receive_webhook).get(webhooks::webhook_status),
        )
        .route(
            "/api/coingate/callback",
            post(webhooks::receive_coingate_callback).get(webhooks::coingate_callback_status),
        )
        .route("/api/orders/{order_id}", get(orders::get_order))
        .layer(from_fn_with_state(state.clone(), metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
