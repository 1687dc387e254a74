pub mod catalog;
pub mod config;
pub mod gateways;
pub mod intent;
pub mod metrics;
pub mod models;
pub mod order_id;
pub mod orders;
pub mod reconcile;
pub mod routes;
pub mod webhook;

pub use catalog::Catalog;
pub use config::Config;
pub use gateways::{GatewayAdapter, GatewayError, GatewayRegistry};
pub use intent::{IntentBuilder, ValidationError};
pub use models::{CustomerInfo, Gateway, GatewayResponse, Offer, PaymentIntent, PaymentMethodHint};
pub use order_id::{generate_order_id, OrderId};
pub use orders::{OrderRecord, OrderStore};
pub use reconcile::{CanonicalPaymentStatus, Fulfillment, LoggingFulfillment, Reconciler};
pub use routes::{router, AppState};
pub use webhook::{SignatureScheme, WebhookNotification};

use std::sync::Arc;

/// Wire the service together from configuration.
pub fn build_state(
    config: Config,
    fulfillment: Arc<dyn Fulfillment>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let gateways = GatewayRegistry::from_config(&config)?;
    let orders = OrderStore::new();

    Ok(AppState {
        intents: IntentBuilder::new(config.public_base_url.clone()),
        catalog: Catalog::default(),
        gateways,
        reconciler: Reconciler::new(orders.clone(), fulfillment),
        orders,
        metrics: metrics::Metrics::new()?,
        config,
    })
}
