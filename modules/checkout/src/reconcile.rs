use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::models::Gateway;
use crate::order_id::OrderId;
use crate::orders::OrderStore;
use crate::webhook::WebhookNotification;

/// Gateway-independent payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalPaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Unknown,
}

impl CanonicalPaymentStatus {
    pub fn from_gateway(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "completed" | "confirmed" | "paid" | "paid_over" => CanonicalPaymentStatus::Confirmed,
            "failed" => CanonicalPaymentStatus::Failed,
            "pending" => CanonicalPaymentStatus::Pending,
            _ => CanonicalPaymentStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalPaymentStatus::Pending => "pending",
            CanonicalPaymentStatus::Confirmed => "confirmed",
            CanonicalPaymentStatus::Failed => "failed",
            CanonicalPaymentStatus::Unknown => "unknown",
        }
    }
}

#[derive(Error, Debug)]
#[error("Fulfillment failed for order {order_id}: {reason}")]
pub struct FulfillmentError {
    pub order_id: OrderId,
    pub reason: String,
}

/// What a fulfillment collaborator is told about a paid order.
#[derive(Debug, Clone)]
pub struct ConfirmedPayment {
    pub gateway: Gateway,
    pub order_id: OrderId,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub tx_hash: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Course delivery side effects (access, emails, community invites).
///
/// Called at most once per order id by [`Reconciler`].
#[async_trait]
pub trait Fulfillment: Send + Sync {
    async fn fulfill(&self, payment: &ConfirmedPayment) -> Result<(), FulfillmentError>;
}

/// Default collaborator: records the confirmed payment in the log.
pub struct LoggingFulfillment;

#[async_trait]
impl Fulfillment for LoggingFulfillment {
    async fn fulfill(&self, payment: &ConfirmedPayment) -> Result<(), FulfillmentError> {
        tracing::info!(
            gateway = %payment.gateway,
            order_id = %payment.order_id,
            amount = ?payment.amount,
            currency = ?payment.currency,
            tx_hash = ?payment.tx_hash,
            "Payment confirmed, fulfillment requested"
        );
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Fulfillment(#[from] FulfillmentError),
}

/// Maps verified notifications onto orders and triggers fulfillment.
#[derive(Clone)]
pub struct Reconciler {
    orders: OrderStore,
    fulfillment: Arc<dyn Fulfillment>,
}

impl Reconciler {
    pub fn new(orders: OrderStore, fulfillment: Arc<dyn Fulfillment>) -> Self {
        Self {
            orders,
            fulfillment,
        }
    }

    /// Only call this with notifications whose signature has been verified.
    pub async fn reconcile(
        &self,
        notification: &WebhookNotification,
    ) -> Result<CanonicalPaymentStatus, ReconcileError> {
        let status = CanonicalPaymentStatus::from_gateway(&notification.status);
        let order_id = &notification.order_id;

        if self.orders.update_status(order_id, status).is_none() {
            tracing::warn!(
                gateway = %notification.gateway,
                order_id = %order_id,
                "Notification for an order this process did not create"
            );
        }

        match status {
            CanonicalPaymentStatus::Confirmed => self.fulfill_once(notification).await?,
            CanonicalPaymentStatus::Failed => {
                tracing::warn!(gateway = %notification.gateway, order_id = %order_id, "Payment failed");
            }
            CanonicalPaymentStatus::Pending => {
                tracing::debug!(gateway = %notification.gateway, order_id = %order_id, "Payment pending");
            }
            CanonicalPaymentStatus::Unknown => {
                tracing::warn!(
                    gateway = %notification.gateway,
                    order_id = %order_id,
                    received_status = %notification.status,
                    "Unrecognized payment status, not treated as success"
                );
            }
        }

        Ok(status)
    }

    async fn fulfill_once(&self, notification: &WebhookNotification) -> Result<(), ReconcileError> {
        let order_id = &notification.order_id;
        if !self.orders.claim_fulfillment(order_id) {
            tracing::info!(order_id = %order_id, "Duplicate confirmation, already fulfilled");
            return Ok(());
        }

        let payment = ConfirmedPayment {
            gateway: notification.gateway,
            order_id: order_id.clone(),
            amount: notification.amount.clone(),
            currency: notification.currency.clone(),
            tx_hash: notification.tx_hash.clone(),
            metadata: notification.metadata.clone(),
        };

        if let Err(e) = self.fulfillment.fulfill(&payment).await {
            self.orders.release_fulfillment(order_id);
            tracing::error!(order_id = %order_id, error = %e, "Fulfillment failed");
            return Err(e.into());
        }
        Ok(())
    }
}
