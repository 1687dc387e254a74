use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::models::{Gateway, GatewayResponse, PaymentIntent};
use crate::order_id::OrderId;
use crate::reconcile::CanonicalPaymentStatus;

/// Server-side view of one checkout attempt.
///
/// The client keeps only the order id and reads this back on the
/// success/return/cancelled pages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub gateway: Gateway,
    pub offer_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub customer_name: String,
    pub status: CanonicalPaymentStatus,
    pub payment_url: Option<String>,
    pub payment_id: Option<String>,
    pub fulfilled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Order {0} already exists")]
pub struct OrderConflict(pub OrderId);

#[derive(Default)]
struct Inner {
    records: HashMap<OrderId, OrderRecord>,
    // Tracked apart from `records` so redelivered webhooks stay idempotent
    // even for orders created before a restart.
    fulfilled: HashSet<OrderId>,
}

/// In-process order store keyed by [`OrderId`].
#[derive(Clone, Default)]
pub struct OrderStore {
    inner: Arc<RwLock<Inner>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an intent that the gateway accepted.
    ///
    /// An order id is used once: an existing record, or an id that was
    /// already fulfilled, is never replaced.
    pub fn record_created(
        &self,
        gateway: Gateway,
        intent: &PaymentIntent,
        response: &GatewayResponse,
    ) -> Result<OrderRecord, OrderConflict> {
        let now = Utc::now();
        let record = OrderRecord {
            order_id: intent.order_id.clone(),
            gateway,
            offer_id: intent.offer_id.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            customer_name: intent.customer.full_name.clone(),
            status: CanonicalPaymentStatus::Pending,
            payment_url: Some(response.payment_url.clone()),
            payment_id: response.payment_id.clone(),
            fulfilled: false,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.fulfilled.contains(&record.order_id) {
            return Err(OrderConflict(record.order_id));
        }
        match inner.records.entry(record.order_id.clone()) {
            Entry::Occupied(_) => Err(OrderConflict(record.order_id)),
            Entry::Vacant(slot) => Ok(slot.insert(record).clone()),
        }
    }

    /// Whether `order_id` is already bound to a checkout attempt.
    pub fn is_taken(&self, order_id: &OrderId) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.contains_key(order_id) || inner.fulfilled.contains(order_id)
    }

    pub fn get(&self, order_id: &OrderId) -> Option<OrderRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.get(order_id).cloned()
    }

    /// Apply a status from a notification. Notifications can arrive out of
    /// order: Confirmed is final, and a Failed order does not go back to Pending.
    ///
    /// Returns the resulting status, or `None` when the order is unknown.
    pub fn update_status(
        &self,
        order_id: &OrderId,
        status: CanonicalPaymentStatus,
    ) -> Option<CanonicalPaymentStatus> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let record = inner.records.get_mut(order_id)?;

        if accepts_transition(record.status, status) {
            record.status = status;
            record.updated_at = Utc::now();
        }
        Some(record.status)
    }

    /// Atomically claim fulfillment for `order_id`.
    ///
    /// Returns true exactly once per order id until [`release_fulfillment`](Self::release_fulfillment).
    pub fn claim_fulfillment(&self, order_id: &OrderId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let claimed = inner.fulfilled.insert(order_id.clone());
        if claimed {
            if let Some(record) = inner.records.get_mut(order_id) {
                record.fulfilled = true;
                record.updated_at = Utc::now();
            }
        }
        claimed
    }

    /// Undo a claim after the fulfillment action failed, so a redelivery can retry it.
    pub fn release_fulfillment(&self, order_id: &OrderId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.fulfilled.remove(order_id);
        if let Some(record) = inner.records.get_mut(order_id) {
            record.fulfilled = false;
        }
    }
}

fn accepts_transition(current: CanonicalPaymentStatus, next: CanonicalPaymentStatus) -> bool {
    use CanonicalPaymentStatus::*;
    !matches!(
        (current, next),
        (_, Unknown) | (Confirmed, _) | (Failed, Pending)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::intent::IntentBuilder;
    use crate::models::{CustomerInfo, PaymentMethodHint};

    fn created(store: &OrderStore) -> OrderId {
        let catalog = Catalog::default();
        let intent = IntentBuilder::new("http://localhost:3000")
            .build(
                catalog.find("tajne-tehnike").unwrap(),
                CustomerInfo {
                    full_name: "Ana".into(),
                    contact_handle: "@ana".into(),
                    country: "RS".into(),
                    city: "Niš".into(),
                    ..Default::default()
                },
                PaymentMethodHint::Crypto,
            )
            .unwrap();
        let response = GatewayResponse {
            success: true,
            payment_url: "https://pay/1".into(),
            payment_id: Some("p1".into()),
            order_id: intent.order_id.clone(),
            raw: serde_json::Value::Null,
        };
        store.record_created(Gateway::Atlos, &intent, &response).unwrap();
        intent.order_id
    }

    #[test]
    fn confirmed_is_never_downgraded() {
        let store = OrderStore::new();
        let id = created(&store);

        assert_eq!(
            store.update_status(&id, CanonicalPaymentStatus::Confirmed),
            Some(CanonicalPaymentStatus::Confirmed)
        );
        assert_eq!(
            store.update_status(&id, CanonicalPaymentStatus::Pending),
            Some(CanonicalPaymentStatus::Confirmed)
        );
    }

    #[test]
    fn failed_is_not_reopened_by_late_pending() {
        let store = OrderStore::new();
        let id = created(&store);

        store.update_status(&id, CanonicalPaymentStatus::Failed);
        assert_eq!(
            store.update_status(&id, CanonicalPaymentStatus::Pending),
            Some(CanonicalPaymentStatus::Failed)
        );
        // A payment that lands after a failure notice still confirms.
        assert_eq!(
            store.update_status(&id, CanonicalPaymentStatus::Confirmed),
            Some(CanonicalPaymentStatus::Confirmed)
        );
    }

    #[test]
    fn reused_order_id_is_not_overwritten() {
        let store = OrderStore::new();
        let id = created(&store);
        store.update_status(&id, CanonicalPaymentStatus::Confirmed);
        assert!(store.claim_fulfillment(&id));

        let original = store.get(&id).unwrap();
        let catalog = Catalog::default();
        let intent = IntentBuilder::new("http://localhost:3000")
            .build_for_order(
                id.clone(),
                catalog.find("zagarantovan-posao").unwrap(),
                CustomerInfo {
                    full_name: "Someone Else".into(),
                    contact_handle: "@else".into(),
                    country: "RS".into(),
                    city: "Novi Sad".into(),
                    ..Default::default()
                },
                PaymentMethodHint::Crypto,
            )
            .unwrap();
        let response = GatewayResponse {
            success: true,
            payment_url: "https://pay/2".into(),
            payment_id: None,
            order_id: id.clone(),
            raw: serde_json::Value::Null,
        };

        assert!(store.is_taken(&id));
        assert_eq!(
            store.record_created(Gateway::Atlos, &intent, &response).unwrap_err(),
            OrderConflict(id.clone())
        );

        let after = store.get(&id).unwrap();
        assert_eq!(after.offer_id, original.offer_id);
        assert_eq!(after.customer_name, "Ana");
        assert_eq!(after.status, CanonicalPaymentStatus::Confirmed);
        assert!(after.fulfilled);
    }

    #[test]
    fn fulfilled_id_without_record_is_taken() {
        let store = OrderStore::new();
        let id = OrderId::from("from_before_restart");
        assert!(!store.is_taken(&id));
        store.claim_fulfillment(&id);
        assert!(store.is_taken(&id));
    }

    #[test]
    fn unknown_order_has_no_status() {
        let store = OrderStore::new();
        assert!(store
            .update_status(&OrderId::from("nope"), CanonicalPaymentStatus::Failed)
            .is_none());
    }

    #[test]
    fn fulfillment_claim_is_single_use_until_released() {
        let store = OrderStore::new();
        let id = created(&store);

        assert!(store.claim_fulfillment(&id));
        assert!(!store.claim_fulfillment(&id));
        assert!(store.get(&id).unwrap().fulfilled);

        store.release_fulfillment(&id);
        assert!(store.claim_fulfillment(&id));
    }
}
