use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::models::{
    CreatePaymentRequest, CustomerInfo, Gateway, IntentUrls, Offer, PaymentIntent,
    PaymentMethodHint, INTENT_CURRENCY,
};
use crate::order_id::{generate_order_id, OrderId};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Unknown offer: {0}")]
    UnknownOffer(String),

    #[error("Amount {submitted} does not match offer price {expected}")]
    AmountMismatch { submitted: Decimal, expected: Decimal },

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

/// Turns checkout form input plus a chosen offer into a [`PaymentIntent`].
///
/// Building is independent of the gateway, so the same intent can be sent to
/// another processor without asking the customer again.
#[derive(Debug, Clone)]
pub struct IntentBuilder {
    base_url: String,
}

impl IntentBuilder {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        let base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn build(
        &self,
        offer: &Offer,
        customer: CustomerInfo,
        method: PaymentMethodHint,
    ) -> Result<PaymentIntent, ValidationError> {
        self.build_for_order(generate_order_id(None), offer, customer, method)
    }

    pub fn build_for_order(
        &self,
        order_id: OrderId,
        offer: &Offer,
        customer: CustomerInfo,
        method: PaymentMethodHint,
    ) -> Result<PaymentIntent, ValidationError> {
        let missing = missing_fields(&customer);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        Ok(PaymentIntent {
            order_id,
            offer_id: offer.id.to_string(),
            amount: offer.price,
            currency: INTENT_CURRENCY.to_string(),
            customer,
            description: format!("Kuckaj&Zaradi - {}", offer.title),
            urls: self.urls(),
            method,
        })
    }

    /// Resolve the offer named by the request and build the intent for `gateway`.
    ///
    /// A client-supplied amount or currency is only accepted when it agrees
    /// with the catalog; the catalog price is what gets charged.
    pub fn build_from_request(
        &self,
        catalog: &Catalog,
        request: &CreatePaymentRequest,
        gateway: Gateway,
    ) -> Result<PaymentIntent, ValidationError> {
        let offer = catalog
            .find(&request.package_type)
            .ok_or_else(|| ValidationError::UnknownOffer(request.package_type.clone()))?;

        if let Some(submitted) = request.amount {
            if submitted != offer.price {
                return Err(ValidationError::AmountMismatch {
                    submitted,
                    expected: offer.price,
                });
            }
        }

        if let Some(currency) = request.currency.as_deref() {
            if !currency.eq_ignore_ascii_case(INTENT_CURRENCY) {
                return Err(ValidationError::UnsupportedCurrency(currency.to_string()));
            }
        }

        let order_id = match request.order_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => OrderId::new(id),
            _ => generate_order_id(Some(gateway.as_str())),
        };

        let mut intent =
            self.build_for_order(order_id, offer, request.customer_info(), request.payment_method)?;
        if let Some(description) = request.description.as_deref().filter(|d| !d.trim().is_empty()) {
            intent.description = description.to_string();
        }
        Ok(intent)
    }

    fn urls(&self) -> IntentUrls {
        IntentUrls {
            success: format!("{}/payment-success", self.base_url),
            cancel: format!("{}/payment-cancelled", self.base_url),
            return_to: format!("{}/payment-return", self.base_url),
            webhook_base: self.base_url.clone(),
        }
    }
}

fn missing_fields(customer: &CustomerInfo) -> Vec<&'static str> {
    [
        ("fullName", &customer.full_name),
        ("contactHandle", &customer.contact_handle),
        ("country", &customer.country),
        ("city", &customer.city),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect()
}
