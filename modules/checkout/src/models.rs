use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::order_id::OrderId;

pub const INTENT_CURRENCY: &str = "EUR";

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Supported payment processors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Atlos,
    Cryptomus,
    CoinGate,
}

impl Gateway {
    pub const ALL: [Gateway; 3] = [Gateway::Atlos, Gateway::Cryptomus, Gateway::CoinGate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Atlos => "atlos",
            Gateway::Cryptomus => "cryptomus",
            Gateway::CoinGate => "coingate",
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gateway {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "atlos" => Ok(Gateway::Atlos),
            "cryptomus" => Ok(Gateway::Cryptomus),
            "coingate" => Ok(Gateway::CoinGate),
            other => Err(format!("unknown gateway: {other}")),
        }
    }
}

/// Purchasable course package
#[derive(Debug, Clone, Serialize)]
pub struct Offer {
    pub id: &'static str,
    pub title: &'static str,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub description: &'static str,
    pub features: Vec<&'static str>,
}

/// Checkout form data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub full_name: String,
    pub contact_handle: String,
    pub country: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodHint {
    Card,
    #[default]
    Crypto,
}

impl PaymentMethodHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodHint::Card => "card",
            PaymentMethodHint::Crypto => "crypto",
        }
    }
}

/// Absolute URLs handed to the gateway when the intent is created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentUrls {
    pub success: String,
    pub cancel: String,
    pub return_to: String,
    pub webhook_base: String,
}

/// Normalized checkout request, prior to any gateway-specific translation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub order_id: OrderId,
    pub offer_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub customer: CustomerInfo,
    pub description: String,
    pub urls: IntentUrls,
    pub method: PaymentMethodHint,
}

impl PaymentIntent {
    /// Callback URL the given gateway should post status notifications to.
    pub fn webhook_url(&self, gateway: Gateway) -> String {
        format!("{}/api/{}/webhook", self.urls.webhook_base, gateway)
    }
}

/// Gateway-agnostic result of a create-payment call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub success: bool,
    pub payment_url: String,
    pub payment_id: Option<String>,
    pub order_id: OrderId,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

/// Body accepted by the create-payment endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub order_id: Option<String>,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(alias = "username")]
    pub customer_contact: Option<String>,
    #[serde(default)]
    pub customer_country: String,
    #[serde(default)]
    pub customer_city: String,
    pub customer_experience: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethodHint,
    pub package_type: String,
}

impl CreatePaymentRequest {
    pub fn customer_info(&self) -> CustomerInfo {
        let email = self
            .customer_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        // Older checkout forms only sent an email; it doubles as the contact handle.
        let contact_handle = self
            .customer_contact
            .clone()
            .or_else(|| email.clone())
            .unwrap_or_default();

        CustomerInfo {
            full_name: self.customer_name.clone(),
            contact_handle,
            country: self.customer_country.clone(),
            city: self.customer_city.clone(),
            email,
            experience: self.customer_experience.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub payment_url: String,
    pub payment_id: Option<String>,
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}
