pub mod atlos;
pub mod coingate;
pub mod cryptomus;
pub mod error;

pub use atlos::AtlosAdapter;
pub use coingate::CoinGateAdapter;
pub use cryptomus::CryptomusAdapter;
pub use error::GatewayError;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::models::{Gateway, GatewayResponse, PaymentIntent};
use crate::order_id::OrderId;

/// Field names gateways have used for the hosted checkout URL, in preference order.
const PAYMENT_URL_FIELDS: [&str; 5] = [
    "payment_url",
    "checkout_url",
    "redirect_url",
    "url",
    "paymentUrl",
];

const PAYMENT_ID_FIELDS: [&str; 4] = ["payment_id", "paymentId", "uuid", "id"];

/// Nested objects some gateways wrap their payload in.
const ENVELOPE_FIELDS: [&str; 2] = ["result", "data"];

/// One external payment processor's create-payment call.
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    fn gateway(&self) -> Gateway;

    /// Send `intent` to the processor and normalize its answer.
    ///
    /// Missing credentials are reported as [`GatewayError::ConfigMissing`]
    /// before any request is built.
    async fn create_payment(&self, intent: &PaymentIntent)
        -> Result<GatewayResponse, GatewayError>;
}

/// Thin wrapper over `reqwest` shared by every adapter.
#[derive(Clone)]
pub struct GatewayHttp {
    client: Client,
}

impl GatewayHttp {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::NetworkFailure(e.to_string()))?;

        Ok(Self { client })
    }

    /// POST pre-serialized JSON so the bytes on the wire are exactly the bytes a signature covers.
    pub(crate) async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: Vec<u8>,
    ) -> Result<Value, GatewayError> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request.body(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response(response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
        } else {
            Err(GatewayError::NonOkResponse {
                status: status.as_u16(),
                body: error_message(&text),
            })
        }
    }
}

/// Prefer a structured `message`/`error` field, falling back to the raw text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| {
            ["message", "error", "errors"]
                .iter()
                .find_map(|key| v.get(*key).map(value_to_string))
        })
        .unwrap_or_else(|| text.to_string())
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn find_field(body: &Value, fields: &[&str]) -> Option<String> {
    let scopes = std::iter::once(body).chain(ENVELOPE_FIELDS.iter().filter_map(|k| body.get(*k)));

    for scope in scopes {
        for field in fields {
            match scope.get(*field) {
                Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
                Some(Value::Number(n)) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

pub(crate) fn extract_payment_url(body: &Value) -> Option<String> {
    find_field(body, &PAYMENT_URL_FIELDS)
}

pub(crate) fn extract_payment_id(body: &Value) -> Option<String> {
    find_field(body, &PAYMENT_ID_FIELDS)
}

/// Build the common response shape from a 2xx gateway body.
pub(crate) fn normalize(order_id: &OrderId, body: Value) -> Result<GatewayResponse, GatewayError> {
    if !body.is_object() {
        return Err(GatewayError::MalformedResponse(format!(
            "expected JSON object, got {body}"
        )));
    }

    let payment_url = extract_payment_url(&body).ok_or(GatewayError::NoPaymentUrl)?;
    let payment_id = extract_payment_id(&body);

    Ok(GatewayResponse {
        success: true,
        payment_url,
        payment_id,
        order_id: order_id.clone(),
        raw: body,
    })
}

/// Active adapters keyed by gateway.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    adapters: HashMap<Gateway, Arc<dyn GatewayAdapter>>,
}

impl GatewayRegistry {
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let http = GatewayHttp::new(Duration::from_secs(config.gateway_timeout_secs))?;

        Ok(Self::default()
            .with(Arc::new(AtlosAdapter::new(config.atlos.clone(), http.clone())))
            .with(Arc::new(CryptomusAdapter::new(
                config.cryptomus.clone(),
                http.clone(),
            )))
            .with(Arc::new(CoinGateAdapter::new(config.coingate.clone(), http))))
    }

    pub fn with(mut self, adapter: Arc<dyn GatewayAdapter>) -> Self {
        self.adapters.insert(adapter.gateway(), adapter);
        self
    }

    pub fn get(&self, gateway: Gateway) -> Option<Arc<dyn GatewayAdapter>> {
        self.adapters.get(&gateway).cloned()
    }
}
