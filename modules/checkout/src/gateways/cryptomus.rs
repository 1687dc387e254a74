use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::Value;

use super::{normalize, GatewayAdapter, GatewayError, GatewayHttp};
use crate::config::CryptomusConfig;
use crate::models::{Gateway, GatewayResponse, PaymentIntent};

#[derive(Debug, Serialize)]
pub struct CreateInvoiceRequest<'a> {
    /// Cryptomus expects the amount as a string.
    pub amount: String,
    pub currency: &'a str,
    pub order_id: &'a str,
    pub url_return: &'a str,
    pub url_success: &'a str,
    pub url_callback: String,
    pub to_currency: &'a str,
    pub lifetime: u32,
    pub additional_data: String,
}

/// `hex(md5(base64(body) + api_key))`, the signature Cryptomus uses in both directions.
pub fn sign(body: &[u8], api_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(STANDARD.encode(body).as_bytes());
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct CryptomusAdapter {
    config: CryptomusConfig,
    http: GatewayHttp,
}

impl CryptomusAdapter {
    pub fn new(config: CryptomusConfig, http: GatewayHttp) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl GatewayAdapter for CryptomusAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Cryptomus
    }

    async fn create_payment(
        &self,
        intent: &PaymentIntent,
    ) -> Result<GatewayResponse, GatewayError> {
        let merchant_id = self
            .config
            .merchant_id
            .as_deref()
            .ok_or(GatewayError::ConfigMissing("CRYPTOMUS_MERCHANT_ID"))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GatewayError::ConfigMissing("CRYPTOMUS_API_KEY"))?;

        let additional_data = serde_json::to_string(&intent.customer)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        let request = CreateInvoiceRequest {
            amount: intent.amount.round_dp(2).to_string(),
            currency: &intent.currency,
            order_id: intent.order_id.as_str(),
            url_return: &intent.urls.return_to,
            url_success: &intent.urls.success,
            url_callback: intent.webhook_url(Gateway::Cryptomus),
            to_currency: &self.config.to_currency,
            lifetime: self.config.lifetime_secs,
            additional_data,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let signature = sign(&body, api_key);

        tracing::info!(
            order_id = %intent.order_id,
            amount = %request.amount,
            to_currency = %request.to_currency,
            "Creating Cryptomus invoice"
        );

        let response = self
            .http
            .post_json(
                &self.config.api_url,
                &[("merchant", merchant_id.to_string()), ("sign", signature)],
                body,
            )
            .await
            .inspect_err(|e| {
                tracing::error!(order_id = %intent.order_id, error = %e, "Cryptomus API error")
            })?;

        match response.get("state").and_then(Value::as_i64) {
            Some(0) | None => normalize(&intent.order_id, response),
            Some(_) => Err(GatewayError::NonOkResponse {
                status: 200,
                body: response.to_string(),
            }),
        }
    }
}
