use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{normalize, GatewayAdapter, GatewayError, GatewayHttp};
use crate::config::CoinGateConfig;
use crate::models::{Gateway, GatewayResponse, PaymentIntent};

#[derive(Debug, Serialize)]
pub struct CreateOrderRequest<'a> {
    pub order_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_amount: Decimal,
    pub price_currency: &'a str,
    pub receive_currency: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub callback_url: String,
    pub cancel_url: &'a str,
    pub success_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchaser_email: Option<&'a str>,
}

pub struct CoinGateAdapter {
    config: CoinGateConfig,
    http: GatewayHttp,
}

impl CoinGateAdapter {
    pub fn new(config: CoinGateConfig, http: GatewayHttp) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl GatewayAdapter for CoinGateAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::CoinGate
    }

    async fn create_payment(
        &self,
        intent: &PaymentIntent,
    ) -> Result<GatewayResponse, GatewayError> {
        let api_token = self
            .config
            .api_token
            .as_deref()
            .ok_or(GatewayError::ConfigMissing("COINGATE_API_TOKEN"))?;

        let request = CreateOrderRequest {
            order_id: intent.order_id.as_str(),
            price_amount: intent.amount,
            price_currency: &intent.currency,
            receive_currency: &self.config.receive_currency,
            title: &intent.description,
            description: &intent.description,
            callback_url: intent.webhook_url(Gateway::CoinGate),
            cancel_url: &intent.urls.cancel,
            success_url: &intent.urls.success,
            purchaser_email: intent.customer.email.as_deref(),
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        tracing::info!(
            order_id = %intent.order_id,
            price_amount = %intent.amount,
            receive_currency = %self.config.receive_currency,
            "Creating CoinGate order"
        );

        let response = self
            .http
            .post_json(
                &self.config.api_url,
                &[("Authorization", format!("Token {api_token}"))],
                body,
            )
            .await?;

        normalize(&intent.order_id, response)
    }
}
