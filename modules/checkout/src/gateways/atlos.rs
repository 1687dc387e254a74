use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::{normalize, GatewayAdapter, GatewayError, GatewayHttp};
use crate::config::AtlosConfig;
use crate::models::{Gateway, GatewayResponse, PaymentIntent, PaymentMethodHint};

#[derive(Debug, Serialize)]
pub struct CreateAtlosPaymentRequest<'a> {
    pub merchant_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: &'a str,
    pub order_id: &'a str,
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<&'a str>,
    pub customer_name: &'a str,
    pub customer_contact: &'a str,
    pub customer_country: &'a str,
    pub customer_city: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub webhook_url: String,
    pub payment_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_currency: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<&'a str>,
}

pub struct AtlosAdapter {
    config: AtlosConfig,
    http: GatewayHttp,
}

impl AtlosAdapter {
    pub fn new(config: AtlosConfig, http: GatewayHttp) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl GatewayAdapter for AtlosAdapter {
    fn gateway(&self) -> Gateway {
        Gateway::Atlos
    }

    async fn create_payment(
        &self,
        intent: &PaymentIntent,
    ) -> Result<GatewayResponse, GatewayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GatewayError::ConfigMissing("ATLOS_API_KEY"))?;
        let merchant_id = self
            .config
            .merchant_id
            .as_deref()
            .ok_or(GatewayError::ConfigMissing("ATLOS_MERCHANT_ID"))?;

        let crypto = intent.method == PaymentMethodHint::Crypto;
        let request = CreateAtlosPaymentRequest {
            merchant_id,
            amount: intent.amount,
            currency: &intent.currency,
            order_id: intent.order_id.as_str(),
            description: &intent.description,
            customer_email: intent.customer.email.as_deref(),
            customer_name: &intent.customer.full_name,
            customer_contact: &intent.customer.contact_handle,
            customer_country: &intent.customer.country,
            customer_city: &intent.customer.city,
            success_url: &intent.urls.success,
            cancel_url: &intent.urls.cancel,
            webhook_url: intent.webhook_url(Gateway::Atlos),
            payment_method: intent.method.as_str(),
            receive_currency: crypto.then_some(self.config.receive_currency.as_str()),
            network: if crypto { self.config.network.as_deref() } else { None },
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        tracing::info!(
            order_id = %intent.order_id,
            amount = %intent.amount,
            method = intent.method.as_str(),
            "Creating Atlos payment"
        );

        let response = self
            .http
            .post_json(
                &self.config.api_url,
                &[("Authorization", format!("Bearer {api_key}"))],
                body,
            )
            .await?;

        // Atlos reports some rejections in a 200 body.
        if response.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(GatewayError::NonOkResponse {
                status: 200,
                body: response.to_string(),
            });
        }

        normalize(&intent.order_id, response)
    }
}
