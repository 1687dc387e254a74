#![allow(dead_code)]

use axum::body::Body;
use axum::Router;
use checkout_rs::config::{AtlosConfig, CoinGateConfig, CryptomusConfig};
use checkout_rs::{build_state, router, AppState, Config, Fulfillment, LoggingFulfillment};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use sha2::Sha256;
use std::sync::Arc;

pub const ATLOS_WEBHOOK_SECRET: &str = "whsec_atlos_test";
pub const COINGATE_WEBHOOK_SECRET: &str = "whsec_coingate_test";
pub const CRYPTOMUS_API_KEY: &str = "cryptomus_test_key";

/// Configuration with every gateway pointed at `gateway_base` (usually a wiremock server).
pub fn test_config(gateway_base: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_base_url: "https://kurs.example".to_string(),
        gateway_timeout_secs: 5,
        atlos: AtlosConfig {
            api_key: Some("atlos_key".to_string()),
            merchant_id: Some("RJNO27U9TT".to_string()),
            webhook_secret: Some(ATLOS_WEBHOOK_SECRET.to_string()),
            api_url: format!("{gateway_base}/atlos/v1/payments"),
            receive_currency: "USDT".to_string(),
            network: None,
        },
        cryptomus: CryptomusConfig {
            merchant_id: Some("merchant-uuid".to_string()),
            api_key: Some(CRYPTOMUS_API_KEY.to_string()),
            api_url: format!("{gateway_base}/cryptomus/v1/payment"),
            to_currency: "USDT".to_string(),
            lifetime_secs: 3600,
        },
        coingate: CoinGateConfig {
            api_token: Some("coingate_token".to_string()),
            webhook_secret: Some(COINGATE_WEBHOOK_SECRET.to_string()),
            api_url: format!("{gateway_base}/coingate/v2/orders"),
            receive_currency: "BTC".to_string(),
        },
    }
}

/// Build the router plus a handle on its state for assertions.
pub fn app_with(config: Config, fulfillment: Arc<dyn Fulfillment>) -> (Router, Arc<AppState>) {
    let state = Arc::new(build_state(config, fulfillment).expect("state"));
    (router(state.clone()), state)
}

pub fn app(config: Config) -> (Router, Arc<AppState>) {
    app_with(config, Arc::new(LoggingFulfillment))
}

/// Read response body as JSON.
pub async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn hmac_hex(body: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub fn checkout_body(package: &str) -> serde_json::Value {
    serde_json::json!({
        "customerName": "Marko Savić",
        "customerContact": "@marko",
        "customerEmail": "marko@example.com",
        "customerCountry": "Srbija",
        "customerCity": "Beograd",
        "paymentMethod": "crypto",
        "packageType": package
    })
}
