use std::env;

#[derive(Debug, Clone)]
pub struct AtlosConfig {
    pub api_key: Option<String>,
    pub merchant_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_url: String,
    pub receive_currency: String,
    pub network: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CryptomusConfig {
    pub merchant_id: Option<String>,
    pub api_key: Option<String>,
    pub api_url: String,
    pub to_currency: String,
    pub lifetime_secs: u32,
}

#[derive(Debug, Clone)]
pub struct CoinGateConfig {
    pub api_token: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_url: String,
    pub receive_currency: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub gateway_timeout_secs: u64,

    pub atlos: AtlosConfig,
    pub cryptomus: CryptomusConfig,
    pub coingate: CoinGateConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse()?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gateway_timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,

            atlos: AtlosConfig {
                api_key: optional("ATLOS_API_KEY"),
                merchant_id: optional("ATLOS_MERCHANT_ID"),
                webhook_secret: optional("ATLOS_WEBHOOK_SECRET"),
                api_url: env::var("ATLOS_API_URL")
                    .unwrap_or_else(|_| "https://api.atlos.io/v1/payments".to_string()),
                receive_currency: env::var("ATLOS_RECEIVE_CURRENCY")
                    .unwrap_or_else(|_| "USDT".to_string()),
                network: optional("ATLOS_NETWORK"),
            },
            cryptomus: CryptomusConfig {
                merchant_id: optional("CRYPTOMUS_MERCHANT_ID"),
                api_key: optional("CRYPTOMUS_API_KEY"),
                api_url: env::var("CRYPTOMUS_API_URL")
                    .unwrap_or_else(|_| "https://api.cryptomus.com/v1/payment".to_string()),
                to_currency: env::var("CRYPTOMUS_TO_CURRENCY")
                    .unwrap_or_else(|_| "USDT".to_string()),
                lifetime_secs: env::var("CRYPTOMUS_LIFETIME_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()?,
            },
            coingate: CoinGateConfig {
                api_token: optional("COINGATE_API_TOKEN"),
                webhook_secret: optional("COINGATE_WEBHOOK_SECRET"),
                api_url: env::var("COINGATE_API_URL")
                    .unwrap_or_else(|_| "https://api.coingate.com/v2/orders".to_string()),
                receive_currency: env::var("COINGATE_RECEIVE_CURRENCY")
                    .unwrap_or_else(|_| "BTC".to_string()),
            },
        })
    }
}

/// Unset and blank variables both count as "not configured".
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
