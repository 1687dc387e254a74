use axum::body::Bytes;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::gateways::cryptomus;
use crate::models::Gateway;
use crate::order_id::OrderId;

type HmacSha256 = Hmac<Sha256>;

const SHA256_PREFIX: &str = "sha256=";

/// How a gateway signs the notifications it sends us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// `hex(HMAC-SHA256(secret, raw_body))`, optionally prefixed with `sha256=`.
    HmacSha256 { header: &'static str },
    /// `hex(md5(base64(raw_body) + api_key))`.
    CryptomusMd5 { header: &'static str },
}

impl SignatureScheme {
    pub fn for_gateway(gateway: Gateway) -> Self {
        match gateway {
            Gateway::Atlos => SignatureScheme::HmacSha256 {
                header: "x-atlos-signature",
            },
            Gateway::CoinGate => SignatureScheme::HmacSha256 {
                header: "x-coingate-signature",
            },
            Gateway::Cryptomus => SignatureScheme::CryptomusMd5 { header: "sign" },
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            SignatureScheme::HmacSha256 { header } | SignatureScheme::CryptomusMd5 { header } => {
                header
            }
        }
    }

    /// Check `signature` against the exact bytes received, before any parsing.
    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>, secret: Option<&str>) -> bool {
        match self {
            SignatureScheme::HmacSha256 { .. } => verify_hmac_sha256(raw_body, signature, secret),
            SignatureScheme::CryptomusMd5 { .. } => {
                verify_cryptomus_md5(raw_body, signature, secret)
            }
        }
    }
}

/// Accepts the bare hex digest or `sha256=<hex>`.
///
/// Returns false when the header is absent, the secret is not configured, or
/// neither form matches. Comparison is constant time.
pub fn verify_hmac_sha256(raw_body: &[u8], signature: Option<&str>, secret: Option<&str>) -> bool {
    let (Some(signature), Some(secret)) = (signature, secret.filter(|s| !s.is_empty())) else {
        return false;
    };

    let hex_digest = signature.trim();
    let hex_digest = hex_digest.strip_prefix(SHA256_PREFIX).unwrap_or(hex_digest);

    let Ok(received) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&received).is_ok()
}

pub fn verify_cryptomus_md5(raw_body: &[u8], signature: Option<&str>, api_key: Option<&str>) -> bool {
    let (Some(signature), Some(api_key)) = (signature, api_key.filter(|k| !k.is_empty())) else {
        return false;
    };

    let expected = cryptomus::sign(raw_body, api_key);
    let received = signature.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Where each gateway puts the values we care about.
struct PayloadFields {
    amount: &'static [&'static str],
    currency: &'static [&'static str],
    tx_hash: &'static [&'static str],
}

impl PayloadFields {
    fn for_gateway(gateway: Gateway) -> Self {
        match gateway {
            Gateway::Atlos => PayloadFields {
                amount: &["amount"],
                currency: &["currency"],
                tx_hash: &["tx_hash", "transaction_hash"],
            },
            Gateway::Cryptomus => PayloadFields {
                amount: &["amount"],
                currency: &["currency"],
                tx_hash: &["txid"],
            },
            Gateway::CoinGate => PayloadFields {
                amount: &["price_amount"],
                currency: &["price_currency"],
                tx_hash: &["tx_hash"],
            },
        }
    }
}

/// A verified status notification from one gateway.
#[derive(Debug, Clone)]
pub struct WebhookNotification {
    pub gateway: Gateway,
    pub raw_body: Bytes,
    pub signature: String,
    pub status: String,
    pub order_id: OrderId,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub tx_hash: Option<String>,
    pub metadata: Option<Value>,
}

impl WebhookNotification {
    /// Parse an already verified body using the gateway's field names.
    pub fn parse(
        gateway: Gateway,
        raw_body: Bytes,
        signature: String,
    ) -> Result<Self, NotificationError> {
        let payload: Value = serde_json::from_slice(&raw_body)
            .map_err(|e| NotificationError::MalformedJson(e.to_string()))?;

        let field = |names: &[&str]| -> Option<String> {
            names.iter().find_map(|name| match payload.get(*name) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
        };

        let names = PayloadFields::for_gateway(gateway);

        let status = field(&["status"]).ok_or(NotificationError::MissingField("status"))?;
        let order_id = field(&["order_id"]).ok_or(NotificationError::MissingField("order_id"))?;

        let metadata = match gateway {
            // Cryptomus echoes back the `additional_data` string sent at invoice creation.
            Gateway::Cryptomus => payload
                .get("additional_data")
                .and_then(Value::as_str)
                .and_then(|s| serde_json::from_str(s).ok()),
            Gateway::Atlos => payload.get("metadata").cloned(),
            Gateway::CoinGate => None,
        };

        Ok(Self {
            gateway,
            status,
            order_id: OrderId::new(order_id),
            amount: field(names.amount),
            currency: field(names.currency),
            tx_hash: field(names.tx_hash),
            metadata,
            raw_body,
            signature,
        })
    }
}
