use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration missing: {0}")]
    ConfigMissing(&'static str),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Gateway error (status {status}): {body}")]
    NonOkResponse { status: u16, body: String },

    #[error("Gateway response contained no payment URL")]
    NoPaymentUrl,

    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// The gateway refused our credentials (401/403).
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, GatewayError::NonOkResponse { status, .. } if *status == 401 || *status == 403)
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ConfigMissing(_) => "config_missing",
            GatewayError::NetworkFailure(_) => "network_failure",
            GatewayError::NonOkResponse { .. } => "non_ok_response",
            GatewayError::NoPaymentUrl => "no_payment_url",
            GatewayError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::NetworkFailure(e.to_string())
    }
}
