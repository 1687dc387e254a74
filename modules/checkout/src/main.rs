use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_rs::{build_state, router, Config, LoggingFulfillment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,checkout_rs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cfg = Config::from_env()?;
    tracing::info!(
        public_base_url = %cfg.public_base_url,
        atlos = cfg.atlos.api_key.is_some(),
        cryptomus = cfg.cryptomus.api_key.is_some(),
        coingate = cfg.coingate.api_token.is_some(),
        "config loaded"
    );

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let state = Arc::new(build_state(cfg, Arc::new(LoggingFulfillment))?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
