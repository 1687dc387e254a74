use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "module": "checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
