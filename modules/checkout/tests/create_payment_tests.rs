mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn atlos_checkout_returns_gateway_url_and_catalog_price() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/atlos/v1/payments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "payment_url": "/p/123"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = common::app(common::test_config(&server.uri()));
    let response = app
        .oneshot(post_json("/api/atlos/create-payment", &common::checkout_body("tajne-tehnike")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["paymentUrl"], "/p/123");
    assert_eq!(body["amount"], json!(14.97));
    assert_eq!(body["currency"], "EUR");
    assert!(body["orderId"].as_str().unwrap().starts_with("atlos_"));
}

#[tokio::test]
async fn created_order_is_readable_afterwards() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_url": "https://pay.example/live",
            "payment_id": "pay_42"
        })))
        .mount(&server)
        .await;

    let (app, _) = common::app(common::test_config(&server.uri()));
    let mut body = common::checkout_body("live-mentorship");
    body["orderId"] = json!("kz_order_1");

    let response = app
        .clone()
        .oneshot(post_json("/api/coingate/create-payment", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/orders/kz_order_1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let order = common::body_json(response).await;
    assert_eq!(order["orderId"], "kz_order_1");
    assert_eq!(order["gateway"], "coingate");
    assert_eq!(order["offerId"], "live-mentorship");
    assert_eq!(order["amount"], json!(34.97));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentId"], "pay_42");
    assert_eq!(order["fulfilled"], false);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (app, _) = common::app(common::test_config("http://127.0.0.1:9"));
    let response = app.oneshot(get("/api/orders/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Order not found");
}

#[tokio::test]
async fn legacy_aliases_route_to_their_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cryptomus/v1/payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": 0,
            "result": {"uuid": "inv-9", "url": "https://pay.cryptomus.com/pay/inv-9"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/coingate/v2/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "payment_url": "https://pay.coingate.com/invoice/7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = common::app(common::test_config(&server.uri()));

    let response = app
        .clone()
        .oneshot(post_json("/api/cryptomus/create-invoice", &common::checkout_body("tajne-tehnike")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["paymentUrl"], "https://pay.cryptomus.com/pay/inv-9");
    assert!(body["orderId"].as_str().unwrap().starts_with("cryptomus_"));

    let response = app
        .oneshot(post_json("/api/coingate/create-order", &common::checkout_body("tajne-tehnike")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["paymentId"], "7");
}

#[tokio::test]
async fn missing_customer_fields_are_rejected_before_the_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = common::app(common::test_config(&server.uri()));
    let mut body = common::checkout_body("tajne-tehnike");
    body["customerCity"] = json!("   ");

    let response = app
        .oneshot(post_json("/api/atlos/create-payment", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].as_str().unwrap().contains("city"));
}

#[tokio::test]
async fn tampered_amount_is_rejected() {
    let (app, _) = common::app(common::test_config("http://127.0.0.1:9"));
    let mut body = common::checkout_body("zagarantovan-posao");
    body["amount"] = json!(1.0);

    let response = app
        .oneshot(post_json("/api/atlos/create-payment", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_package_is_rejected() {
    let (app, _) = common::app(common::test_config("http://127.0.0.1:9"));
    let response = app
        .oneshot(post_json("/api/atlos/create-payment", &common::checkout_body("vip")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unparseable_body_is_a_bad_request() {
    let (app, _) = common::app(common::test_config("http://127.0.0.1:9"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/atlos/create-payment")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn unknown_gateway_is_not_found() {
    let (app, _) = common::app(common::test_config("http://127.0.0.1:9"));
    let response = app
        .oneshot(post_json("/api/paypal/create-payment", &common::checkout_body("tajne-tehnike")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gateway_credential_rejection_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad api key"})))
        .mount(&server)
        .await;

    let (app, _) = common::app(common::test_config(&server.uri()));
    let response = app
        .oneshot(post_json("/api/atlos/create-payment", &common::checkout_body("tajne-tehnike")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Payment provider rejected credentials");
}

#[tokio::test]
async fn gateway_failure_maps_to_internal_error_without_leaking_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded: key=secret"))
        .mount(&server)
        .await;

    let (app, state) = common::app(common::test_config(&server.uri()));
    let mut body = common::checkout_body("tajne-tehnike");
    body["orderId"] = json!("kz_failed");

    let response = app
        .oneshot(post_json("/api/atlos/create-payment", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Failed to create payment");
    assert_eq!(body["details"], "non_ok_response");
    assert!(state.orders.get(&"kz_failed".into()).is_none());
}

#[tokio::test]
async fn missing_gateway_url_in_response_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "new"})))
        .mount(&server)
        .await;

    let (app, _) = common::app(common::test_config(&server.uri()));
    let response = app
        .oneshot(post_json("/api/coingate/create-payment", &common::checkout_body("tajne-tehnike")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "no_payment_url");
}

#[tokio::test]
async fn offers_list_exposes_catalog() {
    let (app, _) = common::app(common::test_config("http://127.0.0.1:9"));
    let response = app.oneshot(get("/api/offers")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let offers = common::body_json(response).await;
    let ids: Vec<&str> = offers
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["tajne-tehnike", "live-mentorship", "zagarantovan-posao"]);
    assert_eq!(offers[0]["price"], "14.97");
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let (app, _) = common::app(common::test_config("http://127.0.0.1:9"));

    let response = app.clone().oneshot(get("/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/api/health")).await.unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "healthy");

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
