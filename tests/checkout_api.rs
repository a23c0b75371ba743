//! End-to-end checkout flows against the router with an in-process commerce API.

mod support;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

use opensase_checkout::client::{CreateOrderResponse, PaymentIntent, PaymentIntentInfo, PaymentIntentResponse};
use opensase_checkout::domain::aggregates::{Order, OrderStatus, PaymentStatus, VerifiedCheckoutResponse};
use opensase_checkout::payment::PaymentGateway;
use opensase_checkout::store::InMemoryCheckoutStore;
use support::{amount, send, send_as, shop, test_app, test_app_with_store, FakeCommerceApi};

fn verified(tax: i64, shipping: i64) -> VerifiedCheckoutResponse {
    VerifiedCheckoutResponse { total_tax: tax.into(), shipping_charge: shipping.into(), ..Default::default() }
}

fn address() -> serde_json::Value {
    json!({ "street_address": "12 Marina Rd", "city": "Lagos", "zip": "101001", "country": "NG" })
}

async fn fill_checkout(app: &axum::Router, session: &str, unit_price: &str) {
    let (status, _) = send(app, "POST", &format!("/api/v1/checkout/{session}/items"),
        Some(json!({ "product_id": "P1", "name": "Widget", "quantity": 2, "unit_price": unit_price }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(app, "PUT", &format!("/api/v1/checkout/{session}/details"), Some(json!({
        "customer_contact": "+2348000000000",
        "customer_name": "Ada",
        "billing_address": address(),
        "shipping_address": address(),
        "delivery_time": { "title": "Express Delivery" }
    }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = test_app(Arc::new(FakeCommerceApi::default()), &shop(None));
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_start_session_mints_id() {
    let app = test_app(Arc::new(FakeCommerceApi::default()), &shop(Some("stripe")));
    let (status, body) = send(&app, "POST", "/api/v1/checkout", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let session = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(session.len(), 36);
    assert_eq!(body["state"]["payment_gateway"], "STRIPE");

    let (status, body) = send(&app, "GET", &format!("/api/v1/checkout/{session}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], session);
}

#[tokio::test]
async fn test_cash_on_delivery_checkout() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    *api.create_response.lock().unwrap() = Some(CreateOrderResponse { tracking_number: Some("20240301001".into()), payment_gateway: PaymentGateway::CashOnDelivery, payment_intent: None });
    let app = test_app(api.clone(), &shop(None));

    fill_checkout(&app, "s1", "50").await;

    let (status, body) = send(&app, "GET", "/api/v1/checkout/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["verified"], false);
    assert_eq!(amount(&body["summary"]["total"]["amount"]), dec!(0));

    let (status, body) = send(&app, "POST", "/api/v1/checkout/s1/verify", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["summary"]["total"]["amount"]), dec!(115));

    let (status, body) = send(&app, "POST", "/api/v1/checkout/s1/orders", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["action"], "order_confirmation");
    assert_eq!(body["tracking_number"], "20240301001");

    let created = api.created_orders();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].total, dec!(115));
    assert_eq!(created[0].payment_gateway, PaymentGateway::CashOnDelivery);

    let (_, body) = send(&app, "GET", "/api/v1/checkout/s1", None).await;
    assert_eq!(body["state"]["cart"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_percentage_coupon_total() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    let app = test_app(api.clone(), &shop(None));

    send(&app, "POST", "/api/v1/checkout/s2/items", Some(json!({ "product_id": "P1", "quantity": 1, "unit_price": 100 }))).await;
    let (status, _) = send(&app, "PUT", "/api/v1/checkout/s2/coupon", Some(json!({ "id": "9", "code": "save10", "type": "PERCENTAGE", "amount": 10 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "POST", "/api/v1/checkout/s2/verify", None).await;
    assert_eq!(amount(&body["summary"]["discount"]["amount"]), dec!(10));
    assert_eq!(amount(&body["summary"]["total"]["amount"]), dec!(105));
    assert_eq!(api.verify_calls.lock().unwrap()[0].coupon_code.as_deref(), Some("SAVE10"));

    let (_, body) = send(&app, "DELETE", "/api/v1/checkout/s2/coupon", None).await;
    assert_eq!(body["summary"]["verified"], false);
}

#[tokio::test]
async fn test_free_shipping_threshold() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(0, 25);
    let app = test_app(api, &shop(None));

    fill_checkout(&app, "s3", "300").await;
    let (_, body) = send(&app, "POST", "/api/v1/checkout/s3/verify", None).await;
    assert_eq!(body["summary"]["free_shipping"], true);
    assert_eq!(amount(&body["summary"]["shipping"]["amount"]), dec!(0));
    assert_eq!(amount(&body["summary"]["total"]["amount"]), dec!(600));
}

#[tokio::test]
async fn test_missing_contact_blocks_submission() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    let app = test_app(api.clone(), &shop(None));

    send(&app, "POST", "/api/v1/checkout/s4/items", Some(json!({ "product_id": "P1", "quantity": 1, "unit_price": 10 }))).await;
    send(&app, "POST", "/api/v1/checkout/s4/verify", None).await;

    let (status, body) = send(&app, "POST", "/api/v1/checkout/s4/orders", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Contact Number Is Required");
    assert!(api.created_orders().is_empty());
}

#[tokio::test]
async fn test_online_gateway_opens_payment_form() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    *api.create_response.lock().unwrap() = Some(CreateOrderResponse {
        tracking_number: Some("T-STRIPE".into()),
        payment_gateway: PaymentGateway::Stripe,
        payment_intent: Some(PaymentIntent {
            tracking_number: Some("T-STRIPE".into()),
            payment_gateway: Some(PaymentGateway::Stripe),
            payment_intent_info: PaymentIntentInfo { client_secret: Some("pi_secret".into()), ..Default::default() },
        }),
    });
    let app = test_app(api.clone(), &shop(Some("stripe")));

    fill_checkout(&app, "s5", "50").await;
    let (_, body) = send(&app, "GET", "/api/v1/checkout/s5", None).await;
    assert_eq!(body["state"]["payment_gateway"], "STRIPE");

    send(&app, "POST", "/api/v1/checkout/s5/verify", None).await;
    let (status, body) = send(&app, "POST", "/api/v1/checkout/s5/orders", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["action"], "payment_form");
    assert_eq!(body["gateway"], "STRIPE");
    assert_eq!(body["modal"], "custom");
    assert_eq!(body["payment_intent_info"]["client_secret"], "pi_secret");
}

#[tokio::test]
async fn test_remote_failure_surfaces_message() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    let app = test_app(api.clone(), &shop(None));

    fill_checkout(&app, "s6", "50").await;
    send(&app, "POST", "/api/v1/checkout/s6/verify", None).await;
    let (status, body) = send(&app, "POST", "/api/v1/checkout/s6/orders", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Something went wrong");

    // The cart survives so the shopper can resubmit.
    let (_, body) = send(&app, "GET", "/api/v1/checkout/s6", None).await;
    assert_eq!(body["state"]["cart"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gateway_selection() {
    let app = test_app(Arc::new(FakeCommerceApi::default()), &shop(None));

    let (_, body) = send(&app, "GET", "/api/v1/checkout/s7/payment-options", None).await;
    assert_eq!(body["default"], "CASH_ON_DELIVERY");
    assert_eq!(body["methods"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "PUT", "/api/v1/checkout/s7/gateway", Some(json!({ "payment_gateway": "paypal" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, "PUT", "/api/v1/checkout/s7/gateway", Some(json!({ "payment_gateway": "cash_on_delivery" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["payment_gateway"], "CASH_ON_DELIVERY");
}

#[tokio::test]
async fn test_cart_edits_require_session() {
    let app = test_app(Arc::new(FakeCommerceApi::default()), &shop(None));
    let (status, _) = send(&app, "PUT", "/api/v1/checkout/missing/items/P1", Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/api/v1/checkout/s8/items", Some(json!({ "product_id": "P1", "quantity": 0, "unit_price": 10 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

fn order(tracking_number: &str, gateway: PaymentGateway, payment_status: PaymentStatus) -> Order {
    serde_json::from_value(json!({
        "tracking_number": tracking_number,
        "payment_gateway": gateway,
        "order_status": "order-pending",
        "payment_status": payment_status,
        "total": 115
    }))
    .unwrap()
}

#[tokio::test]
async fn test_order_view_and_pay_now() {
    let api = Arc::new(FakeCommerceApi::default());
    api.orders.lock().unwrap().push(order("T-MOLLIE", PaymentGateway::Mollie, PaymentStatus::Pending));
    api.orders.lock().unwrap().push(order("T-PAID", PaymentGateway::Stripe, PaymentStatus::Success));
    *api.intent.lock().unwrap() = Some(PaymentIntentResponse {
        tracking_number: "T-MOLLIE".into(),
        payment_gateway: PaymentGateway::Mollie,
        payment_intent_info: PaymentIntentInfo { is_redirect: true, redirect_url: Some("https://mollie.example/checkout/1".into()), ..Default::default() },
    });
    let app = test_app(api, &shop(Some("mollie")));

    let (status, body) = send(&app, "GET", "/api/v1/orders/T-MOLLIE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_pending"], true);
    assert_eq!(body["order_status"], serde_json::to_value(OrderStatus::Pending).unwrap());

    let (status, body) = send(&app, "POST", "/api/v1/orders/T-MOLLIE/payment-intent", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "external_redirect");
    assert_eq!(body["url"], "https://mollie.example/checkout/1");

    let (status, _) = send(&app, "POST", "/api/v1/orders/T-PAID/payment-intent", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/api/v1/orders/T-NONE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "NOT_FOUND");
}

#[tokio::test]
async fn test_saved_cards() {
    let api = Arc::new(FakeCommerceApi::default());
    let app = test_app(api.clone(), &shop(Some("stripe")));
    let me = Some("shopper-1");

    let (status, body) = send_as(&app, me, "POST", "/api/v1/cards", Some(json!({ "method_key": "pm_123" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["last4"], "4242");

    let (status, body) = send_as(&app, me, "PUT", "/api/v1/cards/card_1/default", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default_card"], true);

    let (_, body) = send_as(&app, me, "GET", "/api/v1/cards", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send_as(&app, me, "DELETE", "/api/v1/cards/card_1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_as(&app, me, "POST", "/api/v1/cards", Some(json!({ "method_key": "" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(api.seen_tokens().iter().all(|t| t.as_deref() == Some("shopper-1")));
}

#[tokio::test]
async fn test_cards_require_shopper_token() {
    let api = Arc::new(FakeCommerceApi::default());
    let app = test_app(api.clone(), &shop(Some("stripe")));

    for (method, uri) in [("GET", "/api/v1/cards"), ("DELETE", "/api/v1/cards/card_1"), ("PUT", "/api/v1/cards/card_1/default")] {
        let (status, _) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
    assert!(api.seen_tokens().is_empty());
}

#[tokio::test]
async fn test_order_calls_carry_shopper_token() {
    let api = Arc::new(FakeCommerceApi::default());
    api.orders.lock().unwrap().push(order("T-1", PaymentGateway::Stripe, PaymentStatus::Success));
    *api.verified.lock().unwrap() = verified(0, 0);
    let app = test_app(api.clone(), &shop(None));

    send_as(&app, Some("shopper-9"), "GET", "/api/v1/orders/T-1", None).await;
    send(&app, "GET", "/api/v1/orders/T-1", None).await;
    assert_eq!(api.seen_tokens(), vec![Some("shopper-9".to_string()), None]);
}

#[tokio::test]
async fn test_signed_in_order_skips_guest_name() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    *api.create_response.lock().unwrap() = Some(CreateOrderResponse { tracking_number: Some("T-2".into()), payment_gateway: PaymentGateway::CashOnDelivery, payment_intent: None });
    let app = test_app(api.clone(), &shop(None));

    fill_checkout(&app, "s11", "50").await;
    send(&app, "PUT", "/api/v1/checkout/s11/details", Some(json!({ "customer_name": "  " }))).await;
    send(&app, "POST", "/api/v1/checkout/s11/verify", None).await;

    let (status, body) = send(&app, "POST", "/api/v1/checkout/s11/orders", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Customer name is required");

    let (status, _) = send_as(&app, Some("shopper-3"), "POST", "/api/v1/checkout/s11/orders", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(api.seen_tokens().last().cloned().flatten().as_deref(), Some("shopper-3"));
}

#[tokio::test]
async fn test_path_like_tracking_number_rejected() {
    let api = Arc::new(FakeCommerceApi::default());
    let app = test_app(api.clone(), &shop(None));

    let (status, _) = send(&app, "GET", "/api/v1/orders/..%2Fcards%2F7", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "POST", "/api/v1/orders/..%2Fcards/payment-intent", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(api.seen_tokens().is_empty());
}

#[tokio::test]
async fn test_oversized_price_leaves_session_usable() {
    let app = test_app(Arc::new(FakeCommerceApi::default()), &shop(None));
    send(&app, "POST", "/api/v1/checkout/s12/items", Some(json!({ "product_id": "P1", "quantity": 1, "unit_price": 10 }))).await;

    let (status, _) = send(&app, "POST", "/api/v1/checkout/s12/items",
        Some(json!({ "product_id": "P2", "quantity": 2, "unit_price": "79228162514264337593543950335" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, "GET", "/api/v1/checkout/s12", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["cart"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(amount(&body["summary"]["subtotal"]["amount"]), dec!(10));
}

#[tokio::test]
async fn test_verification_for_edited_cart_is_discarded() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    let store = Arc::new(InMemoryCheckoutStore::new());
    let app = test_app_with_store(api.clone(), &shop(None), store.clone());

    send(&app, "POST", "/api/v1/checkout/s13/items", Some(json!({ "product_id": "P1", "quantity": 1, "unit_price": 20 }))).await;
    *api.concurrent_edit.lock().unwrap() = Some((store, "s13".into()));

    let (status, _) = send(&app, "POST", "/api/v1/checkout/s13/verify", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, "GET", "/api/v1/checkout/s13", None).await;
    assert_eq!(body["summary"]["verified"], false);
    assert_eq!(body["state"]["cart"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cart_edited_during_order_is_kept() {
    let api = Arc::new(FakeCommerceApi::default());
    *api.verified.lock().unwrap() = verified(5, 10);
    *api.create_response.lock().unwrap() = Some(CreateOrderResponse { tracking_number: Some("T-3".into()), payment_gateway: PaymentGateway::CashOnDelivery, payment_intent: None });
    let store = Arc::new(InMemoryCheckoutStore::new());
    let app = test_app_with_store(api.clone(), &shop(None), store.clone());

    fill_checkout(&app, "s14", "50").await;
    send(&app, "POST", "/api/v1/checkout/s14/verify", None).await;
    *api.concurrent_edit.lock().unwrap() = Some((store, "s14".into()));

    let (status, body) = send(&app, "POST", "/api/v1/checkout/s14/orders", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tracking_number"], "T-3");

    let (_, body) = send(&app, "GET", "/api/v1/checkout/s14", None).await;
    let ids: Vec<_> = body["state"]["cart"]["items"].as_array().unwrap().iter().map(|i| i["product_id"].clone()).collect();
    assert_eq!(ids, vec![json!("P1"), json!("P-LATE")]);
}
