//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

use opensase_checkout::api::{self, AppState};
use opensase_checkout::client::{Card, CommerceApi, CreateOrderResponse, PaymentIntentResponse, SaveCardInput, ShopperToken, VerifyCheckoutInput};
use opensase_checkout::config::ShopSettings;
use opensase_checkout::domain::aggregates::{CartItem, Order, OrderInput, VerifiedCheckoutResponse};
use opensase_checkout::domain::value_objects::{Quantity, TrackingNumber};
use opensase_checkout::messaging::EventPublisher;
use opensase_checkout::payment::GatewaySettings;
use opensase_checkout::pricing::FreeShippingPolicy;
use opensase_checkout::store::{CheckoutStore, InMemoryCheckoutStore};
use opensase_checkout::{CheckoutError, Result};

/// In-process stand-in for the commerce API.
#[derive(Default)]
pub struct FakeCommerceApi {
    pub verified: Mutex<VerifiedCheckoutResponse>,
    pub create_response: Mutex<Option<CreateOrderResponse>>,
    pub orders: Mutex<Vec<Order>>,
    pub intent: Mutex<Option<PaymentIntentResponse>>,
    pub cards: Mutex<Vec<Card>>,
    pub created: Mutex<Vec<OrderInput>>,
    pub verify_calls: Mutex<Vec<VerifyCheckoutInput>>,
    /// Token seen by each call, in call order.
    pub tokens: Mutex<Vec<Option<String>>>,
    /// Session the shopper edits while a verify or create-order call is in flight.
    pub concurrent_edit: Mutex<Option<(Arc<InMemoryCheckoutStore>, String)>>,
}

impl FakeCommerceApi {
    pub fn created_orders(&self) -> Vec<OrderInput> { self.created.lock().unwrap().clone() }

    pub fn seen_tokens(&self) -> Vec<Option<String>> { self.tokens.lock().unwrap().clone() }

    fn record(&self, shopper: &ShopperToken) { self.tokens.lock().unwrap().push(shopper.token().map(str::to_string)); }

    /// Adds an item to the watched session, as a second browser tab would.
    async fn edit_concurrently(&self) {
        let target = self.concurrent_edit.lock().unwrap().clone();
        let Some((store, session)) = target else { return };
        let mut state = store.load(&session).await.unwrap().unwrap();
        state
            .add_item(CartItem { product_id: "P-LATE".into(), name: "Late".into(), quantity: Quantity::new(1), unit_price: Decimal::ONE, is_digital: false })
            .unwrap();
        store.save(&session, &state).await.unwrap();
    }
}

#[async_trait]
impl CommerceApi for FakeCommerceApi {
    async fn verify_checkout(&self, shopper: &ShopperToken, input: &VerifyCheckoutInput) -> Result<VerifiedCheckoutResponse> {
        self.record(shopper);
        self.verify_calls.lock().unwrap().push(input.clone());
        self.edit_concurrently().await;
        Ok(self.verified.lock().unwrap().clone())
    }

    async fn create_order(&self, shopper: &ShopperToken, input: &OrderInput) -> Result<CreateOrderResponse> {
        self.record(shopper);
        self.created.lock().unwrap().push(input.clone());
        self.edit_concurrently().await;
        self.create_response
            .lock()
            .unwrap()
            .clone()
            .ok_or(CheckoutError::Remote { status: 500, message: "Something went wrong".into() })
    }

    async fn get_payment_intent(&self, shopper: &ShopperToken, _tracking_number: &TrackingNumber) -> Result<PaymentIntentResponse> {
        self.record(shopper);
        self.intent.lock().unwrap().clone().ok_or(CheckoutError::Remote { status: 404, message: "NOT_FOUND".into() })
    }

    async fn get_order(&self, shopper: &ShopperToken, tracking_number: &TrackingNumber) -> Result<Order> {
        self.record(shopper);
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.tracking_number == tracking_number.as_str())
            .cloned()
            .ok_or(CheckoutError::Remote { status: 404, message: "NOT_FOUND".into() })
    }

    async fn cards(&self, shopper: &ShopperToken) -> Result<Vec<Card>> {
        self.record(shopper);
        Ok(self.cards.lock().unwrap().clone())
    }

    async fn save_card(&self, shopper: &ShopperToken, input: &SaveCardInput) -> Result<Card> {
        self.record(shopper);
        let card = Card { id: "card_1".into(), method_key: input.method_key.clone(), default_card: input.default_card, last4: Some("4242".into()), network: Some("visa".into()), expires: None, owner_name: None };
        self.cards.lock().unwrap().push(card.clone());
        Ok(card)
    }

    async fn set_default_card(&self, shopper: &ShopperToken, card_id: &str) -> Result<Card> {
        self.record(shopper);
        let mut cards = self.cards.lock().unwrap();
        for card in cards.iter_mut() { card.default_card = card.id == card_id; }
        cards.iter().find(|c| c.id == card_id).cloned().ok_or(CheckoutError::Remote { status: 404, message: "NOT_FOUND".into() })
    }

    async fn delete_card(&self, shopper: &ShopperToken, card_id: &str) -> Result<()> {
        self.record(shopper);
        self.cards.lock().unwrap().retain(|c| c.id != card_id);
        Ok(())
    }
}

pub fn shop(gateway: Option<&str>) -> ShopSettings {
    ShopSettings {
        currency: "USD".into(),
        language: "en".into(),
        gateways: GatewaySettings { payment_gateway: gateway.map(str::to_string), use_cash_on_delivery: Some(true) },
        free_shipping: FreeShippingPolicy { enabled: true, threshold: Decimal::from(500) },
    }
}

pub fn test_app(api: Arc<FakeCommerceApi>, shop: &ShopSettings) -> axum::Router {
    test_app_with_store(api, shop, Arc::new(InMemoryCheckoutStore::new()))
}

pub fn test_app_with_store(api: Arc<FakeCommerceApi>, shop: &ShopSettings, store: Arc<InMemoryCheckoutStore>) -> axum::Router {
    let state = AppState::new(store, api, shop, EventPublisher::disabled());
    api::router(state)
}

pub async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_as(app, None, method, uri, body).await
}

/// Sends a request carrying `Authorization: Bearer <token>` when `token` is set.
pub async fn send_as(app: &axum::Router, token: Option<&str>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty)).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(json!({}));
    (status, body)
}

pub fn amount(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not an amount: {other}"),
    }
}
