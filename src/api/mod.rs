//! HTTP surface of the checkout service

mod cards;
mod checkout;
mod orders;

use axum::{async_trait, extract::FromRequestParts, http::{header, request::Parts, StatusCode}, response::{IntoResponse, Response}, routing::{delete, get, post, put}, Json, Router};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::client::{CommerceApi, ShopperToken};
use crate::config::ShopSettings;
use crate::dispatch::OrderDispatcher;
use crate::domain::aggregates::CartError;
use crate::messaging::EventPublisher;
use crate::pricing::TotalCalculator;
use crate::store::CheckoutStore;
use crate::CheckoutError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CheckoutStore>,
    pub api: Arc<dyn CommerceApi>,
    pub dispatcher: OrderDispatcher,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(store: Arc<dyn CheckoutStore>, api: Arc<dyn CommerceApi>, shop: &ShopSettings, events: EventPublisher) -> Self {
        let calculator = TotalCalculator::new(&shop.currency, shop.free_shipping);
        let dispatcher = OrderDispatcher::new(api.clone(), calculator, shop.gateways.clone(), &shop.language, events.clone());
        Self { store, api, dispatcher, events }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-checkout"})) }))
        .route("/api/v1/checkout", post(checkout::start_session))
        .route("/api/v1/checkout/:session", get(checkout::get_checkout).delete(checkout::clear_session))
        .route("/api/v1/checkout/:session/items", post(checkout::add_item))
        .route("/api/v1/checkout/:session/items/:product_id", put(checkout::update_item).delete(checkout::remove_item))
        .route("/api/v1/checkout/:session/coupon", put(checkout::apply_coupon).delete(checkout::clear_coupon))
        .route("/api/v1/checkout/:session/wallet", put(checkout::set_wallet))
        .route("/api/v1/checkout/:session/details", put(checkout::update_details))
        .route("/api/v1/checkout/:session/gateway", put(checkout::set_gateway))
        .route("/api/v1/checkout/:session/payment-options", get(checkout::payment_options))
        .route("/api/v1/checkout/:session/verify", post(checkout::verify))
        .route("/api/v1/checkout/:session/orders", post(checkout::place_order))
        .route("/api/v1/orders/:tracking_number", get(orders::get_order))
        .route("/api/v1/orders/:tracking_number/payment-intent", post(orders::pay_now))
        .route("/api/v1/cards", get(cards::list_cards).post(cards::add_card))
        .route("/api/v1/cards/:id", delete(cards::delete_card))
        .route("/api/v1/cards/:id/default", put(cards::set_default_card))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Shopper credentials from the `Authorization` header; anonymous when absent.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ShopperToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ShopperToken::from_authorization)
            .unwrap_or_default())
    }
}

/// Error returned by handlers, rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError(CheckoutError);

impl<E: Into<CheckoutError>> From<E> for ApiError {
    fn from(e: E) -> Self { Self(e.into()) }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            CheckoutError::Validation(_) | CheckoutError::Coupon(_) | CheckoutError::GatewayNotOffered(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutError::Cart(CartError::ItemNotFound) | CheckoutError::SessionNotFound => StatusCode::NOT_FOUND,
            CheckoutError::Cart(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutError::StaleVerification(_) | CheckoutError::PaymentNotPending(_) => StatusCode::CONFLICT,
            CheckoutError::Remote { status, .. } if (400..500).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            CheckoutError::Remote { .. } | CheckoutError::Transport(_) | CheckoutError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            CheckoutError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Unauthorized => StatusCode::UNAUTHORIZED,
            CheckoutError::StorageError(_) | CheckoutError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "message": self.0.to_string() }))).into_response()
    }
}

pub(crate) fn invalid_request(errors: validator::ValidationErrors) -> ApiError {
    ApiError(CheckoutError::Validation(crate::dispatch::OrderValidationError::Invalid(errors.to_string())))
}
