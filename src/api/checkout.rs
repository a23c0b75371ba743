use axum::{extract::{Path, State}, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{invalid_request, ApiError, AppState};
use crate::client::ShopperToken;
use crate::dispatch::DispatchOutcome;
use crate::domain::aggregates::{Address, CartItem, CheckoutState, Coupon, CouponType, DeliveryTime};
use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::value_objects::Quantity;
use crate::payment::{select_gateways, PaymentGateway, PaymentOptions};
use crate::pricing::CheckoutSummary;
use crate::CheckoutError;

#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub session_id: String,
    pub state: CheckoutState,
    pub summary: CheckoutSummary,
    /// `false` once the wallet covers the whole total.
    pub show_payment_grid: bool,
}

fn view(app: &AppState, session_id: String, state: CheckoutState) -> Result<CheckoutView, ApiError> {
    let summary = app.dispatcher.calculator().summarize(&state)?;
    let show_payment_grid = !(state.use_wallet() && summary.is_wallet_only());
    Ok(CheckoutView { session_id, state, summary, show_payment_grid })
}

/// Loads a session, starting a fresh one with the shop's default gateway.
async fn load_or_new(app: &AppState, session_id: &str) -> Result<CheckoutState, ApiError> {
    if let Some(state) = app.store.load(session_id).await? {
        return Ok(state);
    }
    let mut state = CheckoutState::new();
    state.payment_gateway = Some(select_gateways(app.dispatcher.gateways()).default);
    Ok(state)
}

async fn load_existing(app: &AppState, session_id: &str) -> Result<CheckoutState, ApiError> {
    app.store.load(session_id).await?.ok_or_else(|| CheckoutError::SessionNotFound.into())
}

/// Only a state that can be summarized is saved.
async fn save_and_view(app: &AppState, session_id: String, state: CheckoutState) -> Result<Json<CheckoutView>, ApiError> {
    let view = view(app, session_id, state)?;
    app.store.save(&view.session_id, &view.state).await?;
    Ok(Json(view))
}

/// Opens a session under a freshly minted id.
pub async fn start_session(State(app): State<AppState>) -> Result<(StatusCode, Json<CheckoutView>), ApiError> {
    let session = Uuid::new_v4().to_string();
    let state = load_or_new(&app, &session).await?;
    let view = save_and_view(&app, session, state).await?;
    Ok((StatusCode::CREATED, view))
}

pub async fn get_checkout(State(app): State<AppState>, Path(session): Path<String>) -> Result<Json<CheckoutView>, ApiError> {
    let state = load_or_new(&app, &session).await?;
    Ok(Json(view(&app, session, state)?))
}

pub async fn clear_session(State(app): State<AppState>, Path(session): Path<String>) -> Result<StatusCode, ApiError> {
    app.store.remove(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub is_digital: bool,
}

pub async fn add_item(State(app): State<AppState>, Path(session): Path<String>, Json(r): Json<AddItemRequest>) -> Result<(StatusCode, Json<CheckoutView>), ApiError> {
    r.validate().map_err(invalid_request)?;
    let mut state = load_or_new(&app, &session).await?;
    state.add_item(CartItem { product_id: r.product_id, name: r.name, quantity: Quantity::new(r.quantity), unit_price: r.unit_price, is_digital: r.is_digital })?;
    let view = save_and_view(&app, session, state).await?;
    Ok((StatusCode::CREATED, view))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest { pub quantity: u32 }

pub async fn update_item(State(app): State<AppState>, Path((session, product_id)): Path<(String, String)>, Json(r): Json<UpdateQuantityRequest>) -> Result<Json<CheckoutView>, ApiError> {
    let mut state = load_existing(&app, &session).await?;
    state.update_quantity(&product_id, r.quantity)?;
    save_and_view(&app, session, state).await
}

pub async fn remove_item(State(app): State<AppState>, Path((session, product_id)): Path<(String, String)>) -> Result<Json<CheckoutView>, ApiError> {
    let mut state = load_existing(&app, &session).await?;
    state.remove_item(&product_id)?;
    save_and_view(&app, session, state).await
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub id: String,
    pub code: String,
    #[serde(rename = "type", default)]
    pub coupon_type: CouponType,
    #[serde(default)]
    pub amount: Decimal,
}

pub async fn apply_coupon(State(app): State<AppState>, Path(session): Path<String>, Json(r): Json<ApplyCouponRequest>) -> Result<Json<CheckoutView>, ApiError> {
    let coupon = Coupon::new(r.id, r.code, r.coupon_type, r.amount)?;
    let mut state = load_existing(&app, &session).await?;
    let code = coupon.code.clone();
    state.apply_coupon(coupon);
    let view = save_and_view(&app, session.clone(), state).await?;
    app.events.publish(DomainEvent::Checkout(CheckoutEvent::CouponApplied { session_id: session, code })).await;
    Ok(view)
}

pub async fn clear_coupon(State(app): State<AppState>, Path(session): Path<String>) -> Result<Json<CheckoutView>, ApiError> {
    let mut state = load_existing(&app, &session).await?;
    state.clear_coupon();
    save_and_view(&app, session, state).await
}

#[derive(Debug, Deserialize)]
pub struct WalletRequest { pub use_wallet: bool }

pub async fn set_wallet(State(app): State<AppState>, Path(session): Path<String>, Json(r): Json<WalletRequest>) -> Result<Json<CheckoutView>, ApiError> {
    let mut state = load_existing(&app, &session).await?;
    state.set_use_wallet(r.use_wallet);
    save_and_view(&app, session, state).await
}

/// Present fields replace the stored value; absent fields are left alone.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DetailsRequest {
    pub customer_contact: Option<String>,
    pub customer_name: Option<String>,
    #[validate]
    pub billing_address: Option<Address>,
    #[validate]
    pub shipping_address: Option<Address>,
    pub delivery_time: Option<DeliveryTime>,
}

pub async fn update_details(State(app): State<AppState>, Path(session): Path<String>, Json(r): Json<DetailsRequest>) -> Result<Json<CheckoutView>, ApiError> {
    r.validate().map_err(invalid_request)?;
    let mut state = load_or_new(&app, &session).await?;
    if r.customer_contact.is_some() { state.customer_contact = r.customer_contact; }
    if r.customer_name.is_some() { state.customer_name = r.customer_name; }
    if r.billing_address.is_some() { state.billing_address = r.billing_address; }
    if r.shipping_address.is_some() { state.shipping_address = r.shipping_address; }
    if r.delivery_time.is_some() { state.delivery_time = r.delivery_time; }
    save_and_view(&app, session, state).await
}

#[derive(Debug, Deserialize)]
pub struct GatewayRequest { pub payment_gateway: String }

pub async fn set_gateway(State(app): State<AppState>, Path(session): Path<String>, Json(r): Json<GatewayRequest>) -> Result<Json<CheckoutView>, ApiError> {
    let gateway = PaymentGateway::from(r.payment_gateway);
    if !select_gateways(app.dispatcher.gateways()).offers(&gateway) {
        return Err(CheckoutError::GatewayNotOffered(gateway.to_string()).into());
    }
    let mut state = load_or_new(&app, &session).await?;
    state.payment_gateway = Some(gateway);
    save_and_view(&app, session, state).await
}

pub async fn payment_options(State(app): State<AppState>, Path(_session): Path<String>) -> Json<PaymentOptions> {
    Json(select_gateways(app.dispatcher.gateways()))
}

pub async fn verify(State(app): State<AppState>, shopper: ShopperToken, Path(session): Path<String>) -> Result<Json<CheckoutView>, ApiError> {
    let state = load_existing(&app, &session).await?;
    let revision = state.revision();
    let response = app.dispatcher.verify(&shopper, &state).await?;
    let unavailable = response.unavailable_products.len();

    // The session may have changed while the remote call was in flight.
    let mut state = load_existing(&app, &session).await?;
    if let Err(stale) = state.apply_verification(revision, response) {
        warn!(session = %session, requested = stale.requested, current = stale.current, "discarding stale verification");
        app.events
            .publish(DomainEvent::Checkout(CheckoutEvent::VerificationDiscarded { session_id: session, requested: stale.requested, current: stale.current }))
            .await;
        return Err(stale.into());
    }
    let view = save_and_view(&app, session.clone(), state).await?;
    app.events.publish(DomainEvent::Checkout(CheckoutEvent::Verified { session_id: session, revision, unavailable })).await;
    Ok(view)
}

pub async fn place_order(State(app): State<AppState>, shopper: ShopperToken, Path(session): Path<String>) -> Result<(StatusCode, Json<DispatchOutcome>), ApiError> {
    let state = load_existing(&app, &session).await?;
    let revision = state.revision();
    let outcome = app.dispatcher.place_order(&session, &state, &shopper).await?;

    // Reset only the cart that was ordered; edits made meanwhile stay.
    match app.store.load(&session).await? {
        Some(mut current) if current.revision() == revision => {
            current.complete();
            app.store.save(&session, &current).await?;
            info!(session = %session, "checkout completed");
        }
        Some(current) => {
            warn!(session = %session, ordered = revision, current = current.revision(), "cart changed while the order was placed, keeping it");
        }
        None => info!(session = %session, "session cleared while the order was placed"),
    }
    Ok((StatusCode::CREATED, Json(outcome)))
}
