use axum::{extract::{Path, State}, Json};
use serde::Serialize;

use super::{ApiError, AppState};
use crate::client::ShopperToken;
use crate::dispatch::DispatchOutcome;
use crate::domain::aggregates::Order;
use crate::domain::value_objects::TrackingNumber;
use crate::CheckoutError;

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    /// Drives the "Pay now" action on the order page.
    pub payment_pending: bool,
}

fn tracking_number(raw: String) -> Result<TrackingNumber, ApiError> {
    TrackingNumber::new(raw.as_str()).ok_or_else(|| CheckoutError::InvalidIdentifier(raw).into())
}

pub async fn get_order(State(app): State<AppState>, shopper: ShopperToken, Path(raw): Path<String>) -> Result<Json<OrderView>, ApiError> {
    let order = app.api.get_order(&shopper, &tracking_number(raw)?).await?;
    let payment_pending = order.is_payment_pending();
    Ok(Json(OrderView { order, payment_pending }))
}

pub async fn pay_now(State(app): State<AppState>, shopper: ShopperToken, Path(raw): Path<String>) -> Result<Json<DispatchOutcome>, ApiError> {
    let outcome = app.dispatcher.pay_now(&shopper, &tracking_number(raw)?).await?;
    Ok(Json(outcome))
}
