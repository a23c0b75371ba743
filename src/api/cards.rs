//! Saved cards of the signed-in shopper.

use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::{invalid_request, ApiError, AppState};
use crate::client::{Card, SaveCardInput, ShopperToken};
use crate::CheckoutError;

fn signed_in(shopper: &ShopperToken) -> Result<(), ApiError> {
    if shopper.is_anonymous() {
        return Err(CheckoutError::Unauthorized.into());
    }
    Ok(())
}

pub async fn list_cards(State(app): State<AppState>, shopper: ShopperToken) -> Result<Json<Vec<Card>>, ApiError> {
    signed_in(&shopper)?;
    Ok(Json(app.api.cards(&shopper).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCardRequest {
    #[validate(length(min = 1))]
    pub method_key: String,
    #[serde(default)]
    pub default_card: bool,
}

pub async fn add_card(State(app): State<AppState>, shopper: ShopperToken, Json(r): Json<AddCardRequest>) -> Result<(StatusCode, Json<Card>), ApiError> {
    signed_in(&shopper)?;
    r.validate().map_err(invalid_request)?;
    let card = app.api.save_card(&shopper, &SaveCardInput { method_key: r.method_key, default_card: r.default_card }).await?;
    info!(card_id = %card.id, "payment card saved");
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn set_default_card(State(app): State<AppState>, shopper: ShopperToken, Path(id): Path<String>) -> Result<Json<Card>, ApiError> {
    signed_in(&shopper)?;
    Ok(Json(app.api.set_default_card(&shopper, &id).await?))
}

pub async fn delete_card(State(app): State<AppState>, shopper: ShopperToken, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    signed_in(&shopper)?;
    app.api.delete_card(&shopper, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
