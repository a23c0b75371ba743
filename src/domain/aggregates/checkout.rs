//! Checkout session state
//!
//! One [`CheckoutState`] exists per shopper session. Every change to the cart or the
//! coupon bumps `revision` and drops the verified response, so totals are never
//! computed from a verification of a different cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cart::{Cart, CartError, CartItem};
use super::coupon::Coupon;
use super::order::{Address, DeliveryTime};
use crate::payment::PaymentGateway;

/// Server-side recomputation of tax, shipping and availability.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedCheckoutResponse {
    #[serde(default)]
    pub total_tax: Decimal,
    #[serde(default)]
    pub shipping_charge: Decimal,
    #[serde(default)]
    pub unavailable_products: Vec<String>,
    #[serde(default)]
    pub wallet_amount: Decimal,
    #[serde(default)]
    pub wallet_currency: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutState {
    cart: Cart,
    coupon: Option<Coupon>,
    use_wallet: bool,
    verified: Option<VerifiedCheckoutResponse>,
    revision: u64,
    pub customer_contact: Option<String>,
    pub customer_name: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub delivery_time: Option<DeliveryTime>,
    pub payment_gateway: Option<PaymentGateway>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CheckoutState {
    pub fn new() -> Self { Self::default() }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn coupon(&self) -> Option<&Coupon> { self.coupon.as_ref() }
    pub fn use_wallet(&self) -> bool { self.use_wallet }
    pub fn verified(&self) -> Option<&VerifiedCheckoutResponse> { self.verified.as_ref() }
    pub fn revision(&self) -> u64 { self.revision }

    /// Ids excluded from totals by the last verification.
    pub fn unavailable_products(&self) -> &[String] {
        self.verified.as_ref().map(|v| v.unavailable_products.as_slice()).unwrap_or(&[])
    }

    pub fn available_items(&self) -> Vec<&CartItem> {
        self.cart.available_items(self.unavailable_products()).collect()
    }

    /// A checkout is digital when any available item is digital; no shipping details are needed then.
    pub fn is_digital(&self) -> bool {
        self.available_items().iter().any(|i| i.is_digital)
    }

    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        self.cart.add_item(item)?;
        self.invalidate();
        Ok(())
    }

    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        self.cart.update_quantity(product_id, quantity)?;
        self.invalidate();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<(), CartError> {
        self.cart.remove_item(product_id)?;
        self.invalidate();
        Ok(())
    }

    pub fn apply_coupon(&mut self, coupon: Coupon) {
        self.coupon = Some(coupon);
        self.invalidate();
    }

    pub fn clear_coupon(&mut self) {
        if self.coupon.take().is_some() { self.invalidate(); }
    }

    pub fn set_use_wallet(&mut self, use_wallet: bool) {
        self.use_wallet = use_wallet;
        self.touch();
    }

    /// Stores a verification requested at `revision`. Responses for an older cart are rejected.
    pub fn apply_verification(&mut self, revision: u64, response: VerifiedCheckoutResponse) -> Result<(), StaleVerification> {
        if revision != self.revision {
            return Err(StaleVerification { requested: revision, current: self.revision });
        }
        self.verified = Some(response);
        self.touch();
        Ok(())
    }

    /// Resets the session after an order has been placed.
    pub fn complete(&mut self) {
        self.cart.clear();
        self.coupon = None;
        self.use_wallet = false;
        self.payment_gateway = None;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.verified = None;
        self.revision += 1;
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Some(Utc::now()); }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cart changed while verifying (requested revision {requested}, current {current})")]
pub struct StaleVerification {
    pub requested: u64,
    pub current: u64,
}
