//! Checkout totals
//!
//! Pure functions over decimal amounts plus [`TotalCalculator`], which applies them to a
//! [`CheckoutState`] and rounds every component to the shop currency's minor unit:
//!
//! ```text
//! paid_total = max(0, subtotal - discount + tax + shipping)
//! shipping   = 0 when free shipping is enabled and subtotal >= threshold
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{CartError, CartItem, CheckoutState, Coupon, CouponType};
use crate::domain::value_objects::{round_to_minor_unit, Money};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Shop-wide free shipping rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeShippingPolicy {
    pub enabled: bool,
    pub threshold: Decimal,
}

impl FreeShippingPolicy {
    pub fn applies(&self, subtotal: Decimal) -> bool { self.enabled && subtotal >= self.threshold }
}

pub fn calculate_subtotal<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> Result<Decimal, CartError> {
    items.into_iter().try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total()?).ok_or(CartError::AmountOverflow))
}

/// Discount granted by `coupon`.
///
/// `shipping` is the charge the shopper would otherwise pay, i.e. already zero when the
/// free-shipping threshold is met.
pub fn calculate_discount(coupon: Option<&Coupon>, subtotal: Decimal, shipping: Decimal) -> Decimal {
    let Some(coupon) = coupon else { return Decimal::ZERO };
    match coupon.coupon_type {
        CouponType::Percentage => subtotal / HUNDRED * coupon.amount.clamp(Decimal::ZERO, HUNDRED),
        CouponType::FreeShipping => shipping.max(Decimal::ZERO),
        CouponType::Fixed => coupon.amount.clamp(Decimal::ZERO, subtotal.max(Decimal::ZERO)),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TotalInputs {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
}

pub fn calculate_paid_total(inputs: TotalInputs) -> Result<Decimal, CartError> {
    inputs
        .subtotal
        .checked_sub(inputs.discount)
        .and_then(|t| t.checked_add(inputs.tax))
        .and_then(|t| t.checked_add(inputs.shipping))
        .map(|t| t.max(Decimal::ZERO))
        .ok_or(CartError::AmountOverflow)
}

/// Read model of every amount shown at checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub verified: bool,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub free_shipping: bool,
    pub discount: Money,
    pub total: Money,
    pub wallet_used: Money,
    pub payable: Money,
    pub unavailable_products: Vec<String>,
}

impl CheckoutSummary {
    /// Nothing is owed online: the wallet covers the total, or the total is zero.
    pub fn is_wallet_only(&self) -> bool { self.verified && self.payable.is_zero() }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TotalCalculator {
    currency: String,
    free_shipping: FreeShippingPolicy,
}

impl TotalCalculator {
    pub fn new(currency: &str, free_shipping: FreeShippingPolicy) -> Self {
        Self { currency: currency.to_uppercase(), free_shipping }
    }

    pub fn currency(&self) -> &str { &self.currency }

    fn round(&self, amount: Decimal) -> Decimal { round_to_minor_unit(amount, &self.currency) }
    fn money(&self, amount: Decimal) -> Money { Money::new(amount, &self.currency) }

    /// Fails only when an amount leaves the decimal range.
    pub fn summarize(&self, state: &CheckoutState) -> Result<CheckoutSummary, CartError> {
        let subtotal = self.round(calculate_subtotal(state.available_items())?);
        let zero = Money::zero(&self.currency);

        let Some(verified) = state.verified() else {
            return Ok(CheckoutSummary {
                verified: false,
                subtotal: self.money(subtotal),
                tax: zero.clone(),
                shipping: zero.clone(),
                free_shipping: false,
                discount: zero.clone(),
                total: zero.clone(),
                wallet_used: zero.clone(),
                payable: zero,
                unavailable_products: Vec::new(),
            });
        };

        let free_shipping = self.free_shipping.applies(subtotal);
        let tax = self.round(verified.total_tax.max(Decimal::ZERO));
        let shipping = if free_shipping { Decimal::ZERO } else { self.round(verified.shipping_charge.max(Decimal::ZERO)) };
        let discount = self.round(calculate_discount(state.coupon(), subtotal, shipping));
        let total = calculate_paid_total(TotalInputs { subtotal, tax, shipping, discount })?;

        let wallet_used = if state.use_wallet() { self.round(verified.wallet_amount.max(Decimal::ZERO)).min(total) } else { Decimal::ZERO };

        Ok(CheckoutSummary {
            verified: true,
            subtotal: self.money(subtotal),
            tax: self.money(tax),
            shipping: self.money(shipping),
            free_shipping,
            discount: self.money(discount),
            total: self.money(total),
            wallet_used: self.money(wallet_used),
            payable: self.money(total - wallet_used),
            unavailable_products: verified.unavailable_products.clone(),
        })
    }
}
