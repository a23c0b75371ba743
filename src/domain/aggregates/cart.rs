//! Cart Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::value_objects::Quantity;

/// Largest unit price accepted into a cart.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub quantity: Quantity,
    pub unit_price: Decimal,
    #[serde(default)]
    pub is_digital: bool,
}

impl CartItem {
    pub fn line_total(&self) -> Result<Decimal, CartError> {
        self.unit_price.checked_mul(Decimal::from(self.quantity.value())).ok_or(CartError::AmountOverflow)
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Sum of all line totals.
    pub fn total(&self) -> Result<Decimal, CartError> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.line_total()?).ok_or(CartError::AmountOverflow))
    }

    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity.is_zero() { return Err(CartError::InvalidQuantity); }
        if item.unit_price.is_sign_negative() { return Err(CartError::NegativePrice); }
        if item.unit_price > MAX_UNIT_PRICE { return Err(CartError::PriceTooLarge); }
        let before = self.items.clone();
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = existing.quantity.add(item.quantity.value());
            existing.unit_price = item.unit_price;
        } else {
            self.items.push(item);
        }
        self.keep_if_summable(before)
    }

    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        let before = self.items.clone();
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        if quantity == 0 { self.items.retain(|i| i.product_id != product_id); }
        else { item.quantity = Quantity::new(quantity); }
        self.keep_if_summable(before)
    }

    /// Restores `before` when the edited cart can no longer be totalled.
    fn keep_if_summable(&mut self, before: Vec<CartItem>) -> Result<(), CartError> {
        if let Err(e) = self.total() {
            self.items = before;
            return Err(e);
        }
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); }

    /// Items not listed in `unavailable`, in cart order.
    pub fn available_items<'a>(&'a self, unavailable: &'a [String]) -> impl Iterator<Item = &'a CartItem> + 'a {
        self.items.iter().filter(move |i| !unavailable.contains(&i.product_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item not found")]
    ItemNotFound,
    #[error("Quantity must be greater than zero")]
    InvalidQuantity,
    #[error("Unit price cannot be negative")]
    NegativePrice,
    #[error("Unit price exceeds the maximum of 1000000000")]
    PriceTooLarge,
    #[error("Amount exceeds the supported range")]
    AmountOverflow,
}
