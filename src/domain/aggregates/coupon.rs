//! Coupon applied to a checkout session

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponType {
    #[default]
    Fixed,
    Percentage,
    FreeShipping,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    #[serde(rename = "type", default)]
    pub coupon_type: CouponType,
    /// Percent for `Percentage`, flat value for `Fixed`, ignored for `FreeShipping`.
    #[serde(default)]
    pub amount: Decimal,
}

impl Coupon {
    pub fn new(id: impl Into<String>, code: impl Into<String>, coupon_type: CouponType, amount: Decimal) -> Result<Self, CouponError> {
        let code = code.into().trim().to_uppercase();
        if code.is_empty() { return Err(CouponError::EmptyCode); }
        if amount.is_sign_negative() { return Err(CouponError::NegativeAmount); }
        Ok(Self { id: id.into(), code, coupon_type, amount })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Coupon code is empty")]
    EmptyCode,
    #[error("Coupon amount cannot be negative")]
    NegativeAmount,
}
