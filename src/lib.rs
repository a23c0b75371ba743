//! OpenSASE Checkout
//!
//! Storefront checkout service in front of the OpenSASE commerce API.
//!
//! ## Features
//! - Per-session cart, coupon and wallet state
//! - Checkout totals with tax, shipping, discounts and free-shipping threshold
//! - Payment gateway selection with cash-on-delivery fallback
//! - Order placement and payment-intent dispatch
//! - Saved payment cards

pub mod api;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod messaging;
pub mod payment;
pub mod pricing;
pub mod store;

use thiserror::Error;

use crate::dispatch::OrderValidationError;
use crate::domain::aggregates::{CartError, CouponError, StaleVerification};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] OrderValidationError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    StaleVerification(#[from] StaleVerification),

    #[error("Payment gateway {0} is not offered by this shop")]
    GatewayNotOffered(String),

    #[error("Checkout session not found")]
    SessionNotFound,

    #[error("Order {0} has no payment pending")]
    PaymentNotPending(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Sign in to manage saved cards")]
    Unauthorized,

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Commerce API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from commerce API: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
