//! Client side of the commerce API
//!
//! The commerce backend owns orders, payments and cards. [`CommerceApi`] is the seam the
//! rest of the crate talks to; [`HttpCommerceApi`] is the production implementation.

mod http;

pub use http::HttpCommerceApi;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::aggregates::{Address, Order, OrderInput, OrderedProduct, VerifiedCheckoutResponse};
use crate::domain::value_objects::TrackingNumber;
use crate::payment::PaymentGateway;
use crate::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifyCheckoutInput {
    pub amount: Decimal,
    pub products: Vec<OrderedProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentInfo {
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub is_redirect: bool,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl PaymentIntentInfo {
    /// URL to send the shopper to, when the gateway hosts its own payment page.
    pub fn redirect(&self) -> Option<&str> {
        if !self.is_redirect { return None; }
        self.redirect_url.as_deref().filter(|url| !url.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub payment_gateway: Option<PaymentGateway>,
    #[serde(default)]
    pub payment_intent_info: PaymentIntentInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub tracking_number: Option<String>,
    pub payment_gateway: PaymentGateway,
    #[serde(default)]
    pub payment_intent: Option<PaymentIntent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub tracking_number: String,
    pub payment_gateway: PaymentGateway,
    #[serde(default)]
    pub payment_intent_info: PaymentIntentInfo,
}

/// Card saved with the shop's online gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub method_key: String,
    #[serde(default)]
    pub default_card: bool,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveCardInput {
    /// Gateway-side payment method token.
    pub method_key: String,
    #[serde(default)]
    pub default_card: bool,
}

/// Bearer token of the shopper behind a request, forwarded as-is to the commerce API.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ShopperToken(Option<String>);

impl ShopperToken {
    pub fn anonymous() -> Self { Self(None) }

    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into().trim().to_string();
        if token.is_empty() { Self(None) } else { Self(Some(token)) }
    }

    /// Reads an `Authorization: Bearer <token>` header value.
    pub fn from_authorization(value: &str) -> Self {
        match value.trim().split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => Self::bearer(token),
            _ => Self::anonymous(),
        }
    }

    pub fn token(&self) -> Option<&str> { self.0.as_deref() }
    pub fn is_anonymous(&self) -> bool { self.0.is_none() }
}

impl fmt::Debug for ShopperToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_anonymous() { "ShopperToken(anonymous)" } else { "ShopperToken(***)" })
    }
}

/// Calls made on behalf of `shopper`. Order lookups and cards carry only the shopper's
/// token; verification and order creation fall back to the service token for guests.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    async fn verify_checkout(&self, shopper: &ShopperToken, input: &VerifyCheckoutInput) -> Result<VerifiedCheckoutResponse>;
    async fn create_order(&self, shopper: &ShopperToken, input: &OrderInput) -> Result<CreateOrderResponse>;
    async fn get_payment_intent(&self, shopper: &ShopperToken, tracking_number: &TrackingNumber) -> Result<PaymentIntentResponse>;
    async fn get_order(&self, shopper: &ShopperToken, tracking_number: &TrackingNumber) -> Result<Order>;
    async fn cards(&self, shopper: &ShopperToken) -> Result<Vec<Card>>;
    async fn save_card(&self, shopper: &ShopperToken, input: &SaveCardInput) -> Result<Card>;
    async fn set_default_card(&self, shopper: &ShopperToken, card_id: &str) -> Result<Card>;
    async fn delete_card(&self, shopper: &ShopperToken, card_id: &str) -> Result<()>;
}
