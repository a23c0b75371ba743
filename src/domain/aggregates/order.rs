//! Order Aggregate
//!
//! Orders are owned by the commerce backend. The storefront only assembles an
//! [`OrderInput`] and reads back [`Order`] records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::payment::PaymentGateway;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "order-pending")]
    Pending,
    #[serde(rename = "order-processing")]
    Processing,
    #[serde(rename = "order-at-local-facility")]
    AtLocalFacility,
    #[serde(rename = "order-out-for-delivery")]
    OutForDelivery,
    #[serde(rename = "order-completed")]
    Completed,
    #[serde(rename = "order-cancelled")]
    Cancelled,
    #[serde(rename = "order-refunded")]
    Refunded,
    #[serde(rename = "order-failed")]
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    #[serde(rename = "payment-pending")]
    Pending,
    #[serde(rename = "payment-processing")]
    Processing,
    #[serde(rename = "payment-success")]
    Success,
    #[serde(rename = "payment-failed")]
    Failed,
    #[serde(rename = "payment-reversal")]
    Reversal,
    #[serde(rename = "payment-cash-on-delivery")]
    CashOnDelivery,
    #[serde(rename = "payment-cash")]
    Cash,
    #[serde(rename = "payment-wallet")]
    Wallet,
    #[serde(rename = "payment-awaiting-for-approval")]
    AwaitingForApproval,
}

/// Whether the shopper still has to complete an online payment for an order.
pub fn is_payment_pending(gateway: &PaymentGateway, order_status: &OrderStatus, payment_status: &PaymentStatus) -> bool {
    !gateway.is_cash_equivalent()
        && *order_status != OrderStatus::Cancelled
        && *payment_status != PaymentStatus::Success
        && *payment_status != PaymentStatus::AwaitingForApproval
}

/// Server-side order record as returned by the commerce API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub tracking_number: String,
    #[serde(default)]
    pub customer_contact: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub sales_tax: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub paid_total: Decimal,
    #[serde(default)]
    pub total: Decimal,
    pub payment_gateway: PaymentGateway,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_payment_pending(&self) -> bool {
        is_payment_pending(&self.payment_gateway, &self.order_status, &self.payment_status)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 1))]
    pub street_address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[validate(length(min = 1))]
    pub zip: String,
    #[validate(length(min = 1))]
    pub country: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTime {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderedProduct {
    pub product_id: String,
    pub order_quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Write-once payload for the order-creation endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct OrderInput {
    #[validate(length(min = 1))]
    pub products: Vec<OrderedProduct>,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<String>,
    pub discount: Decimal,
    pub paid_total: Decimal,
    pub sales_tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    #[validate(length(min = 1))]
    pub customer_contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub payment_gateway: PaymentGateway,
    pub use_wallet_points: bool,
    #[validate]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[validate]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    pub language: String,
}
