//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use crate::payment::PaymentGateway;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Checkout(CheckoutEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Checkout(CheckoutEvent::CouponApplied { .. }) => "checkout.coupon_applied",
            Self::Checkout(CheckoutEvent::Verified { .. }) => "checkout.verified",
            Self::Checkout(CheckoutEvent::VerificationDiscarded { .. }) => "checkout.verification_discarded",
            Self::Order(OrderEvent::Placed { .. }) => "checkout.order_placed",
            Self::Order(OrderEvent::PaymentRequested { .. }) => "checkout.payment_requested",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutEvent {
    CouponApplied { session_id: String, code: String },
    Verified { session_id: String, revision: u64, unavailable: usize },
    VerificationDiscarded { session_id: String, requested: u64, current: u64 },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { session_id: String, tracking_number: String, gateway: PaymentGateway, total: Decimal },
    PaymentRequested { tracking_number: String, gateway: PaymentGateway },
}
