//! Order dispatch
//!
//! Turns a checkout session into an [`OrderInput`], rejects it locally when a required
//! field is missing, submits it and tells the caller where the shopper goes next.
//! Remote failures are returned as-is; there is no retry and no idempotency key, so a
//! failed submission is recovered by the shopper submitting again.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};
use validator::Validate;

use crate::client::{CommerceApi, CreateOrderResponse, PaymentIntentInfo, ShopperToken, VerifyCheckoutInput};
use crate::domain::aggregates::{CartError, CartItem, CheckoutState, OrderInput, OrderedProduct, VerifiedCheckoutResponse};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::TrackingNumber;
use crate::messaging::EventPublisher;
use crate::payment::{select_gateways, GatewaySettings, PaymentGateway, PaymentModal};
use crate::pricing::{CheckoutSummary, TotalCalculator};
use crate::{CheckoutError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("Contact Number Is Required")]
    MissingContact,
    #[error("Gateway Is Required")]
    MissingGateway,
    #[error("Payment gateway {0} is not available")]
    GatewayNotOffered(String),
    #[error("Cart has no available items")]
    EmptyCart,
    #[error("Checkout must be verified before placing the order")]
    NotVerified,
    #[error("Billing address is required")]
    MissingBillingAddress,
    #[error("Shipping address is required")]
    MissingShippingAddress,
    #[error("Delivery time is required")]
    MissingDeliveryTime,
    #[error("Customer name is required")]
    MissingCustomerName,
    #[error("Invalid order: {0}")]
    Invalid(String),
}

/// Where the shopper is sent after a dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Cash-equivalent order; show the confirmation page.
    OrderConfirmation { tracking_number: String },
    /// Gateway hosts the payment page.
    ExternalRedirect { tracking_number: String, url: String },
    /// Open the in-app payment form for `gateway`.
    PaymentForm {
        tracking_number: String,
        gateway: PaymentGateway,
        modal: PaymentModal,
        payment_intent_info: PaymentIntentInfo,
    },
}

impl DispatchOutcome {
    fn for_intent(tracking_number: String, gateway: PaymentGateway, info: PaymentIntentInfo) -> Self {
        match info.redirect() {
            Some(url) => Self::ExternalRedirect { tracking_number, url: url.to_string() },
            None => Self::PaymentForm { tracking_number, modal: gateway.payment_modal(), gateway, payment_intent_info: info },
        }
    }

    pub fn from_created(response: CreateOrderResponse) -> Result<Self> {
        let tracking_number = response
            .tracking_number
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CheckoutError::InvalidResponse("order created without a tracking number".into()))?;

        if response.payment_gateway.is_cash_equivalent() {
            return Ok(Self::OrderConfirmation { tracking_number });
        }
        let info = response.payment_intent.map(|i| i.payment_intent_info).unwrap_or_default();
        Ok(Self::for_intent(tracking_number, response.payment_gateway, info))
    }
}

fn ordered_product(item: &CartItem) -> std::result::Result<OrderedProduct, CartError> {
    Ok(OrderedProduct {
        product_id: item.product_id.clone(),
        order_quantity: item.quantity.value(),
        unit_price: item.unit_price,
        subtotal: item.line_total()?,
    })
}

/// Assembles the order payload, checking required fields in the order a shopper fixes them.
///
/// `guest` is true when the request carries no shopper credentials.
pub fn build_order_input(
    state: &CheckoutState,
    summary: &CheckoutSummary,
    gateways: &GatewaySettings,
    language: &str,
    guest: bool,
) -> std::result::Result<OrderInput, OrderValidationError> {
    let customer_contact = state
        .customer_contact
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(OrderValidationError::MissingContact)?
        .to_string();

    let payment_gateway = if state.use_wallet() && summary.is_wallet_only() {
        PaymentGateway::FullWalletPayment
    } else {
        let gateway = state.payment_gateway.clone().ok_or(OrderValidationError::MissingGateway)?;
        if !select_gateways(gateways).offers(&gateway) {
            return Err(OrderValidationError::GatewayNotOffered(gateway.to_string()));
        }
        gateway
    };

    let items = state.available_items();
    if items.is_empty() {
        return Err(OrderValidationError::EmptyCart);
    }
    if !summary.verified {
        return Err(OrderValidationError::NotVerified);
    }

    let customer_name = state.customer_name.as_deref().map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
    let physical = !state.is_digital();
    if physical {
        if state.billing_address.is_none() { return Err(OrderValidationError::MissingBillingAddress); }
        if state.shipping_address.is_none() { return Err(OrderValidationError::MissingShippingAddress); }
        if state.delivery_time.is_none() { return Err(OrderValidationError::MissingDeliveryTime); }
        if guest && customer_name.is_none() { return Err(OrderValidationError::MissingCustomerName); }
    }

    let input = OrderInput {
        products: items
            .iter()
            .map(|i| ordered_product(i))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| OrderValidationError::Invalid(e.to_string()))?,
        amount: summary.subtotal.amount(),
        coupon_id: state.coupon().map(|c| c.id.clone()),
        discount: summary.discount.amount(),
        paid_total: summary.total.amount(),
        sales_tax: summary.tax.amount(),
        delivery_fee: summary.shipping.amount(),
        total: summary.total.amount(),
        delivery_time: state.delivery_time.as_ref().map(|d| d.title.clone()),
        customer_contact,
        customer_name,
        payment_gateway,
        use_wallet_points: state.use_wallet(),
        billing_address: state.billing_address.clone(),
        shipping_address: state.shipping_address.clone(),
        language: language.to_string(),
    };
    input.validate().map_err(|e| OrderValidationError::Invalid(e.to_string()))?;
    Ok(input)
}

pub fn verification_input(state: &CheckoutState, summary: &CheckoutSummary) -> std::result::Result<VerifyCheckoutInput, CartError> {
    Ok(VerifyCheckoutInput {
        amount: summary.subtotal.amount(),
        products: state.cart().items().iter().map(ordered_product).collect::<std::result::Result<_, _>>()?,
        coupon_code: state.coupon().map(|c| c.code.clone()),
        billing_address: state.billing_address.clone(),
        shipping_address: state.shipping_address.clone(),
    })
}

#[derive(Clone)]
pub struct OrderDispatcher {
    api: Arc<dyn CommerceApi>,
    calculator: TotalCalculator,
    gateways: GatewaySettings,
    language: String,
    events: EventPublisher,
}

impl OrderDispatcher {
    pub fn new(api: Arc<dyn CommerceApi>, calculator: TotalCalculator, gateways: GatewaySettings, language: &str, events: EventPublisher) -> Self {
        Self { api, calculator, gateways, language: language.to_string(), events }
    }

    pub fn calculator(&self) -> &TotalCalculator { &self.calculator }
    pub fn gateways(&self) -> &GatewaySettings { &self.gateways }

    /// Asks the commerce API for tax, shipping and availability of the current cart.
    #[instrument(skip_all, fields(revision = state.revision()))]
    pub async fn verify(&self, shopper: &ShopperToken, state: &CheckoutState) -> Result<VerifiedCheckoutResponse> {
        if state.cart().is_empty() {
            return Err(OrderValidationError::EmptyCart.into());
        }
        let summary = self.calculator.summarize(state)?;
        self.api.verify_checkout(shopper, &verification_input(state, &summary)?).await
    }

    /// Validates and submits the order. Nothing is sent when validation fails.
    #[instrument(skip(self, state, shopper))]
    pub async fn place_order(&self, session_id: &str, state: &CheckoutState, shopper: &ShopperToken) -> Result<DispatchOutcome> {
        let summary = self.calculator.summarize(state)?;
        let input = build_order_input(state, &summary, &self.gateways, &self.language, shopper.is_anonymous())?;
        let total = input.total;

        let response = self.api.create_order(shopper, &input).await?;
        let gateway = response.payment_gateway.clone();
        let outcome = DispatchOutcome::from_created(response)?;

        let tracking_number = match &outcome {
            DispatchOutcome::OrderConfirmation { tracking_number }
            | DispatchOutcome::ExternalRedirect { tracking_number, .. }
            | DispatchOutcome::PaymentForm { tracking_number, .. } => tracking_number.clone(),
        };
        info!(%tracking_number, %gateway, %total, "order placed");
        self.events
            .publish(DomainEvent::Order(OrderEvent::Placed { session_id: session_id.to_string(), tracking_number, gateway, total }))
            .await;
        Ok(outcome)
    }

    /// Resumes payment of an order whose online payment is still pending.
    #[instrument(skip(self, shopper))]
    pub async fn pay_now(&self, shopper: &ShopperToken, tracking_number: &TrackingNumber) -> Result<DispatchOutcome> {
        let order = self.api.get_order(shopper, tracking_number).await?;
        if !order.is_payment_pending() {
            return Err(CheckoutError::PaymentNotPending(tracking_number.to_string()));
        }
        let intent = self.api.get_payment_intent(shopper, tracking_number).await?;
        self.events
            .publish(DomainEvent::Order(OrderEvent::PaymentRequested {
                tracking_number: intent.tracking_number.clone(),
                gateway: intent.payment_gateway.clone(),
            }))
            .await;
        Ok(DispatchOutcome::for_intent(intent.tracking_number, intent.payment_gateway, intent.payment_intent_info))
    }
}
