//! Payment gateways known to the storefront.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A payment processor an order can be paid through.
///
/// Gateway names travel as upper-case strings (`"STRIPE"`, `"CASH_ON_DELIVERY"`).
/// Names the storefront has no form for are kept verbatim in [`PaymentGateway::Other`]
/// so orders created elsewhere still deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentGateway {
    Stripe,
    Paypal,
    Razorpay,
    Mollie,
    CashOnDelivery,
    Cash,
    FullWalletPayment,
    Other(String),
}

impl PaymentGateway {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stripe => "STRIPE",
            Self::Paypal => "PAYPAL",
            Self::Razorpay => "RAZORPAY",
            Self::Mollie => "MOLLIE",
            Self::CashOnDelivery => "CASH_ON_DELIVERY",
            Self::Cash => "CASH",
            Self::FullWalletPayment => "FULL_WALLET_PAYMENT",
            Self::Other(name) => name,
        }
    }

    /// Gateways settled without an online payment step.
    pub fn is_cash_equivalent(&self) -> bool {
        matches!(self, Self::CashOnDelivery | Self::Cash | Self::FullWalletPayment)
    }

    /// Gateways this storefront can offer for selection at checkout.
    pub fn is_known(&self) -> bool { !matches!(self, Self::Other(_)) }

    /// Display metadata for the checkout payment grid.
    pub fn method_info(&self) -> PaymentMethodInfo {
        let (name, icon, form) = match self {
            Self::Stripe => ("Stripe", Some("/payment/stripe.png"), CheckoutForm::Online),
            Self::Paypal => ("Paypal", None, CheckoutForm::Online),
            Self::Razorpay => ("RazorPay", Some("/payment/razorpay.png"), CheckoutForm::Online),
            Self::Mollie => ("Mollie", Some("/payment/mollie.png"), CheckoutForm::Online),
            Self::CashOnDelivery | Self::Cash => ("Cash On Delivery", None, CheckoutForm::CashOnDelivery),
            Self::FullWalletPayment => ("Wallet", None, CheckoutForm::CashOnDelivery),
            Self::Other(name) => (name.as_str(), None, CheckoutForm::Online),
        };
        PaymentMethodInfo { name: name.to_string(), gateway: self.clone(), icon: icon.map(str::to_string), form }
    }

    /// How the in-app payment form for an unpaid order is presented.
    pub fn payment_modal(&self) -> PaymentModal {
        match self {
            Self::Stripe => PaymentModal::Custom,
            Self::Razorpay => PaymentModal::GatewayDefault,
            _ => PaymentModal::Generic,
        }
    }
}

impl From<String> for PaymentGateway {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "STRIPE" => Self::Stripe,
            "PAYPAL" => Self::Paypal,
            "RAZORPAY" => Self::Razorpay,
            "MOLLIE" => Self::Mollie,
            "CASH_ON_DELIVERY" | "COD" => Self::CashOnDelivery,
            "CASH" => Self::Cash,
            "FULL_WALLET_PAYMENT" => Self::FullWalletPayment,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<PaymentGateway> for String {
    fn from(value: PaymentGateway) -> Self { value.as_str().to_string() }
}

impl FromStr for PaymentGateway {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self::from(s.to_string())) }
}

impl fmt::Display for PaymentGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Form rendered under the payment grid once a gateway is picked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutForm {
    CashOnDelivery,
    Online,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentModal {
    /// Storefront-rendered card form wrapped in a modal.
    Custom,
    /// Gateway SDK opens its own checkout overlay.
    GatewayDefault,
    Generic,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodInfo {
    pub name: String,
    pub gateway: PaymentGateway,
    pub icon: Option<String>,
    pub form: CheckoutForm,
}
