//! Picks the default gateway and the selectable set from shop settings.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::gateway::{PaymentGateway, PaymentMethodInfo};

/// Payment-related shop settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Online gateway configured for the shop, as entered by the operator.
    pub payment_gateway: Option<String>,
    /// `None` when the operator never set the flag.
    pub use_cash_on_delivery: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOptions {
    pub default: PaymentGateway,
    pub methods: Vec<PaymentMethodInfo>,
}

impl PaymentOptions {
    pub fn offers(&self, gateway: &PaymentGateway) -> bool {
        self.methods.iter().any(|m| &m.gateway == gateway)
    }
}

/// Resolves the payment grid for a shop.
///
/// A configured, recognised gateway is the default and is listed first. Cash on
/// delivery is listed when the flag is on, and is always the fallback when no
/// usable online gateway exists, so exactly one default is produced.
pub fn select_gateways(settings: &GatewaySettings) -> PaymentOptions {
    let configured = settings
        .payment_gateway
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .and_then(|name| {
            let gateway = PaymentGateway::from(name.to_string());
            if gateway.is_known() && !gateway.is_cash_equivalent() {
                Some(gateway)
            } else if gateway.is_cash_equivalent() {
                None
            } else {
                warn!(gateway = name, "unknown payment gateway configured, falling back to cash on delivery");
                None
            }
        });

    let cod_enabled = settings.use_cash_on_delivery == Some(true) || configured.is_none();

    let mut methods = Vec::with_capacity(2);
    if let Some(gateway) = &configured {
        methods.push(gateway.method_info());
    }
    if cod_enabled {
        methods.push(PaymentGateway::CashOnDelivery.method_info());
    }

    PaymentOptions { default: configured.unwrap_or(PaymentGateway::CashOnDelivery), methods }
}
