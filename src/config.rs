//! Service configuration, read from the environment (and `.env` via dotenvy).

use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::payment::GatewaySettings;
use crate::pricing::FreeShippingPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Storefront settings the checkout depends on.
#[derive(Clone, Debug)]
pub struct ShopSettings {
    pub currency: String,
    pub language: String,
    pub gateways: GatewaySettings,
    pub free_shipping: FreeShippingPolicy,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub commerce_api_url: String,
    pub commerce_api_token: Option<String>,
    pub commerce_api_timeout: Duration,
    pub shop: ShopSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(get("PORT"), "PORT", 8084u16)?;
        let commerce_api_url = get("COMMERCE_API_URL").ok_or(ConfigError::Missing("COMMERCE_API_URL"))?;
        let timeout_secs = parse_or(get("COMMERCE_API_TIMEOUT_SECS"), "COMMERCE_API_TIMEOUT_SECS", 15u64)?;

        let use_cash_on_delivery = get("USE_CASH_ON_DELIVERY").map(|v| parse_bool(&v, "USE_CASH_ON_DELIVERY")).transpose()?;
        let free_shipping_enabled = get("FREE_SHIPPING").map(|v| parse_bool(&v, "FREE_SHIPPING")).transpose()?.unwrap_or(false);
        let free_shipping_amount = parse_or(get("FREE_SHIPPING_AMOUNT"), "FREE_SHIPPING_AMOUNT", Decimal::ZERO)?;

        Ok(Self {
            port,
            database_url: get("DATABASE_URL"),
            nats_url: get("NATS_URL"),
            commerce_api_url,
            commerce_api_token: get("COMMERCE_API_TOKEN"),
            commerce_api_timeout: Duration::from_secs(timeout_secs),
            shop: ShopSettings {
                currency: get("SHOP_CURRENCY").unwrap_or_else(|| "USD".to_string()).to_uppercase(),
                language: get("SHOP_LANGUAGE").unwrap_or_else(|| "en".to_string()),
                gateways: GatewaySettings { payment_gateway: get("PAYMENT_GATEWAY"), use_cash_on_delivery },
                free_shipping: FreeShippingPolicy { enabled: free_shipping_enabled, threshold: free_shipping_amount },
            },
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name, value: v }),
        None => Ok(default),
    }
}

fn parse_bool(value: &str, name: &'static str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value: value.to_string() }),
    }
}
