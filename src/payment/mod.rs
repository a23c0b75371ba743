//! Payment gateway selection
pub mod gateway;
pub mod selector;

pub use gateway::{CheckoutForm, PaymentGateway, PaymentMethodInfo, PaymentModal};
pub use selector::{select_gateways, GatewaySettings, PaymentOptions};
