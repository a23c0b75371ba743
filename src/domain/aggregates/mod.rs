//! Aggregates module
pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod order;

pub use cart::{Cart, CartError, CartItem};
pub use checkout::{CheckoutState, StaleVerification, VerifiedCheckoutResponse};
pub use coupon::{Coupon, CouponError, CouponType};
pub use order::{is_payment_pending, Address, DeliveryTime, Order, OrderInput, OrderStatus, OrderedProduct, PaymentStatus};
