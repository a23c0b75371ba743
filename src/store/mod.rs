//! Checkout session storage
mod memory;
mod postgres;

pub use memory::InMemoryCheckoutStore;
pub use postgres::PgCheckoutStore;

use async_trait::async_trait;

use crate::domain::aggregates::CheckoutState;
use crate::Result;

#[async_trait]
pub trait CheckoutStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<CheckoutState>>;
    async fn save(&self, session_id: &str, state: &CheckoutState) -> Result<()>;
    /// Returns whether a session was removed.
    async fn remove(&self, session_id: &str) -> Result<bool>;
}
