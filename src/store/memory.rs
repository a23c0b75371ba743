use async_trait::async_trait;
use dashmap::DashMap;

use super::CheckoutStore;
use crate::domain::aggregates::CheckoutState;
use crate::Result;

/// Process-local sessions, lost on restart.
#[derive(Default)]
pub struct InMemoryCheckoutStore {
    sessions: DashMap<String, CheckoutState>,
}

impl InMemoryCheckoutStore {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.sessions.len() }
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }
}

#[async_trait]
impl CheckoutStore for InMemoryCheckoutStore {
    async fn load(&self, session_id: &str) -> Result<Option<CheckoutState>> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn save(&self, session_id: &str, state: &CheckoutState) -> Result<()> {
        self.sessions.insert(session_id.to_string(), state.clone());
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<bool> {
        Ok(self.sessions.remove(session_id).is_some())
    }
}
