use async_trait::async_trait;
use sqlx::PgPool;

use super::CheckoutStore;
use crate::domain::aggregates::CheckoutState;
use crate::{CheckoutError, Result};

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self { CheckoutError::StorageError(e.to_string()) }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(e: serde_json::Error) -> Self { CheckoutError::StorageError(e.to_string()) }
}

/// Sessions kept as JSONB rows in `checkout_sessions`.
#[derive(Clone)]
pub struct PgCheckoutStore {
    db: PgPool,
}

impl PgCheckoutStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore {
    async fn load(&self, session_id: &str) -> Result<Option<CheckoutState>> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as("SELECT state FROM checkout_sessions WHERE session_id = $1")
            .bind(session_id).fetch_optional(&self.db).await?;
        row.map(|(state,)| serde_json::from_value(state).map_err(CheckoutError::from)).transpose()
    }

    async fn save(&self, session_id: &str, state: &CheckoutState) -> Result<()> {
        sqlx::query("INSERT INTO checkout_sessions (session_id, state, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (session_id) DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()")
            .bind(session_id).bind(serde_json::to_value(state)?).execute(&self.db).await?;
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM checkout_sessions WHERE session_id = $1").bind(session_id).execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }
}
