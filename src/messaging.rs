//! Publishes checkout domain events to NATS.

use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

/// Fire-and-forget event sink. Without a NATS connection events are only logged.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => Self::new(Some(client)),
            Err(e) => {
                warn!(error = %e, "NATS unavailable, checkout events will not be published");
                Self::disabled()
            }
        }
    }

    pub async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        let Some(nats) = &self.nats else {
            debug!(subject, ?event, "event not published, NATS disabled");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(subject, error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = nats.publish(subject.to_string(), payload.into()).await {
            warn!(subject, error = %e, "failed to publish event");
        }
    }
}
