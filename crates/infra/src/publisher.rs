//! Post-commit event publication.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;

use stockflow_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};

pub type JsonEnvelope = EventEnvelope<JsonValue>;
pub type SharedBus = Arc<InMemoryEventBus<JsonEnvelope>>;

pub const ITEM_AGGREGATE: &str = "inventory.item";
pub const ORDER_AGGREGATE: &str = "purchasing.order";
pub const ASSET_AGGREGATE: &str = "maintenance.asset";

/// Serializes typed domain events to JSON envelopes and puts them on the bus.
///
/// Called only after the owning repository accepted the new state. Failures
/// are logged and swallowed: the mutation is already committed and the bus
/// only feeds disposable read models.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    bus: SharedBus,
}

impl EventPublisher {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    pub fn publish<E>(
        &self,
        aggregate_type: &'static str,
        aggregate_id: impl ToString,
        sequence_number: u64,
        event: &E,
    ) where
        E: Event + Serialize,
    {
        let payload = match serde_json::to_value(event) {
            Ok(v) => v,
            Err(err) => {
                warn!(event_type = event.event_type(), error = %err, "failed to serialize event");
                return;
            }
        };

        let envelope = EventEnvelope::new(
            event.event_type(),
            aggregate_id.to_string(),
            aggregate_type,
            sequence_number,
            event.occurred_at(),
            payload,
        );

        if let Err(err) = self.bus.publish(envelope) {
            warn!(event_type = event.event_type(), error = ?err, "event publication failed");
        }
    }
}
