//! Domain events and their in-process distribution.
//!
//! Services publish an [`EventEnvelope`] after a mutation has been saved;
//! subscribers (the activity feed, log sinks) consume them from a bus.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
