//! Infrastructure layer: repositories, write serialization, application
//! services and read-side projections.
//!
//! Domain crates stay pure; everything here composes them with storage, the
//! event bus and the clock.

pub mod clock;
pub mod error;
pub mod export;
pub mod locks;
pub mod projections;
pub mod publisher;
pub mod repository;
pub mod services;
pub mod workers;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ServiceError, ServiceResult};
pub use locks::KeyedLocks;
pub use publisher::{EventPublisher, JsonEnvelope, SharedBus};
pub use repository::{
    InMemoryRepository, InMemoryTransactionLog, Repository, RepositoryError, TransactionLog,
};
