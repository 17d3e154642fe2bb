//! `stockflow-core`: shared domain building blocks.
//!
//! Pure domain primitives only: identifiers, the error taxonomy, and the
//! aggregate/entity contracts the inventory, purchasing and maintenance
//! crates build on.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AssetId, ItemId, LineId, MaintenanceLogId, PurchaseOrderId, TransactionId};
pub use value_object::ValueObject;
