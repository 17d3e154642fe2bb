//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; to
/// "modify" one, build a new one. `Sku` and `PoNumber` are the value objects
/// in this workspace.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
