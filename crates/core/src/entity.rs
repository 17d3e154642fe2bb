//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Used for records owned by an aggregate (purchase order lines, maintenance
/// log entries) that still need a stable identity for lookups.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
