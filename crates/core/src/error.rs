//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is recoverable at the call site: the rule that produced it
/// left the entity unmodified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field is missing or a value is malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Applying a movement would take stock below zero.
    #[error("insufficient stock: requested {requested}, available {available}")]
    NegativeStock { requested: i64, available: i64 },

    /// The operation is not permitted in the entity's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced item, order or asset does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflict occurred (stale version, duplicate key).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn negative_stock(requested: i64, available: i64) -> Self {
        Self::NegativeStock {
            requested,
            available,
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NegativeStock { .. } => "negative_stock",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
        }
    }
}

/// Reject blank strings for required fields.
pub fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_stock_message_names_both_quantities() {
        let err = DomainError::negative_stock(6, 5);
        assert_eq!(err.to_string(), "insufficient stock: requested 6, available 5");
        assert_eq!(err.code(), "negative_stock");
    }

    #[test]
    fn require_text_rejects_whitespace() {
        assert!(require_text("name", "  ").is_err());
        assert!(require_text("name", "Drill").is_ok());
    }
}
