use thiserror::Error;

use stockflow_core::DomainError;

use crate::export::ExportError;
use crate::repository::RepositoryError;

/// Failure of an application service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A uniqueness constraint (SKU, serial number) would be violated.
    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("store failure: {0}")]
    Store(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::Domain(DomainError::not_found(what))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Concurrency(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            RepositoryError::Poisoned => ServiceError::Store("repository lock poisoned".to_string()),
            RepositoryError::Unavailable(msg) => ServiceError::Store(msg),
        }
    }
}

impl From<ExportError> for ServiceError {
    fn from(value: ExportError) -> Self {
        ServiceError::Store(value.to_string())
    }
}
