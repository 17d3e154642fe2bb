//! Storage abstractions the services read and write through.
//!
//! Aggregates are stored as whole snapshots with an optimistic version
//! check; the stock ledger is an append-only log.

mod in_memory;
mod ledger;

use std::sync::Arc;

use thiserror::Error;

use stockflow_core::{ExpectedVersion, TransactionId};
use stockflow_inventory::{Transaction, TransactionFilter};

pub use in_memory::InMemoryRepository;
pub use ledger::InMemoryTransactionLog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("repository lock poisoned")]
    Poisoned,

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot store for one aggregate type, keyed by its id.
pub trait Repository<K, V>: Send + Sync {
    fn get(&self, id: &K) -> Result<Option<V>, RepositoryError>;

    /// Insert or replace `value`.
    ///
    /// `expected` is checked against the stored version (0 when absent).
    fn save(&self, value: V, expected: ExpectedVersion) -> Result<(), RepositoryError>;

    fn list(&self) -> Result<Vec<V>, RepositoryError>;

    /// Remove and return the stored value, if any.
    fn delete(&self, id: &K) -> Result<Option<V>, RepositoryError>;
}

impl<K, V, S> Repository<K, V> for Arc<S>
where
    S: Repository<K, V> + ?Sized,
{
    fn get(&self, id: &K) -> Result<Option<V>, RepositoryError> {
        (**self).get(id)
    }

    fn save(&self, value: V, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        (**self).save(value, expected)
    }

    fn list(&self) -> Result<Vec<V>, RepositoryError> {
        (**self).list()
    }

    fn delete(&self, id: &K) -> Result<Option<V>, RepositoryError> {
        (**self).delete(id)
    }
}

/// Append-only stock ledger.
///
/// Entries survive deletion of the item they reference.
pub trait TransactionLog: Send + Sync {
    /// Reserve the next ledger sequence number (starts at 1).
    fn next_sequence(&self) -> u64;

    /// Append a batch of entries. Either all of them are recorded or none.
    fn append_all(&self, transactions: Vec<Transaction>) -> Result<(), RepositoryError>;

    fn get(&self, id: TransactionId) -> Result<Option<Transaction>, RepositoryError>;

    /// Matching entries, newest first.
    fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, RepositoryError>;
}

impl<S> TransactionLog for Arc<S>
where
    S: TransactionLog + ?Sized,
{
    fn next_sequence(&self) -> u64 {
        (**self).next_sequence()
    }

    fn append_all(&self, transactions: Vec<Transaction>) -> Result<(), RepositoryError> {
        (**self).append_all(transactions)
    }

    fn get(&self, id: TransactionId) -> Result<Option<Transaction>, RepositoryError> {
        (**self).get(id)
    }

    fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, RepositoryError> {
        (**self).query(filter)
    }
}
