use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use stockflow_core::TransactionId;
use stockflow_inventory::{Transaction, TransactionFilter};

use super::{RepositoryError, TransactionLog};

/// In-memory append-only ledger.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    entries: RwLock<Vec<Transaction>>,
    sequence: AtomicU64,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn append_all(&self, transactions: Vec<Transaction>) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().map_err(|_| RepositoryError::Poisoned)?;

        for (i, txn) in transactions.iter().enumerate() {
            let seen = entries.iter().chain(&transactions[..i]).any(|t| t.id == txn.id);
            if seen {
                return Err(RepositoryError::Concurrency(format!(
                    "transaction {} already recorded",
                    txn.id
                )));
            }
        }

        entries.extend(transactions);
        Ok(())
    }

    fn get(&self, id: TransactionId) -> Result<Option<Transaction>, RepositoryError> {
        let entries = self.entries.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(entries.iter().find(|t| t.id == id).cloned())
    }

    fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, RepositoryError> {
        let entries = self.entries.read().map_err(|_| RepositoryError::Poisoned)?;

        // Appends for different items may land slightly out of sequence order.
        let mut matched: Vec<Transaction> = entries
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(matched)
    }
}
