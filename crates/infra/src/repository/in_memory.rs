use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use stockflow_core::{AggregateRoot, ExpectedVersion};

use super::{Repository, RepositoryError};

/// In-memory snapshot repository for the single-process deployment and tests.
#[derive(Debug)]
pub struct InMemoryRepository<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryRepository<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryRepository<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Repository<K, V> for InMemoryRepository<K, V>
where
    K: Clone + Eq + Hash + core::fmt::Debug + Send + Sync + 'static,
    V: AggregateRoot<Id = K> + Clone + Send + Sync + 'static,
{
    fn get(&self, id: &K) -> Result<Option<V>, RepositoryError> {
        let map = self.inner.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn save(&self, value: V, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;

        let id = value.id().clone();
        let current = map.get(&id).map(|v| v.version()).unwrap_or(0);
        if !expected.matches(current) {
            return Err(RepositoryError::Concurrency(format!(
                "{id:?}: expected {expected:?}, found {current}"
            )));
        }

        map.insert(id, value);
        Ok(())
    }

    fn list(&self) -> Result<Vec<V>, RepositoryError> {
        let map = self.inner.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    fn delete(&self, id: &K) -> Result<Option<V>, RepositoryError> {
        let mut map = self.inner.write().map_err(|_| RepositoryError::Poisoned)?;
        Ok(map.remove(id))
    }
}
