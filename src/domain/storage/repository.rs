//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Capability interface of a durable table: single-row reads and writes by
/// primary key plus a bounded ordered scan.
///
/// Backends provide no secondary indexes and no multi-row transactions;
/// `create` is the only conditional write.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Retrieves up to `limit` entities in ascending key order, starting
    /// strictly after `after` when given
    async fn list_page(&self, limit: usize, after: Option<&str>) -> Result<Vec<E>, DomainError>;

    /// Inserts an entity only if its key is free; fails with `Conflict` otherwise
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity; fails with `NotFound` if the key is missing
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Deletes an entity by its key, returns true if deleted
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }

    /// Clears all entities (use with caution)
    async fn clear(&self) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    //! Store double that fails selected operations on demand

    use super::*;
    use crate::domain::storage::StorageKey;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    /// Operations a [`MockStorage`] can be told to fail
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StorageOp {
        Get,
        List,
        Create,
        Update,
        Delete,
    }

    /// Mock storage for testing
    #[derive(Debug)]
    pub struct MockStorage<E>
    where
        E: StorageEntity,
    {
        entities: Mutex<BTreeMap<String, E>>,
        failing: Mutex<HashSet<StorageOp>>,
    }

    impl<E> Default for MockStorage<E>
    where
        E: StorageEntity,
    {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<E> MockStorage<E>
    where
        E: StorageEntity,
    {
        pub fn new() -> Self {
            Self {
                entities: Mutex::new(BTreeMap::new()),
                failing: Mutex::new(HashSet::new()),
            }
        }

        /// Make every subsequent call of `op` fail
        pub fn fail_on(&self, op: StorageOp) {
            self.failing.lock().unwrap().insert(op);
        }

        /// Let `op` succeed again
        pub fn recover(&self, op: StorageOp) {
            self.failing.lock().unwrap().remove(&op);
        }

        pub fn len(&self) -> usize {
            self.entities.lock().unwrap().len()
        }

        fn check(&self, op: StorageOp, key: &str) -> Result<(), DomainError> {
            if self.failing.lock().unwrap().contains(&op) {
                return Err(DomainError::store_failure(
                    format!("mock.{:?}", op).to_lowercase(),
                    key,
                    "simulated storage error",
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<E> Storage<E> for MockStorage<E>
    where
        E: StorageEntity + 'static,
    {
        async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
            self.check(StorageOp::Get, key.as_str())?;
            Ok(self.entities.lock().unwrap().get(key.as_str()).cloned())
        }

        async fn list(&self) -> Result<Vec<E>, DomainError> {
            self.check(StorageOp::List, "")?;
            Ok(self.entities.lock().unwrap().values().cloned().collect())
        }

        async fn list_page(
            &self,
            limit: usize,
            after: Option<&str>,
        ) -> Result<Vec<E>, DomainError> {
            self.check(StorageOp::List, after.unwrap_or(""))?;
            let entities = self.entities.lock().unwrap();

            Ok(entities
                .iter()
                .filter(|(key, _)| after.map_or(true, |a| key.as_str() > a))
                .take(limit)
                .map(|(_, e)| e.clone())
                .collect())
        }

        async fn create(&self, entity: E) -> Result<E, DomainError> {
            let key = entity.key().as_str().to_string();
            self.check(StorageOp::Create, &key)?;
            let mut entities = self.entities.lock().unwrap();

            if entities.contains_key(&key) {
                return Err(DomainError::conflict(format!(
                    "Entity with key '{}' already exists",
                    key
                )));
            }

            entities.insert(key, entity.clone());
            Ok(entity)
        }

        async fn update(&self, entity: E) -> Result<E, DomainError> {
            let key = entity.key().as_str().to_string();
            self.check(StorageOp::Update, &key)?;
            let mut entities = self.entities.lock().unwrap();

            if !entities.contains_key(&key) {
                return Err(DomainError::not_found(format!(
                    "Entity with key '{}' not found",
                    key
                )));
            }

            entities.insert(key, entity.clone());
            Ok(entity)
        }

        async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
            self.check(StorageOp::Delete, key.as_str())?;
            Ok(self.entities.lock().unwrap().remove(key.as_str()).is_some())
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.entities.lock().unwrap().clear();
            Ok(())
        }
    }
}
