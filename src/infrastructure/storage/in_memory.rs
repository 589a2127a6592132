//! In-memory storage implementation

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory storage implementation
///
/// Entities are kept in key order so paged scans are stable. Data is lost
/// when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    name: String,
    entities: RwLock<BTreeMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Creates a new empty storage whose name appears in error context
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates storage pre-populated with entities
    pub fn with_entities(entities: Vec<E>) -> Self {
        let map = entities
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect();

        Self {
            name: "memory".to_string(),
            entities: RwLock::new(map),
        }
    }

    fn lock_error(&self, operation: &str, key: &str, e: impl std::fmt::Display) -> DomainError {
        DomainError::store_failure(
            format!("{}.{}", self.name, operation),
            key,
            format!("failed to acquire lock: {}", e),
        )
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let entities = self
            .entities
            .read()
            .map_err(|e| self.lock_error("get", key.as_str(), e))?;

        Ok(entities.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let entities = self
            .entities
            .read()
            .map_err(|e| self.lock_error("list", "", e))?;

        Ok(entities.values().cloned().collect())
    }

    async fn list_page(&self, limit: usize, after: Option<&str>) -> Result<Vec<E>, DomainError> {
        use std::ops::Bound;

        let entities = self
            .entities
            .read()
            .map_err(|e| self.lock_error("list_page", after.unwrap_or(""), e))?;

        let lower = match after {
            Some(cursor) => Bound::Excluded(cursor.to_string()),
            None => Bound::Unbounded,
        };

        Ok(entities
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, entity)| entity.clone())
            .collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self
            .entities
            .write()
            .map_err(|e| self.lock_error("create", &key, e))?;

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
        let mut entities = self
            .entities
            .write()
            .map_err(|e| self.lock_error("update", &key, e))?;

        match entities.get_mut(&key) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(entity)
            }
            None => Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            ))),
        }
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| self.lock_error("delete", key.as_str(), e))?;

        Ok(entities.remove(key.as_str()).is_some())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| self.lock_error("clear", "", e))?;

        entities.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let entities = self
            .entities
            .read()
            .map_err(|e| self.lock_error("count", "", e))?;

        Ok(entities.len())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let entities = self
            .entities
            .read()
            .map_err(|e| self.lock_error("exists", key.as_str(), e))?;

        Ok(entities.contains_key(key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct TestId(String);

    impl StorageKey for TestId {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestEntity {
        id: TestId,
        value: i32,
    }

    impl StorageEntity for TestEntity {
        type Key = TestId;

        fn key(&self) -> &Self::Key {
            &self.id
        }
    }

    fn entity(id: &str, value: i32) -> TestEntity {
        TestEntity {
            id: TestId(id.to_string()),
            value,
        }
    }

    fn key(id: &str) -> TestId {
        TestId(id.to_string())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();
        let e = entity("1", 42);

        storage.create(e.clone()).await.unwrap();

        let result = storage.get(&key("1")).await.unwrap();
        assert_eq!(result, Some(e));
    }

    #[tokio::test]
    async fn test_create_is_insert_if_absent() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.create(entity("1", 1)).await.unwrap();
        let result = storage.create(entity("1", 2)).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(storage.get(&key("1")).await.unwrap().unwrap().value, 1);
    }

    #[tokio::test]
    async fn test_update() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.create(entity("1", 42)).await.unwrap();
        storage.update(entity("1", 100)).await.unwrap();

        let result = storage.get(&key("1")).await.unwrap();
        assert_eq!(result.unwrap().value, 100);
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        let result = storage.update(entity("1", 42)).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert!(!storage.exists(&key("1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.create(entity("1", 42)).await.unwrap();

        assert!(storage.delete(&key("1")).await.unwrap());
        assert!(!storage.exists(&key("1")).await.unwrap());
        assert!(!storage.delete(&key("1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_page_walks_keys_in_order() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::with_entities(vec![
            entity("c", 3),
            entity("a", 1),
            entity("e", 5),
            entity("b", 2),
            entity("d", 4),
        ]);

        let first = storage.list_page(2, None).await.unwrap();
        assert_eq!(first, vec![entity("a", 1), entity("b", 2)]);

        let second = storage.list_page(2, Some("b")).await.unwrap();
        assert_eq!(second, vec![entity("c", 3), entity("d", 4)]);

        let third = storage.list_page(2, Some("d")).await.unwrap();
        assert_eq!(third, vec![entity("e", 5)]);

        let past_end = storage.list_page(2, Some("z")).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_list_page_cursor_need_not_exist() {
        let storage: InMemoryStorage<TestEntity> =
            InMemoryStorage::with_entities(vec![entity("a", 1), entity("c", 3)]);

        let page = storage.list_page(10, Some("b")).await.unwrap();
        assert_eq!(page, vec![entity("c", 3)]);
    }

    #[tokio::test]
    async fn test_count_and_clear() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.create(entity("1", 1)).await.unwrap();
        storage.create(entity("2", 2)).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 2);
        assert_eq!(storage.list().await.unwrap().len(), 2);

        storage.clear().await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
    }
}
