//! Storage factory for runtime storage selection

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating storage instances
///
/// All PostgreSQL tables opened through one factory share a single pool.
#[derive(Debug, Clone)]
pub struct StorageFactory {
    pool: Option<PgPool>,
}

impl StorageFactory {
    /// Builds a factory for the configured backend, connecting once if needed
    pub async fn connect(config: &StorageConfig) -> Result<Self, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageConfig::Postgres(pg_config) => {
                info!(
                    max_connections = pg_config.max_connections,
                    "Connecting to PostgreSQL storage"
                );
                let pool = pg_config.connect().await?;
                Ok(Self { pool: Some(pool) })
            }
        }
    }

    pub fn in_memory() -> Self {
        Self { pool: None }
    }

    pub fn storage_type(&self) -> StorageType {
        match self.pool {
            Some(_) => StorageType::Postgres,
            None => StorageType::InMemory,
        }
    }

    /// Opens a table, creating it first on PostgreSQL
    pub async fn create<E>(&self, table_name: &str) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match &self.pool {
            None => Ok(Arc::new(InMemoryStorage::<E>::named(table_name))),
            Some(pool) => {
                let storage = PostgresStorage::<E>::new(pool.clone(), table_name);
                storage.ensure_table().await?;
                Ok(Arc::new(storage))
            }
        }
    }

    /// Creates an in-memory storage
    pub fn create_in_memory<E>(table_name: &str) -> Arc<InMemoryStorage<E>>
    where
        E: StorageEntity,
    {
        Arc::new(InMemoryStorage::named(table_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{User, UserId};

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!(StorageType::from_str("memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("in-memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("Postgres"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("pg"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("dynamodb"), None);
    }

    #[test]
    fn test_storage_config_types() {
        assert_eq!(
            StorageConfig::in_memory().storage_type(),
            StorageType::InMemory
        );
        assert_eq!(
            StorageConfig::postgres_url("postgres://localhost/test").storage_type(),
            StorageType::Postgres
        );
    }

    #[tokio::test]
    async fn test_in_memory_factory_creates_independent_tables() {
        let factory = StorageFactory::connect(&StorageConfig::in_memory())
            .await
            .unwrap();
        assert_eq!(factory.storage_type(), StorageType::InMemory);

        let first: Arc<dyn Storage<User>> = factory.create("users").await.unwrap();
        let second: Arc<dyn Storage<User>> = factory.create("users").await.unwrap();

        let user = User::new(
            "John",
            "Doe",
            "male",
            None,
            "+12015550123",
            "john@example.com",
        );
        first.create(user.clone()).await.unwrap();

        assert!(first.exists(user.id()).await.unwrap());
        assert!(!second.exists(&UserId::generate()).await.unwrap());
        assert_eq!(second.count().await.unwrap(), 0);
    }
}
