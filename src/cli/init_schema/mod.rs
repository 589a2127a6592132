//! Init-schema command - creates the user tables in PostgreSQL

use anyhow::bail;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{StorageConfig, StorageFactory};
use crate::infrastructure::user::{
    StorageUserRepository, EMAIL_INDEX_TABLE, PHONE_INDEX_TABLE, USERS_TABLE,
};

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    logging::init_logging(&config.logging);

    let storage_config = config.storage_config()?;
    if !matches!(storage_config, StorageConfig::Postgres(_)) {
        bail!(
            "init-schema requires the postgres storage backend, configured backend is '{}'",
            config.storage.backend
        );
    }

    let factory = StorageFactory::connect(&storage_config).await?;
    StorageUserRepository::from_factory(&factory).await?;

    info!(
        tables = ?[USERS_TABLE, PHONE_INDEX_TABLE, EMAIL_INDEX_TABLE],
        "Schema initialized"
    );

    Ok(())
}
