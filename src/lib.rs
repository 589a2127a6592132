//! User Service
//!
//! Stores user records and keeps the phone and email lookup indexes
//! consistent with them over stores that offer no multi-row transactions.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::storage::StorageFactory;
use infrastructure::user::StorageUserRepository;
use tracing::info;

/// Create the application state over the configured storage backend
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage_config()?;
    info!("Storage backend: {:?}", storage_config.storage_type());

    let factory = StorageFactory::connect(&storage_config).await?;
    let repository = StorageUserRepository::from_factory(&factory).await?;

    Ok(AppState::new(Arc::new(repository)))
}
