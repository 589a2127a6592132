//! Application state for shared services

use std::sync::Arc;

use crate::domain::user::UserRepository;
use crate::infrastructure::user::{StorageUserRepository, UserService};

/// Application state shared by all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub user_service: Arc<UserService>,
}

impl AppState {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self {
            user_service: Arc::new(UserService::new(repository)),
        }
    }

    /// State over fresh in-memory tables
    pub fn in_memory() -> Self {
        Self::new(Arc::new(StorageUserRepository::in_memory()))
    }
}
