//! Domain layer - Core entities, contracts and errors

pub mod error;
pub mod storage;
pub mod user;

pub use error::DomainError;
pub use storage::{Storage, StorageEntity, StorageKey};
pub use user::{User, UserId, UserRepository, UserValidationError};
