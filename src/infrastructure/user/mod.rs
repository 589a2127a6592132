//! User infrastructure module
//!
//! The storage-backed repository that keeps user records and their lookup
//! indexes consistent, and the service built on top of it.

mod repository;
mod service;

pub use repository::{
    StorageUserRepository, EMAIL_INDEX_TABLE, PHONE_INDEX_TABLE, USERS_TABLE,
};
pub use service::{CreateUserRequest, UpdateUserRequest, UserListPage, UserService};
