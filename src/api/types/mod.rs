//! Request/response types shared by the HTTP handlers

pub mod error;
pub mod json;
pub mod user;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use user::{ListUsersQuery, ListUsersResponse, UserResponse};
