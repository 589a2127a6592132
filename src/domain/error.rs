use thiserror::Error;

use super::user::UserValidationError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Email already exists: {email}")]
    EmailAlreadyExists { email: String },

    #[error("Phone already exists: {phone}")]
    PhoneAlreadyExists { phone: String },

    #[error(transparent)]
    Validation(#[from] UserValidationError),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Failed precondition: {message}")]
    FailedPrecondition { message: String },

    /// A store rejected an insert because the key is already taken
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Store failure during {operation} (key '{key}'): {message}")]
    StoreFailure {
        operation: String,
        key: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn user_not_found(id: impl std::fmt::Display) -> Self {
        Self::not_found(format!("User '{}' not found", id))
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn phone_already_exists(phone: impl Into<String>) -> Self {
        Self::PhoneAlreadyExists {
            phone: phone.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn store_failure(
        operation: impl Into<String>,
        key: impl Into<String>,
        cause: impl std::fmt::Display,
    ) -> Self {
        Self::StoreFailure {
            operation: operation.into(),
            key: key.into(),
            message: cause.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::EmailAlreadyExists { .. } => "email_already_exists",
            Self::PhoneAlreadyExists { .. } => "phone_already_exists",
            Self::Validation(e) => e.code(),
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::FailedPrecondition { .. } => "failed_precondition",
            Self::Conflict { .. } => "conflict",
            Self::StoreFailure { .. } => "store_failure",
            Self::Configuration { .. } => "configuration",
        }
    }
}
