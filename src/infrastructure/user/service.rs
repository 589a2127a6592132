//! User service: the operations exposed to transports
//!
//! Parses caller input, applies the merge and precondition policies and
//! validates records before handing them to the repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domain::user::{ContactUpdate, User, UserId, UserRepository};
use crate::domain::DomainError;

/// Request for creating a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
    pub phone_number: String,
    pub email: String,
}

/// Request for updating profile fields; absent or empty values keep what is stored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// One page of a user listing
#[derive(Debug, Clone)]
pub struct UserListPage {
    pub users: Vec<User>,
    pub next_page_token: String,
    /// Number of users in this page
    pub total_count: usize,
}

/// User service
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Create a new user
    #[instrument(skip(self, request), fields(email = %request.email, phone = %request.phone_number))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        let user = User::new(
            request.first_name,
            request.last_name,
            request.gender,
            request.date_of_birth,
            request.phone_number,
            request.email,
        );

        user.validate()?;

        self.repository.create_user(&user).await?;

        info!(user_id = %user.id(), "User created");
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: &str) -> Result<User, DomainError> {
        let user_id = UserId::parse(id)?;
        self.repository.get_by_id(&user_id).await
    }

    pub async fn get_by_phone(&self, phone: &str) -> Result<User, DomainError> {
        if phone.is_empty() {
            return Err(DomainError::invalid_argument("Phone number is required"));
        }

        self.repository.get_by_phone(phone).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, DomainError> {
        if email.is_empty() {
            return Err(DomainError::invalid_argument("Email is required"));
        }

        self.repository.get_by_email(email).await
    }

    /// Update profile fields, keeping stored values for anything not supplied
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdateUserRequest) -> Result<User, DomainError> {
        let user_id = UserId::parse(id)?;
        let mut user = self.repository.get_by_id(&user_id).await?;

        let first_name = keep_or_replace(request.first_name, user.first_name());
        let last_name = keep_or_replace(request.last_name, user.last_name());
        let gender = keep_or_replace(request.gender, user.gender());
        let date_of_birth = request.date_of_birth.or(user.date_of_birth());

        user.apply_update(first_name, last_name, gender, date_of_birth);
        user.validate()?;

        self.repository.update_user(&user).await?;

        info!(user_id = %user.id(), "User updated");
        Ok(user)
    }

    /// Change phone number and/or email, re-pointing the lookup indexes
    #[instrument(skip(self, update))]
    pub async fn update_contact(
        &self,
        id: &str,
        update: ContactUpdate,
    ) -> Result<User, DomainError> {
        let user_id = UserId::parse(id)?;
        let mut user = self.repository.get_by_id(&user_id).await?;

        user.apply_contact_update(update);
        user.validate()?;

        self.repository.update_user(&user).await?;

        info!(user_id = %user.id(), "User contact updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn block(&self, id: &str) -> Result<User, DomainError> {
        let user_id = UserId::parse(id)?;
        let mut user = self.repository.get_by_id(&user_id).await?;

        if user.is_blocked() {
            return Err(DomainError::failed_precondition("User is already blocked"));
        }

        user.block();
        self.repository.update_user(&user).await?;

        info!(user_id = %user.id(), "User blocked");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn unblock(&self, id: &str) -> Result<User, DomainError> {
        let user_id = UserId::parse(id)?;
        let mut user = self.repository.get_by_id(&user_id).await?;

        if !user.is_blocked() {
            return Err(DomainError::failed_precondition("User is not blocked"));
        }

        user.unblock();
        self.repository.update_user(&user).await?;

        info!(user_id = %user.id(), "User unblocked");
        Ok(user)
    }

    /// Delete a user
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let user_id = UserId::parse(id)?;
        self.repository.delete_user(&user_id).await?;

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// List users in ID order; `page_size <= 0` means the default size
    pub async fn list(&self, page_size: i64, page_token: &str) -> Result<UserListPage, DomainError> {
        let page = self.repository.list_users(page_size, page_token).await?;

        Ok(UserListPage {
            total_count: page.users.len(),
            users: page.users,
            next_page_token: page.next_page_token,
        })
    }
}

fn keep_or_replace(value: Option<String>, current: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| current.to_string())
}
