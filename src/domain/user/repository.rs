//! User repository trait

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Default page size when the caller asks for zero or a negative count
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Upper bound on a single page
pub const MAX_PAGE_SIZE: usize = 100;

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`
pub fn normalize_page_size(requested: i64) -> usize {
    if requested <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        (requested as u64).min(MAX_PAGE_SIZE as u64) as usize
    }
}

/// One page of users and the token that continues after it
#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub users: Vec<User>,
    /// ID of the last user when the page is full, empty otherwise
    pub next_page_token: String,
}

/// Repository for user records and their phone/email lookup indexes.
///
/// Implementations keep the primary record and both indexes consistent:
/// every live user has exactly one phone entry and one email entry pointing
/// at its ID, and no two users share a phone number or an email.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user together with its index entries
    async fn create_user(&self, user: &User) -> Result<(), DomainError>;

    async fn get_by_id(&self, id: &UserId) -> Result<User, DomainError>;

    async fn get_by_phone(&self, phone: &str) -> Result<User, DomainError>;

    async fn get_by_email(&self, email: &str) -> Result<User, DomainError>;

    /// Persist new field values, re-pointing indexes whose key changed
    async fn update_user(&self, user: &User) -> Result<(), DomainError>;

    /// Remove the user and both index entries
    async fn delete_user(&self, id: &UserId) -> Result<(), DomainError>;

    /// List users in ascending ID order, strictly after `page_token`
    async fn list_users(&self, limit: i64, page_token: &str) -> Result<UserPage, DomainError>;

    async fn check_email_exists(&self, email: &str) -> Result<bool, DomainError>;

    async fn check_phone_exists(&self, phone: &str) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_page_size() {
        assert_eq!(normalize_page_size(0), DEFAULT_PAGE_SIZE);
        assert_eq!(normalize_page_size(-5), DEFAULT_PAGE_SIZE);
        assert_eq!(normalize_page_size(1), 1);
        assert_eq!(normalize_page_size(100), 100);
        assert_eq!(normalize_page_size(101), MAX_PAGE_SIZE);
        assert_eq!(normalize_page_size(i64::MAX), MAX_PAGE_SIZE);
    }
}
