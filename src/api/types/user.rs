//! User request and response bodies

use serde::{Deserialize, Serialize};

use crate::domain::user::User;
use crate::infrastructure::user::UserListPage;

/// User as returned by the API; timestamps are RFC 3339
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: Option<String>,
    pub phone_number: String,
    pub email: String,
    pub is_blocked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            gender: user.gender().to_string(),
            date_of_birth: user.date_of_birth().map(|dob| dob.to_rfc3339()),
            phone_number: user.phone_number().to_string(),
            email: user.email().to_string(),
            is_blocked: user.is_blocked(),
            created_at: user.created_at().to_rfc3339(),
            updated_at: user.updated_at().to_rfc3339(),
        }
    }
}

/// Query string of `GET /v1/users`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    /// Empty when there are no further pages
    pub next_page_token: String,
    pub total_count: usize,
}

impl From<UserListPage> for ListUsersResponse {
    fn from(page: UserListPage) -> Self {
        Self {
            users: page.users.iter().map(UserResponse::from).collect(),
            next_page_token: page.next_page_token,
            total_count: page.total_count,
        }
    }
}
