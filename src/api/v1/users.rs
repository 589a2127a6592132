//! User endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ListUsersQuery, ListUsersResponse, UserResponse};
use crate::domain::user::ContactUpdate;
use crate::infrastructure::user::{CreateUserRequest, UpdateUserRequest};

/// POST /v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    debug!(email = %request.email, phone = %request.phone_number, "Creating user");

    let user = state.user_service.create(request).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// GET /v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    debug!(page_size = ?query.page_size, "Listing users");

    let page = state
        .user_service
        .list(
            query.page_size.unwrap_or_default(),
            query.page_token.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(ListUsersResponse::from(page)))
}

/// GET /v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id = %id, "Getting user");

    let user = state.user_service.get(&id).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /v1/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id = %id, "Updating user");

    let user = state.user_service.update(&id, request).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /v1/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!(user_id = %id, "Deleting user");

    state.user_service.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/users/{id}/contact
pub async fn update_user_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ContactUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id = %id, "Updating user contact");

    let user = state.user_service.update_contact(&id, update).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /v1/users/{id}/block
pub async fn block_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.block(&id).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /v1/users/{id}/unblock
pub async fn unblock_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.unblock(&id).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /v1/lookup/phone/{phone}
pub async fn get_user_by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(phone = %phone, "Looking up user by phone");

    let user = state.user_service.get_by_phone(&phone).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /v1/lookup/email/{email}
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(email = %email, "Looking up user by email");

    let user = state.user_service.get_by_email(&email).await?;

    Ok(Json(UserResponse::from(&user)))
}
