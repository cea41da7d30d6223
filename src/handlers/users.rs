// User handlers
// HTTP handlers for user management operations

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use tracing::info;

use super::{parse_id, AppState};
use crate::{
    error::{ApiError, ApiResult},
    models::user::{CreateUserRequest, CreateUserWithPostsRequest, UpdateUserRequest},
    response::Reply,
    store::user_not_found,
};

/// Get all users, without their posts
/// GET /api/v1/user
pub async fn find_all_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("Fetching all users");

    let users = state.store.list_users().await?;

    info!("Retrieved {} users", users.len());
    Ok(Reply::ok(users))
}

/// Get user by ID
/// GET /api/v1/user/:id
pub async fn find_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id("user", &raw_id)?;
    info!("Fetching user with id: {}", id);

    let user = state.store.find_user(id).await?.ok_or_else(|| user_not_found(id))?;

    Ok(Reply::ok(user))
}

/// Create a new user
/// POST /api/v1/user
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    request.validate().map_err(ApiError::Validation)?;
    info!("Creating new user with email: {}", request.email.trim());

    let user = state.store.create_user(request.into_new_user()).await?;

    info!("Successfully created user with id: {}", user.id);
    Ok(Reply::created_message("user created"))
}

/// Create a user together with its posts
/// POST /api/v1/user/userpost
pub async fn create_user_with_posts(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserWithPostsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    request.validate().map_err(ApiError::Validation)?;
    info!(
        "Creating user with email: {} and {} posts",
        request.email.trim(),
        request.posts.len()
    );

    let (user, posts) = request.into_parts();
    let created = state.store.create_user_with_posts(user, posts).await?;

    info!("Successfully created user with id: {}", created.user.id);
    Ok(Reply::created(created))
}

/// Update the supplied fields of a user
/// PUT /api/v1/user/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id("user", &raw_id)?;
    let Json(request) = payload?;
    request.validate().map_err(ApiError::Validation)?;
    info!("Updating user with id: {}", id);

    state.store.update_user(id, request.into_changes()).await?;

    info!("Successfully updated user with id: {}", id);
    Ok(Reply::ok_message("user updated"))
}

/// Delete user by ID. Posts keep existing with no author.
/// DELETE /api/v1/user/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id("user", &raw_id)?;
    info!("Deleting user with id: {}", id);

    state.store.delete_user(id).await?;

    info!("Successfully deleted user with id: {}", id);
    Ok(Reply::ok_message("user deleted"))
}
