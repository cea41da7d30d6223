// Post handlers
// HTTP handlers for post management operations

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use tracing::info;

use super::{parse_id, AppState};
use crate::{
    error::{ApiError, ApiResult},
    models::post::{CreatePostPayload, UpdatePostRequest},
    response::Reply,
    store::post_not_found,
};

/// Get all posts with their authors
/// GET /api/v1/post
pub async fn find_all_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("Fetching all posts");

    let posts = state.store.list_posts().await?;

    info!("Retrieved {} posts", posts.len());
    Ok(Reply::ok(posts))
}

/// Get post by ID
/// GET /api/v1/post/:id
pub async fn find_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id("post", &raw_id)?;
    info!("Fetching post with id: {}", id);

    let post = state.store.find_post(id).await?.ok_or_else(|| post_not_found(id))?;

    Ok(Reply::ok(post))
}

/// Create one post connected to an author, or bulk insert an array of
/// authorless posts
/// POST /api/v1/post
pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload?;
    let payload = CreatePostPayload::from_value(body).map_err(ApiError::Validation)?;

    match payload {
        CreatePostPayload::Many(posts) => {
            for (index, post) in posts.iter().enumerate() {
                post.validate()
                    .map_err(|e| ApiError::Validation(format!("[{}]: {}", index, e)))?;
            }
            info!("Bulk creating {} posts", posts.len());

            let posts = posts.into_iter().map(|p| p.normalized()).collect();
            let inserted = state.store.create_posts(posts).await?;

            info!("Successfully created {} posts", inserted);
            Ok(Reply::created_message("posts created"))
        }
        CreatePostPayload::One(request) => {
            request.validate().map_err(ApiError::Validation)?;
            info!("Creating new post for author: {} with title: {}", request.author, request.title.trim());

            let (post, author_id) = request.into_parts();
            let post = state.store.create_post(post, author_id).await?;

            info!("Successfully created post with id: {}", post.id);
            Ok(Reply::created_message("post created"))
        }
    }
}

/// Update the supplied fields of a post
/// PUT /api/v1/post/:id
pub async fn update_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id("post", &raw_id)?;
    let Json(request) = payload?;
    request.validate().map_err(ApiError::Validation)?;
    info!("Updating post with id: {}", id);

    state.store.update_post(id, request.into_changes()).await?;

    info!("Successfully updated post with id: {}", id);
    Ok(Reply::ok_message("post updated"))
}

/// Delete post by ID
/// DELETE /api/v1/post/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id("post", &raw_id)?;
    info!("Deleting post with id: {}", id);

    state.store.delete_post(id).await?;

    info!("Successfully deleted post with id: {}", id);
    Ok(Reply::ok_message("post deleted"))
}
