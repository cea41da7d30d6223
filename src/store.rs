use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{NewPost, NewUser, Post, PostChanges, PostWithAuthor, User, UserChanges, UserWithPosts};

/// Persistence operations behind the HTTP handlers.
///
/// Lookups return `Ok(None)` for a missing row; updates and deletes of a
/// missing row return `ApiError::NotFound`. Implementations enforce the
/// unique email and the post author reference.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> ApiResult<()>;

    async fn list_users(&self) -> ApiResult<Vec<User>>;

    async fn find_user(&self, id: i32) -> ApiResult<Option<User>>;

    async fn create_user(&self, user: NewUser) -> ApiResult<User>;

    /// Creates the user and its posts atomically; every post gets the new user as author.
    async fn create_user_with_posts(&self, user: NewUser, posts: Vec<NewPost>) -> ApiResult<UserWithPosts>;

    async fn update_user(&self, id: i32, changes: UserChanges) -> ApiResult<User>;

    async fn delete_user(&self, id: i32) -> ApiResult<()>;

    async fn list_posts(&self) -> ApiResult<Vec<PostWithAuthor>>;

    async fn find_post(&self, id: i32) -> ApiResult<Option<Post>>;

    async fn create_post(&self, post: NewPost, author_id: i32) -> ApiResult<Post>;

    /// Inserts authorless posts, returning how many rows were written.
    async fn create_posts(&self, posts: Vec<NewPost>) -> ApiResult<u64>;

    async fn update_post(&self, id: i32, changes: PostChanges) -> ApiResult<Post>;

    async fn delete_post(&self, id: i32) -> ApiResult<()>;

    /// Releases resources on shutdown.
    async fn close(&self) {}
}

pub(crate) fn user_not_found(id: i32) -> crate::error::ApiError {
    crate::error::ApiError::not_found(format!("User with id {}", id))
}

pub(crate) fn post_not_found(id: i32) -> crate::error::ApiError {
    crate::error::ApiError::not_found(format!("Post with id {}", id))
}
