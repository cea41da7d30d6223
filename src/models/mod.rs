// Models module

pub mod user;
pub mod post;

// Re-export commonly used types
pub use user::{
    CreateUserRequest, CreateUserWithPostsRequest, NewUser, UpdateUserRequest, User, UserChanges,
    UserWithPosts,
};
pub use post::{
    CreatePostPayload, CreatePostRequest, NewPost, Post, PostChanges, PostWithAuthor,
    UpdatePostRequest,
};

/// Column limit for VARCHAR(255) fields.
pub const MAX_TEXT_LEN: usize = 255;
pub const MAX_CONTENT_LEN: usize = 10_000;

pub(crate) fn check_length(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{} cannot exceed {} characters", field, max));
    }
    Ok(())
}
