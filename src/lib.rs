// Library root for the blog CRUD API

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod store;

// Re-export commonly used types
pub use db::Database;
pub use error::{ApiError, ApiResult};
pub use handlers::AppState;
pub use memory::MemoryStore;
pub use models::{Post, PostWithAuthor, User, UserWithPosts};
pub use routes::{create_router, App};
pub use store::Store;
