use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::{
    error::ApiError,
    handlers::{health_check, posts, users, AppState},
    middleware::apply_middleware,
};

/// The served application. Trailing slashes are trimmed before routing, so
/// `/api/v1/user/` reaches the same handler as `/api/v1/user`.
pub type App = NormalizePath<Router>;

pub const USER_PREFIX: &str = "/api/v1/user";
pub const POST_PREFIX: &str = "/api/v1/post";

/// Routes relative to `/api/v1/user`.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::find_all_users).post(users::create_user))
        .route("/userpost", post(users::create_user_with_posts))
        .route(
            "/:id",
            get(users::find_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
}

/// Routes relative to `/api/v1/post`.
pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::find_all_posts).post(posts::create_post))
        .route(
            "/:id",
            get(posts::find_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
}

/// The whole application: both resource groups, the health check and the
/// middleware stack.
pub fn create_router(state: AppState, request_timeout: Duration) -> App {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest(USER_PREFIX, user_routes())
        .nest(POST_PREFIX, post_routes())
        .fallback(route_not_found)
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(apply_middleware(router, request_timeout))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route")
}
