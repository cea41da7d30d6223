// Handlers module
// HTTP handlers for the REST API

pub mod users;
pub mod posts;

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse};

use crate::{
    error::{ApiError, ApiResult},
    response::Reply,
    store::Store,
};

/// Shared handler state. Built once by the application shell.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Health check handler
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.store.ping().await?;
    Ok(Reply::ok_message("healthy"))
}

/// Path ids are numeric; anything else is rejected before touching the store.
pub(crate) fn parse_id(resource: &str, raw: &str) -> ApiResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::validation(format!("Invalid {} id '{}'", resource, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("user", "42").unwrap(), 42);
        assert!(matches!(parse_id("user", "abc"), Err(ApiError::Validation(_))));
        assert!(matches!(parse_id("post", ""), Err(ApiError::Validation(_))));
        assert!(matches!(parse_id("post", "99999999999"), Err(ApiError::Validation(_))));
    }
}
