use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::state::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-api-key";

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Guard for `/admin/api`: missing key → 401, wrong key → 403.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    tracing::debug!("Admin request: {} {}", method, path);

    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|k| !k.is_empty());

    let Some(provided) = provided else {
        tracing::warn!("Admin request without API key: {} {}", method, path);
        return Err(ApiError::unauthorized("API key is required"));
    };

    let expected = &state.config().admin_api_key;
    if expected.is_empty() {
        tracing::error!("Admin API key is empty; denying request");
        return Err(ApiError::unauthorized("API key is required"));
    }

    if !constant_time_compare(provided, expected) {
        tracing::warn!("Invalid admin API key: {} {}", method, path);
        return Err(ApiError::forbidden("Invalid API key"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("ab", "abc"));
    }
}
