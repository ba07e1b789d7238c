//! Request extractors

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;

/// 上游认证层写入的用户 ID 请求头
pub const USER_ID_HEADER: &str = "x-user-id";

/// 当前用户
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing user identity".to_string()))?;

        raw.to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("malformed user identity".to_string()))
    }
}
