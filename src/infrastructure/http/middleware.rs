//! HTTP Middleware
//!
//! HTTP 状态码错误日志中间件

use axum::{extract::Request, middleware::Next, response::Response};

use super::extract::USER_ID_HEADER;

/// HTTP 状态码错误日志中间件
///
/// 业务错误统一以 200 + errno 返回，在 `ApiError::into_response()` 中记录；
/// 这里只记录框架层拒绝的请求（路由不存在、请求体无法解析等）
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            user_id = ?user_id,
            status = %status.as_u16(),
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            user_id = ?user_id,
            status = %status.as_u16(),
            "HTTP client error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request as HttpRequest, StatusCode},
        Router,
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::infrastructure::http::create_routes;
    use crate::test_support::TestContext;

    fn app(ctx: &TestContext) -> Router {
        create_routes()
            .with_state(Arc::new(ctx.app_state()))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    #[tokio::test]
    async fn test_passes_business_responses_through() {
        let ctx = TestContext::new().await;
        let request = HttpRequest::builder()
            .uri("/api/ping")
            .body(Body::empty())
            .unwrap();

        let response = app(&ctx).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_client_error() {
        let ctx = TestContext::new().await;
        let request = HttpRequest::builder()
            .uri("/api/vote/unknown")
            .body(Body::empty())
            .unwrap();

        let response = app(&ctx).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let ctx = TestContext::new().await;
        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/api/vote/do")
            .header("content-type", "application/json")
            .header(USER_ID_HEADER, "3")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(&ctx).oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
