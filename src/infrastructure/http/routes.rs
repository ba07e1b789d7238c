//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                                  GET     健康检查
//! - /api/vote/novels/:novel_id/proposals       GET     最新章节投票榜（?page&size）
//! - /api/vote/do                               POST    投票
//! - /api/vote/do                               DELETE  取消投票
//! - /api/vote/finalize                         POST    立即结算小说最新章节
//! - /api/proposal/create                       POST    提交提案
//! - /api/proposal/chapters/:chapter_id         GET     章节全部提案
//! - /api/proposal/chapters/:chapter_id/tallies GET     核对章节票数
//!
//! 需要用户身份的接口读取 `x-user-id` 请求头

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/vote", vote_routes())
        .nest("/proposal", proposal_routes())
}

/// Vote 路由
fn vote_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/novels/:novel_id/proposals", get(handlers::list_proposals))
        .route(
            "/do",
            post(handlers::cast_vote).delete(handlers::cancel_vote),
        )
        .route("/finalize", post(handlers::finalize_novel))
}

/// Proposal 路由
fn proposal_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_proposal))
        .route("/chapters/:chapter_id", get(handlers::list_chapter_proposals))
        .route("/chapters/:chapter_id/tallies", get(handlers::verify_tallies))
}
