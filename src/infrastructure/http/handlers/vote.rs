//! Vote HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{
    CancelVote, CastVote, FinalizeNovel, ListProposals, ProposalBoard, VoteResponse,
};
use crate::infrastructure::http::dto::{
    ApiResponse, FinalizeRequest, FinalizeResponse, ListProposalsParams, VoteRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::CurrentUser;
use crate::infrastructure::http::state::AppState;

/// 获取小说最新章节的投票榜
pub async fn list_proposals(
    State(state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Query(params): Query<ListProposalsParams>,
) -> Result<Json<ApiResponse<ProposalBoard>>, ApiError> {
    let query = ListProposals {
        novel_id,
        page: params.page.unwrap_or(0),
        page_size: params.size.unwrap_or(state.options.default_page_size),
    };

    let board = state.list_proposals_handler.handle(query).await?;
    Ok(Json(ApiResponse::success(board)))
}

/// 投票
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<VoteRequest>,
) -> Result<Json<ApiResponse<VoteResponse>>, ApiError> {
    let result = state
        .cast_vote_handler
        .handle(CastVote {
            proposal_id: req.proposal_id,
            user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 取消投票
pub async fn cancel_vote(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<VoteRequest>,
) -> Result<Json<ApiResponse<VoteResponse>>, ApiError> {
    let result = state
        .cancel_vote_handler
        .handle(CancelVote {
            proposal_id: req.proposal_id,
            user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 立即结算（投票页倒计时结束时调用）
pub async fn finalize_novel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<ApiResponse<FinalizeResponse>>, ApiError> {
    let promoted = state
        .finalize_handler
        .finalize_novel(FinalizeNovel {
            novel_id: req.novel_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(FinalizeResponse {
        novel_id: req.novel_id,
        promoted,
    })))
}
