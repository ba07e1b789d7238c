//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::PromotedChapter;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Vote DTOs
// ============================================================================

/// 投票 / 取消投票请求
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub proposal_id: i64,
}

/// 投票榜分页参数（`page` 从 0 开始）
#[derive(Debug, Default, Deserialize)]
pub struct ListProposalsParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// 手动结算请求
#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub novel_id: i64,
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub novel_id: i64,
    pub promoted: Option<PromotedChapter>,
}

// ============================================================================
// Proposal DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    pub chapter_id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub ai_generated: bool,
}
