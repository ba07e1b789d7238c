//! Proposal HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::application::{
    ListChapterProposals, ProposalSummary, SubmitProposal, SubmitProposalResponse, TallyReport,
    VerifyVoteTallies,
};
use crate::infrastructure::http::dto::{ApiResponse, CreateProposalRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::CurrentUser;
use crate::infrastructure::http::state::AppState;

/// 提交提案
pub async fn create_proposal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateProposalRequest>,
) -> Result<Json<ApiResponse<SubmitProposalResponse>>, ApiError> {
    let result = state
        .submit_proposal_handler
        .handle(SubmitProposal {
            chapter_id: req.chapter_id,
            proposer_id: user_id,
            title: req.title,
            content: req.content,
            ai_generated: req.ai_generated,
        })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 列出章节全部提案
pub async fn list_chapter_proposals(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ProposalSummary>>>, ApiError> {
    let proposals = state
        .list_chapter_proposals_handler
        .handle(ListChapterProposals { chapter_id })
        .await?;

    Ok(Json(ApiResponse::success(proposals)))
}

/// 核对章节票数
pub async fn verify_tallies(
    State(state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<Json<ApiResponse<TallyReport>>, ApiError> {
    let report = state
        .verify_tallies_handler
        .handle(VerifyVoteTallies { chapter_id })
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::infrastructure::http::create_routes;
    use crate::infrastructure::http::error::errno;
    use crate::test_support::TestContext;

    fn app(ctx: &TestContext) -> Router {
        create_routes().with_state(Arc::new(ctx.app_state()))
    }

    async fn send(app: Router, request: Request<Body>) -> Value {
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_request(chapter_id: i64, title: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/proposal/create")
            .header("content-type", "application/json")
            .header("x-user-id", "5")
            .body(Body::from(
                json!({ "chapter_id": chapter_id, "title": title, "content": "下一幕" }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;
        ctx.user(5).await;

        let created = send(app(&ctx), create_request(chapter.id, "转折")).await;
        assert_eq!(created["errno"], 0);
        let proposal_id = created["data"]["proposal_id"].as_i64().unwrap();

        let request = Request::builder()
            .uri(format!("/api/proposal/chapters/{}", chapter.id))
            .body(Body::empty())
            .unwrap();
        let listed = send(app(&ctx), request).await;

        assert_eq!(listed["errno"], 0);
        assert_eq!(listed["data"][0]["proposal_id"], proposal_id);
        assert_eq!(listed["data"][0]["proposer_id"], 5);
        assert_eq!(listed["data"][0]["status"], "VOTING");
    }

    #[tokio::test]
    async fn test_create_with_blank_title_is_bad_request() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;

        let body = send(app(&ctx), create_request(chapter.id, "  ")).await;

        assert_eq!(body["errno"], errno::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_by_unknown_user_is_not_found() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;

        let body = send(app(&ctx), create_request(chapter.id, "转折")).await;

        assert_eq!(body["errno"], errno::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tallies_endpoint() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;
        ctx.proposal_with_votes(&chapter, 1, 2).await;

        let request = Request::builder()
            .uri(format!("/api/proposal/chapters/{}/tallies", chapter.id))
            .body(Body::empty())
            .unwrap();
        let body = send(app(&ctx), request).await;

        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["checked"], 1);
    }
}
