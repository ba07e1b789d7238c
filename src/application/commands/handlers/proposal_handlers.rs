//! Proposal Command Handlers

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::application::commands::SubmitProposal;
use crate::application::error::{ApplicationError, PreconditionKind};
use crate::application::ports::{
    ChapterRepositoryPort, ClockPort, NewProposal, ProposalRepositoryPort, UserDirectoryPort,
};
use crate::domain::{ProposalContent, ProposalTitle, VotingWindow};

/// 提交提案响应
#[derive(Debug, Clone, Serialize)]
pub struct SubmitProposalResponse {
    pub proposal_id: i64,
    pub chapter_id: i64,
    pub novel_id: i64,
    pub vote_deadline: DateTime<Utc>,
}

/// SubmitProposal Handler
///
/// 截止时间 = 章节创建时间 + 投票窗口，同一章节的所有提案共享同一截止时间。
/// 提案人必须存在于用户目录，否则提案胜出后无法晋升
pub struct SubmitProposalHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    proposal_repo: Arc<dyn ProposalRepositoryPort>,
    user_directory: Arc<dyn UserDirectoryPort>,
    clock: Arc<dyn ClockPort>,
    window: VotingWindow,
}

impl SubmitProposalHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        proposal_repo: Arc<dyn ProposalRepositoryPort>,
        user_directory: Arc<dyn UserDirectoryPort>,
        clock: Arc<dyn ClockPort>,
        window: VotingWindow,
    ) -> Self {
        Self {
            chapter_repo,
            proposal_repo,
            user_directory,
            clock,
            window,
        }
    }

    pub async fn handle(
        &self,
        command: SubmitProposal,
    ) -> Result<SubmitProposalResponse, ApplicationError> {
        let title = ProposalTitle::new(command.title)?;
        let content = ProposalContent::new(command.content)?;

        let chapter = self
            .chapter_repo
            .find_by_id(command.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", command.chapter_id))?;

        if !self.user_directory.exists(command.proposer_id).await? {
            tracing::warn!(
                chapter_id = chapter.id,
                proposer_id = command.proposer_id,
                "Proposal rejected: unknown proposer"
            );
            return Err(ApplicationError::not_found("User", command.proposer_id));
        }

        let now = self.clock.now();
        let vote_deadline = self.window.deadline_for(chapter.created_at);
        if !VotingWindow::is_open(vote_deadline, now) {
            tracing::warn!(
                chapter_id = chapter.id,
                proposer_id = command.proposer_id,
                "Proposal rejected: voting window already closed"
            );
            return Err(ApplicationError::precondition(PreconditionKind::VotingClosed));
        }

        let proposal_id = self
            .proposal_repo
            .insert(&NewProposal {
                chapter_id: chapter.id,
                proposer_id: command.proposer_id,
                title: title.into_inner(),
                content: content.into_inner(),
                vote_deadline,
                ai_generated: command.ai_generated,
                created_at: now,
            })
            .await?;

        tracing::info!(
            proposal_id = proposal_id,
            chapter_id = chapter.id,
            novel_id = chapter.novel_id,
            proposer_id = command.proposer_id,
            "Proposal submitted"
        );

        Ok(SubmitProposalResponse {
            proposal_id,
            chapter_id: chapter.id,
            novel_id: chapter.novel_id,
            vote_deadline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProposalStatus;
    use crate::test_support::TestContext;

    fn submit(chapter_id: i64, title: &str) -> SubmitProposal {
        SubmitProposal {
            chapter_id,
            proposer_id: 1,
            title: title.to_string(),
            content: "那天夜里，门开了。".to_string(),
            ai_generated: false,
        }
    }

    fn handler(ctx: &TestContext) -> SubmitProposalHandler {
        SubmitProposalHandler::new(
            ctx.chapters.clone(),
            ctx.proposals.clone(),
            ctx.users.clone(),
            ctx.clock.clone(),
            ctx.window,
        )
    }

    #[tokio::test]
    async fn test_submit_shares_chapter_deadline() {
        let ctx = TestContext::new().await;
        let (novel_id, chapter) = ctx.novel_with_chapter().await;
        let handler = handler(&ctx);

        let first = handler.handle(submit(chapter.id, "A")).await.unwrap();
        ctx.clock.advance(chrono::Duration::hours(5));
        let second = handler.handle(submit(chapter.id, "B")).await.unwrap();

        assert_eq!(first.novel_id, novel_id);
        assert_eq!(first.vote_deadline, ctx.deadline_of(&chapter));
        assert_eq!(first.vote_deadline, second.vote_deadline);

        let stored = ctx.proposals.find_by_id(first.proposal_id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProposalStatus::Voting);
        assert_eq!(stored.vote_count, 0);
        assert_eq!(stored.vote_deadline, first.vote_deadline);
    }

    #[tokio::test]
    async fn test_submit_rejects_blank_and_long_titles() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;
        let handler = handler(&ctx);

        let blank = handler.handle(submit(chapter.id, "   ")).await.unwrap_err();
        assert!(matches!(blank, ApplicationError::ValidationError(_)));

        let long = "x".repeat(61);
        let err = handler.handle(submit(chapter.id, &long)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_submit_unknown_chapter() {
        let ctx = TestContext::new().await;
        let err = handler(&ctx).handle(submit(404, "A")).await.unwrap_err();

        assert!(matches!(err, ApplicationError::NotFound { resource_type: "Chapter", id: 404 }));
    }

    #[tokio::test]
    async fn test_submit_after_window_rejected() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;
        ctx.expire(&chapter);

        let err = handler(&ctx).handle(submit(chapter.id, "A")).await.unwrap_err();

        assert_eq!(err.precondition_kind(), Some(PreconditionKind::VotingClosed));
    }

    #[tokio::test]
    async fn test_submit_by_unknown_user_is_rejected() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;
        let mut command = submit(chapter.id, "A");
        command.proposer_id = 4242;

        let err = handler(&ctx).handle(command).await.unwrap_err();

        assert!(matches!(err, ApplicationError::NotFound { resource_type: "User", id: 4242 }));
        assert!(ctx.proposals.find_by_chapter(chapter.id).await.unwrap().is_empty());
    }
}
