//! Vote Query Handlers

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterRepositoryPort, ClockPort, NovelRepositoryPort, ProposalRepositoryPort,
    UserDirectoryPort, VoteRepositoryPort,
};
use crate::application::queries::{ListProposals, VerifyVoteTallies};
use crate::domain::{ProposalStatus, VotingWindow};

// ============================================================================
// Response DTOs
// ============================================================================

/// 投票榜条目
#[derive(Debug, Clone, Serialize)]
pub struct ProposalEntry {
    pub proposal_id: i64,
    pub chapter_id: i64,
    pub novel_title: String,
    pub title: String,
    pub proposer_id: i64,
    /// 用户目录中找不到时为空
    pub proposer_nickname: Option<String>,
    pub content: String,
    pub vote_count: u32,
    pub status: ProposalStatus,
    pub ai_generated: bool,
}

/// 当前章节的投票截止信息
#[derive(Debug, Clone, Serialize)]
pub struct DeadlineInfo {
    pub chapter_id: i64,
    pub closing_time: DateTime<Utc>,
    pub open: bool,
}

/// 投票榜
#[derive(Debug, Clone, Serialize)]
pub struct ProposalBoard {
    pub novel_id: i64,
    pub latest_chapter_id: Option<i64>,
    pub proposals: Vec<ProposalEntry>,
    pub deadline_info: Option<DeadlineInfo>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

/// 票数核对结果
#[derive(Debug, Clone, Serialize)]
pub struct TallyReport {
    pub chapter_id: i64,
    pub checked: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListProposals Handler
///
/// 只展示最新章节的提案，按票数降序、提交时间升序排列
pub struct ListProposalsHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    proposal_repo: Arc<dyn ProposalRepositoryPort>,
    user_directory: Arc<dyn UserDirectoryPort>,
    clock: Arc<dyn ClockPort>,
    window: VotingWindow,
    max_page_size: u32,
}

impl ListProposalsHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        proposal_repo: Arc<dyn ProposalRepositoryPort>,
        user_directory: Arc<dyn UserDirectoryPort>,
        clock: Arc<dyn ClockPort>,
        window: VotingWindow,
        max_page_size: u32,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
            proposal_repo,
            user_directory,
            clock,
            window,
            max_page_size,
        }
    }

    pub async fn handle(&self, query: ListProposals) -> Result<ProposalBoard, ApplicationError> {
        if query.page_size == 0 || query.page_size > self.max_page_size {
            return Err(ApplicationError::validation(format!(
                "page size must be between 1 and {}",
                self.max_page_size
            )));
        }

        let novel = self
            .novel_repo
            .find_by_id(query.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", query.novel_id))?;

        let mut board = ProposalBoard {
            novel_id: novel.id,
            latest_chapter_id: None,
            proposals: Vec::new(),
            deadline_info: None,
            page: query.page,
            page_size: query.page_size,
            total: 0,
        };

        let Some(chapter) = self.chapter_repo.find_latest_by_novel(novel.id).await? else {
            return Ok(board);
        };

        let offset = u64::from(query.page) * u64::from(query.page_size);
        let proposals = self
            .proposal_repo
            .find_by_chapter_ranked(chapter.id, offset, query.page_size)
            .await?;
        let total = self.proposal_repo.count_by_chapter(chapter.id).await?;

        let proposer_ids: Vec<i64> = proposals
            .iter()
            .map(|p| p.proposer_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let nicknames = self.user_directory.find_nicknames(&proposer_ids).await?;

        let closing_time = self.window.deadline_for(chapter.created_at);

        board.latest_chapter_id = Some(chapter.id);
        board.total = total;
        board.deadline_info = Some(DeadlineInfo {
            chapter_id: chapter.id,
            closing_time,
            open: VotingWindow::is_open(closing_time, self.clock.now()),
        });
        board.proposals = proposals
            .into_iter()
            .map(|p| ProposalEntry {
                proposal_id: p.id,
                chapter_id: p.chapter_id,
                novel_title: novel.title.clone(),
                proposer_nickname: nicknames.get(&p.proposer_id).cloned(),
                proposer_id: p.proposer_id,
                title: p.title,
                content: p.content,
                vote_count: p.vote_count,
                status: p.status,
                ai_generated: p.ai_generated,
            })
            .collect();

        Ok(board)
    }
}

/// VerifyVoteTallies Handler
///
/// 发现不一致时记录错误日志并返回 `InvariantViolation`，不做自动修复
pub struct VerifyVoteTalliesHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    proposal_repo: Arc<dyn ProposalRepositoryPort>,
    vote_repo: Arc<dyn VoteRepositoryPort>,
}

impl VerifyVoteTalliesHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        proposal_repo: Arc<dyn ProposalRepositoryPort>,
        vote_repo: Arc<dyn VoteRepositoryPort>,
    ) -> Self {
        Self {
            chapter_repo,
            proposal_repo,
            vote_repo,
        }
    }

    pub async fn handle(&self, query: VerifyVoteTallies) -> Result<TallyReport, ApplicationError> {
        self.chapter_repo
            .find_by_id(query.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", query.chapter_id))?;

        let proposals = self.proposal_repo.find_by_chapter(query.chapter_id).await?;
        let mut mismatched = Vec::new();

        for proposal in &proposals {
            let rows = self.vote_repo.count_for_proposal(proposal.id).await?;
            if rows != proposal.vote_count {
                tracing::error!(
                    chapter_id = query.chapter_id,
                    proposal_id = proposal.id,
                    vote_count = proposal.vote_count,
                    vote_rows = rows,
                    "Vote counter out of step with vote rows"
                );
                mismatched.push(proposal.id);
            }
        }

        if !mismatched.is_empty() {
            return Err(ApplicationError::invariant(format!(
                "vote counters mismatch for proposals {:?}",
                mismatched
            )));
        }

        Ok(TallyReport {
            chapter_id: query.chapter_id,
            checked: proposals.len(),
        })
    }
}
