//! Chapter Promoter - 提案晋升为章节
//!
//! 通过显式的仓储查询获取 提案 → 章节 → 小说 的上下文，
//! 以提案的标题/正文、提案人为作者构造下一章节。
//! 同一提案最多生成一个章节。

use std::sync::Arc;

use serde::Serialize;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterCreationPort, ChapterRepositoryPort, ClockPort, NewChapter, NovelRepositoryPort,
    ProposalRecord, RepositoryError, UserDirectoryPort,
};

/// 晋升结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromotedChapter {
    pub chapter_id: i64,
    pub novel_id: i64,
    pub chapter_number: u32,
    pub from_proposal_id: i64,
}

/// ChapterPromoter
pub struct ChapterPromoter {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    user_directory: Arc<dyn UserDirectoryPort>,
    chapter_creation: Arc<dyn ChapterCreationPort>,
    clock: Arc<dyn ClockPort>,
}

impl ChapterPromoter {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        user_directory: Arc<dyn UserDirectoryPort>,
        chapter_creation: Arc<dyn ChapterCreationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
            user_directory,
            chapter_creation,
            clock,
        }
    }

    /// 校验晋升所需的上下文并构造章节草稿（不写入）
    ///
    /// 结算任务把草稿交给 `commit_finalization`，与状态变更同一事务写入
    pub async fn prepare(&self, proposal: &ProposalRecord) -> Result<NewChapter, ApplicationError> {
        let chapter = self
            .chapter_repo
            .find_by_id(proposal.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", proposal.chapter_id))?;

        let novel = self
            .novel_repo
            .find_by_id(chapter.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", chapter.novel_id))?;

        if !self.user_directory.exists(proposal.proposer_id).await? {
            return Err(ApplicationError::not_found("User", proposal.proposer_id));
        }

        if let Some(existing) = self.chapter_repo.find_by_origin_proposal(proposal.id).await? {
            tracing::error!(
                proposal_id = proposal.id,
                chapter_id = existing.id,
                chapter_number = existing.chapter_number,
                "Proposal already promoted"
            );
            return Err(ApplicationError::invariant(format!(
                "proposal {} already promoted to chapter {}",
                proposal.id, existing.id
            )));
        }

        Ok(NewChapter {
            novel_id: novel.id,
            author_id: proposal.proposer_id,
            title: proposal.title.clone(),
            content: proposal.content.clone(),
            from_proposal_id: Some(proposal.id),
            created_at: self.clock.now(),
        })
    }

    /// 晋升提案为新章节
    pub async fn promote(
        &self,
        proposal: &ProposalRecord,
    ) -> Result<PromotedChapter, ApplicationError> {
        let draft = self.prepare(proposal).await?;

        let created = self
            .chapter_creation
            .create_chapter(&draft)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(msg) => {
                    tracing::error!(proposal_id = proposal.id, error = %msg, "Duplicate promotion rejected by storage");
                    ApplicationError::invariant(format!(
                        "proposal {} already promoted: {}",
                        proposal.id, msg
                    ))
                }
                other => ApplicationError::from(other),
            })?;

        tracing::info!(
            proposal_id = proposal.id,
            novel_id = draft.novel_id,
            chapter_id = created.id,
            chapter_number = created.chapter_number,
            "Proposal promoted to chapter"
        );

        Ok(PromotedChapter {
            chapter_id: created.id,
            novel_id: draft.novel_id,
            chapter_number: created.chapter_number,
            from_proposal_id: proposal.id,
        })
    }
}
