//! Proposal Query Handlers

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{ChapterRepositoryPort, ProposalRecord, ProposalRepositoryPort};
use crate::application::queries::ListChapterProposals;
use crate::domain::ProposalStatus;

/// 提案摘要
#[derive(Debug, Clone, Serialize)]
pub struct ProposalSummary {
    pub proposal_id: i64,
    pub proposer_id: i64,
    pub title: String,
    pub vote_count: u32,
    pub status: ProposalStatus,
    pub ai_generated: bool,
    pub vote_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<ProposalRecord> for ProposalSummary {
    fn from(record: ProposalRecord) -> Self {
        Self {
            proposal_id: record.id,
            proposer_id: record.proposer_id,
            title: record.title,
            vote_count: record.vote_count,
            status: record.status,
            ai_generated: record.ai_generated,
            vote_deadline: record.vote_deadline,
            created_at: record.created_at,
        }
    }
}

/// ListChapterProposals Handler
pub struct ListChapterProposalsHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    proposal_repo: Arc<dyn ProposalRepositoryPort>,
}

impl ListChapterProposalsHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        proposal_repo: Arc<dyn ProposalRepositoryPort>,
    ) -> Self {
        Self {
            chapter_repo,
            proposal_repo,
        }
    }

    pub async fn handle(
        &self,
        query: ListChapterProposals,
    ) -> Result<Vec<ProposalSummary>, ApplicationError> {
        self.chapter_repo
            .find_by_id(query.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", query.chapter_id))?;

        let proposals = self.proposal_repo.find_by_chapter(query.chapter_id).await?;
        Ok(proposals.into_iter().map(ProposalSummary::from).collect())
    }
}
