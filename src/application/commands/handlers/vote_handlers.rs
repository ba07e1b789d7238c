//! Vote Command Handlers
//!
//! 投票与取消投票。前置条件按固定顺序检查，每种失败对应独立的错误种类；
//! 投票行与票数计数在存储层同一事务内变更。

use serde::Serialize;
use std::sync::Arc;

use crate::application::commands::{CancelVote, CastVote};
use crate::application::error::{ApplicationError, PreconditionKind};
use crate::application::ports::{
    ClockPort, NewVote, ProposalRecord, ProposalRepositoryPort, RepositoryError,
    VoteRepositoryPort,
};
use crate::domain::{ProposalStatus, VotingWindow};

/// 投票/取消投票响应
#[derive(Debug, Clone, Serialize)]
pub struct VoteResponse {
    pub vote_id: i64,
    pub proposal_id: i64,
    pub vote_count: u32,
}

fn is_open(proposal: &ProposalRecord, now: chrono::DateTime<chrono::Utc>) -> bool {
    proposal.status == ProposalStatus::Voting && VotingWindow::is_open(proposal.vote_deadline, now)
}

// ============================================================================
// CastVote
// ============================================================================

/// CastVote Handler
pub struct CastVoteHandler {
    proposal_repo: Arc<dyn ProposalRepositoryPort>,
    vote_repo: Arc<dyn VoteRepositoryPort>,
    clock: Arc<dyn ClockPort>,
}

impl CastVoteHandler {
    pub fn new(
        proposal_repo: Arc<dyn ProposalRepositoryPort>,
        vote_repo: Arc<dyn VoteRepositoryPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            proposal_repo,
            vote_repo,
            clock,
        }
    }

    pub async fn handle(&self, command: CastVote) -> Result<VoteResponse, ApplicationError> {
        let CastVote {
            proposal_id,
            user_id,
        } = command;

        // (a) 提案存在
        let proposal = self
            .proposal_repo
            .find_by_id(proposal_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Proposal", proposal_id))?;

        // (b) 投票未截止
        let now = self.clock.now();
        if !is_open(&proposal, now) {
            return Err(self.reject(proposal_id, user_id, PreconditionKind::VotingClosed));
        }

        // (c) 未对该提案投过票
        if self.vote_repo.exists(user_id, proposal_id).await? {
            return Err(self.reject(proposal_id, user_id, PreconditionKind::AlreadyVotedProposal));
        }

        // (d) 未在同一章节的其他提案投过票
        if self
            .vote_repo
            .exists_for_chapter(user_id, proposal.chapter_id)
            .await?
        {
            return Err(self.reject(proposal_id, user_id, PreconditionKind::AlreadyVotedChapter));
        }

        // (e) 不能给自己的提案投票
        if proposal.proposer_id == user_id {
            return Err(self.reject(proposal_id, user_id, PreconditionKind::SelfVote));
        }

        let vote = NewVote {
            user_id,
            proposal_id,
            chapter_id: proposal.chapter_id,
            voted_at: now,
        };

        // 存储层再次校验状态/截止时间与唯一约束，覆盖并发窗口
        let tally = match self.vote_repo.record(&vote).await {
            Ok(tally) => tally,
            Err(RepositoryError::Conflict(_)) => {
                return Err(self.reject(proposal_id, user_id, PreconditionKind::VotingClosed));
            }
            Err(RepositoryError::Duplicate(_)) => {
                let kind = if self.vote_repo.exists(user_id, proposal_id).await? {
                    PreconditionKind::AlreadyVotedProposal
                } else {
                    PreconditionKind::AlreadyVotedChapter
                };
                return Err(self.reject(proposal_id, user_id, kind));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            proposal_id = proposal_id,
            chapter_id = proposal.chapter_id,
            user_id = user_id,
            vote_count = tally.vote_count,
            "Vote cast"
        );

        Ok(VoteResponse {
            vote_id: tally.vote_id,
            proposal_id,
            vote_count: tally.vote_count,
        })
    }

    fn reject(&self, proposal_id: i64, user_id: i64, kind: PreconditionKind) -> ApplicationError {
        tracing::warn!(
            proposal_id = proposal_id,
            user_id = user_id,
            reason = kind.reason(),
            "Vote rejected"
        );
        ApplicationError::precondition(kind)
    }
}

// ============================================================================
// CancelVote
// ============================================================================

/// CancelVote Handler
pub struct CancelVoteHandler {
    proposal_repo: Arc<dyn ProposalRepositoryPort>,
    vote_repo: Arc<dyn VoteRepositoryPort>,
    clock: Arc<dyn ClockPort>,
}

impl CancelVoteHandler {
    pub fn new(
        proposal_repo: Arc<dyn ProposalRepositoryPort>,
        vote_repo: Arc<dyn VoteRepositoryPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            proposal_repo,
            vote_repo,
            clock,
        }
    }

    pub async fn handle(&self, command: CancelVote) -> Result<VoteResponse, ApplicationError> {
        let CancelVote {
            proposal_id,
            user_id,
        } = command;

        let proposal = self
            .proposal_repo
            .find_by_id(proposal_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Proposal", proposal_id))?;

        // 截止后票数已被结算读取，不再允许变更
        let now = self.clock.now();
        if !is_open(&proposal, now) {
            tracing::warn!(
                proposal_id = proposal_id,
                user_id = user_id,
                "Vote cancellation rejected: voting closed"
            );
            return Err(ApplicationError::precondition(PreconditionKind::VotingClosed));
        }

        let tally = match self.vote_repo.retract(user_id, proposal_id, now).await {
            Ok(Some(tally)) => tally,
            Ok(None) => return Err(ApplicationError::not_found("Proposal vote", proposal_id)),
            Err(RepositoryError::Conflict(_)) => {
                return Err(ApplicationError::precondition(PreconditionKind::VotingClosed));
            }
            Err(RepositoryError::Inconsistent(msg)) => {
                tracing::error!(
                    proposal_id = proposal_id,
                    user_id = user_id,
                    error = %msg,
                    "Vote counter inconsistent with vote rows"
                );
                return Err(ApplicationError::invariant(msg));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            proposal_id = proposal_id,
            user_id = user_id,
            vote_count = tally.vote_count,
            "Vote cancelled"
        );

        Ok(VoteResponse {
            vote_id: tally.vote_id,
            proposal_id,
            vote_count: tally.vote_count,
        })
    }
}
