//! Finalization Handlers
//!
//! 扫描所有截止时间已过且仍在投票中的提案，按章节分组结算。
//! 每个分组独立提交：状态变更与晋升章节在同一事务内写入，
//! 某个分组失败时记录日志并继续处理其余分组，失败分组保持投票中状态，
//! 下一次运行会重新处理。

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::commands::{FinalizeNovel, RunFinalization};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterRepositoryPort, ClockPort, NovelRepositoryPort, ProposalRecord,
    ProposalRepositoryPort, RepositoryError, StatusChange,
};
use crate::application::promoter::{ChapterPromoter, PromotedChapter};
use crate::domain::{decide_outcome, Ballot, DecisionKind, ProposalStatus};

/// 单个章节分组的结算结果
#[derive(Debug, Clone, Serialize)]
pub struct GroupOutcome {
    pub chapter_id: i64,
    pub kind: DecisionKind,
    pub max_votes: u32,
    pub adopted: Option<i64>,
    pub pending: Vec<i64>,
    pub rejected: Vec<i64>,
    pub promoted: Option<PromotedChapter>,
}

/// 一次结算运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalizationReport {
    /// 上一次运行尚未结束，本次跳过
    pub skipped: bool,
    /// 扫描到的过期提案数
    pub scanned: usize,
    pub finalized: Vec<GroupOutcome>,
    pub failed_chapters: Vec<i64>,
}

impl FinalizationReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// 本次写入状态变更的提案数
    pub fn updated_proposals(&self) -> usize {
        self.finalized
            .iter()
            .map(|g| usize::from(g.adopted.is_some()) + g.pending.len() + g.rejected.len())
            .sum()
    }

    pub fn promoted_chapters(&self) -> Vec<PromotedChapter> {
        self.finalized.iter().filter_map(|g| g.promoted).collect()
    }
}

/// FinalizeVoting Handler
///
/// 同一进程内同时只有一次结算在执行：定时运行遇到忙碌直接跳过，
/// 手动结算等待前一次完成。
pub struct FinalizeVotingHandler {
    novel_repo: Arc<dyn NovelRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    proposal_repo: Arc<dyn ProposalRepositoryPort>,
    promoter: Arc<ChapterPromoter>,
    clock: Arc<dyn ClockPort>,
    in_flight: Mutex<()>,
}

impl FinalizeVotingHandler {
    pub fn new(
        novel_repo: Arc<dyn NovelRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        proposal_repo: Arc<dyn ProposalRepositoryPort>,
        promoter: Arc<ChapterPromoter>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            novel_repo,
            chapter_repo,
            proposal_repo,
            promoter,
            clock,
            in_flight: Mutex::new(()),
        }
    }

    /// 结算所有过期分组
    pub async fn handle(
        &self,
        _command: RunFinalization,
    ) -> Result<FinalizationReport, ApplicationError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Finalization already running, skipping this tick");
            return Ok(FinalizationReport::skipped());
        };

        let now = self.clock.now();
        let expired = self.proposal_repo.find_expired_voting(now).await?;
        if expired.is_empty() {
            tracing::debug!("No expired proposals to finalize");
            return Ok(FinalizationReport::default());
        }

        let report = self.finalize_groups(expired).await;

        tracing::info!(
            scanned = report.scanned,
            groups = report.finalized.len(),
            updated = report.updated_proposals(),
            failed = report.failed_chapters.len(),
            "Finalization run completed"
        );

        Ok(report)
    }

    /// 手动结算指定小说的最新章节
    ///
    /// 返回本次晋升的章节；最新章节没有已过期的投票中提案时返回 `None`
    pub async fn finalize_novel(
        &self,
        command: FinalizeNovel,
    ) -> Result<Option<PromotedChapter>, ApplicationError> {
        let _guard = self.in_flight.lock().await;

        self.novel_repo
            .find_by_id(command.novel_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Novel", command.novel_id))?;

        let Some(chapter) = self
            .chapter_repo
            .find_latest_by_novel(command.novel_id)
            .await?
        else {
            return Ok(None);
        };

        let now = self.clock.now();
        let expired = self
            .proposal_repo
            .find_expired_voting_by_chapter(chapter.id, now)
            .await?;
        if expired.is_empty() {
            tracing::info!(
                novel_id = command.novel_id,
                chapter_id = chapter.id,
                "Nothing to finalize for novel"
            );
            return Ok(None);
        }

        let outcome = self.finalize_group(chapter.id, &expired).await?;
        Ok(outcome.promoted)
    }

    async fn finalize_groups(&self, expired: Vec<ProposalRecord>) -> FinalizationReport {
        let scanned = expired.len();

        let mut groups: BTreeMap<i64, Vec<ProposalRecord>> = BTreeMap::new();
        for proposal in expired {
            groups.entry(proposal.chapter_id).or_default().push(proposal);
        }

        let mut report = FinalizationReport {
            scanned,
            ..FinalizationReport::default()
        };

        for (chapter_id, group) in groups {
            match self.finalize_group(chapter_id, &group).await {
                Ok(outcome) => report.finalized.push(outcome),
                Err(e) => {
                    let proposal_ids: Vec<i64> = group.iter().map(|p| p.id).collect();
                    let vote_counts: Vec<u32> = group.iter().map(|p| p.vote_count).collect();
                    tracing::error!(
                        chapter_id = chapter_id,
                        proposal_ids = ?proposal_ids,
                        vote_counts = ?vote_counts,
                        error = %e,
                        "Failed to finalize chapter group, left in voting state"
                    );
                    report.failed_chapters.push(chapter_id);
                }
            }
        }

        report
    }

    async fn finalize_group(
        &self,
        chapter_id: i64,
        group: &[ProposalRecord],
    ) -> Result<GroupOutcome, ApplicationError> {
        let ballots: Vec<Ballot> = group
            .iter()
            .map(|p| Ballot::new(p.id, p.vote_count))
            .collect();
        let decision = decide_outcome(&ballots).ok_or_else(|| {
            ApplicationError::InternalError(format!("empty proposal group for chapter {}", chapter_id))
        })?;

        let draft = match decision.winner {
            Some(winner_id) => {
                let winner = group.iter().find(|p| p.id == winner_id).ok_or_else(|| {
                    ApplicationError::InternalError(format!("winner {} missing from group", winner_id))
                })?;
                let draft = self.promoter.prepare(winner).await.map_err(|e| match e {
                    ApplicationError::NotFound { .. } | ApplicationError::RepositoryError(_) => {
                        ApplicationError::downstream(format!(
                            "cannot promote proposal {}: {}",
                            winner_id, e
                        ))
                    }
                    other => other,
                })?;
                Some(draft)
            }
            None => None,
        };

        let changes: Vec<StatusChange> = group
            .iter()
            .zip(&decision.outcomes)
            .map(|(proposal, (_, status))| StatusChange {
                proposal_id: proposal.id,
                status: *status,
                expected_vote_count: proposal.vote_count,
            })
            .collect();

        let created = self
            .proposal_repo
            .commit_finalization(&changes, draft.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(msg) => ApplicationError::invariant(format!(
                    "chapter {} promotion rejected by storage: {}",
                    chapter_id, msg
                )),
                other => ApplicationError::from(other),
            })?;

        let promoted = match (decision.winner, draft.as_ref(), created) {
            (Some(proposal_id), Some(draft), Some(created)) => Some(PromotedChapter {
                chapter_id: created.id,
                novel_id: draft.novel_id,
                chapter_number: created.chapter_number,
                from_proposal_id: proposal_id,
            }),
            _ => None,
        };

        let ids_with = |wanted: ProposalStatus| -> Vec<i64> {
            decision
                .outcomes
                .iter()
                .filter(|(_, status)| *status == wanted)
                .map(|(id, _)| *id)
                .collect()
        };

        let outcome = GroupOutcome {
            chapter_id,
            kind: decision.kind,
            max_votes: decision.max_votes,
            adopted: decision.winner,
            pending: ids_with(ProposalStatus::Pending),
            rejected: ids_with(ProposalStatus::Rejected),
            promoted,
        };

        match outcome.kind {
            DecisionKind::SingleWinner => tracing::info!(
                chapter_id = chapter_id,
                adopted = ?outcome.adopted,
                max_votes = outcome.max_votes,
                new_chapter_id = ?promoted.map(|p| p.chapter_id),
                "Chapter group finalized with a winner"
            ),
            DecisionKind::Tie => tracing::info!(
                chapter_id = chapter_id,
                pending = ?outcome.pending,
                max_votes = outcome.max_votes,
                "Chapter group tied, proposals left pending"
            ),
            DecisionKind::NoVotes => tracing::info!(
                chapter_id = chapter_id,
                pending = ?outcome.pending,
                "Chapter group received no votes, proposals left pending"
            ),
        }

        Ok(outcome)
    }
}
