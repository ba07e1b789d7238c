//! Voting Context - 结算规则
//!
//! 纯函数，不依赖存储，按章节分组调用

use serde::Serialize;

use super::ProposalStatus;

/// 参与结算的提案票数快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ballot {
    pub proposal_id: i64,
    pub vote_count: u32,
}

impl Ballot {
    pub fn new(proposal_id: i64, vote_count: u32) -> Self {
        Self {
            proposal_id,
            vote_count,
        }
    }
}

/// 结算结果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// 唯一最高票且票数大于 0
    SingleWinner,
    /// 无人投票
    NoVotes,
    /// 最高票并列
    Tie,
}

/// 单个章节分组的结算结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDecision {
    pub kind: DecisionKind,
    pub max_votes: u32,
    /// 每个提案的目标状态，顺序与输入一致
    pub outcomes: Vec<(i64, ProposalStatus)>,
    /// 被采纳的提案（仅 SingleWinner 时存在）
    pub winner: Option<i64>,
}

impl GroupDecision {
    pub fn status_of(&self, proposal_id: i64) -> Option<ProposalStatus> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == proposal_id)
            .map(|(_, status)| *status)
    }
}

/// 决定一个章节分组的结算结果
///
/// 规则:
/// - 唯一最高票且 max > 0: 最高票 ADOPTED，其余 REJECTED
/// - max == 0: 全部最高票（即全部提案）PENDING
/// - 两个及以上并列最高票且 max > 0: 并列者 PENDING，其余 REJECTED
///
/// 空分组返回 `None`。
pub fn decide_outcome(ballots: &[Ballot]) -> Option<GroupDecision> {
    let max_votes = ballots.iter().map(|b| b.vote_count).max()?;
    let winners = ballots.iter().filter(|b| b.vote_count == max_votes).count();

    let kind = if max_votes == 0 {
        DecisionKind::NoVotes
    } else if winners == 1 {
        DecisionKind::SingleWinner
    } else {
        DecisionKind::Tie
    };

    let top_status = match kind {
        DecisionKind::SingleWinner => ProposalStatus::Adopted,
        DecisionKind::NoVotes | DecisionKind::Tie => ProposalStatus::Pending,
    };

    let outcomes: Vec<(i64, ProposalStatus)> = ballots
        .iter()
        .map(|b| {
            let status = if b.vote_count == max_votes {
                top_status
            } else {
                ProposalStatus::Rejected
            };
            (b.proposal_id, status)
        })
        .collect();

    let winner = match kind {
        DecisionKind::SingleWinner => ballots
            .iter()
            .find(|b| b.vote_count == max_votes)
            .map(|b| b.proposal_id),
        _ => None,
    };

    Some(GroupDecision {
        kind,
        max_votes,
        outcomes,
        winner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballots(counts: &[(i64, u32)]) -> Vec<Ballot> {
        counts.iter().map(|&(id, c)| Ballot::new(id, c)).collect()
    }

    #[test]
    fn test_single_winner_adopted_rest_rejected() {
        let decision = decide_outcome(&ballots(&[(1, 3), (2, 7), (3, 2)])).unwrap();

        assert_eq!(decision.kind, DecisionKind::SingleWinner);
        assert_eq!(decision.max_votes, 7);
        assert_eq!(decision.winner, Some(2));
        assert_eq!(decision.status_of(1), Some(ProposalStatus::Rejected));
        assert_eq!(decision.status_of(2), Some(ProposalStatus::Adopted));
        assert_eq!(decision.status_of(3), Some(ProposalStatus::Rejected));
    }

    #[test]
    fn test_tie_at_top_goes_pending() {
        let decision = decide_outcome(&ballots(&[(1, 5), (2, 5), (3, 1)])).unwrap();

        assert_eq!(decision.kind, DecisionKind::Tie);
        assert_eq!(decision.winner, None);
        assert_eq!(decision.status_of(1), Some(ProposalStatus::Pending));
        assert_eq!(decision.status_of(2), Some(ProposalStatus::Pending));
        assert_eq!(decision.status_of(3), Some(ProposalStatus::Rejected));
    }

    #[test]
    fn test_no_votes_all_pending() {
        let decision = decide_outcome(&ballots(&[(1, 0), (2, 0)])).unwrap();

        assert_eq!(decision.kind, DecisionKind::NoVotes);
        assert_eq!(decision.winner, None);
        assert!(decision
            .outcomes
            .iter()
            .all(|(_, s)| *s == ProposalStatus::Pending));
    }

    #[test]
    fn test_lone_proposal_without_votes_is_pending() {
        let decision = decide_outcome(&ballots(&[(9, 0)])).unwrap();

        assert_eq!(decision.kind, DecisionKind::NoVotes);
        assert_eq!(decision.status_of(9), Some(ProposalStatus::Pending));
    }

    #[test]
    fn test_lone_proposal_with_votes_is_adopted() {
        let decision = decide_outcome(&ballots(&[(9, 1)])).unwrap();

        assert_eq!(decision.kind, DecisionKind::SingleWinner);
        assert_eq!(decision.winner, Some(9));
    }

    #[test]
    fn test_every_ballot_gets_exactly_one_outcome() {
        let input = ballots(&[(4, 2), (5, 8), (6, 8), (7, 0)]);
        let decision = decide_outcome(&input).unwrap();

        assert_eq!(decision.outcomes.len(), input.len());
        for (ballot, (id, status)) in input.iter().zip(&decision.outcomes) {
            assert_eq!(ballot.proposal_id, *id);
            assert!(ProposalStatus::Voting.can_transition_to(*status));
        }
    }

    #[test]
    fn test_empty_group_has_no_decision() {
        assert!(decide_outcome(&[]).is_none());
    }
}
