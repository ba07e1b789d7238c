//! Domain Layer - 领域层
//!
//! 包含一个限界上下文:
//! - Voting Context: 提案投票与结算

pub mod voting;

pub use voting::{
    decide_outcome, Ballot, DecisionKind, GroupDecision, ProposalContent, ProposalStatus,
    ProposalTitle, VotingError, VotingWindow,
};
