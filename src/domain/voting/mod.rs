//! Voting Context - 提案投票限界上下文
//!
//! 职责:
//! - 提案状态机
//! - 投票窗口与截止时间
//! - 章节分组结算规则

mod errors;
mod outcome;
mod value_objects;

pub use errors::VotingError;
pub use outcome::{decide_outcome, Ballot, DecisionKind, GroupDecision};
pub use value_objects::{
    ProposalContent, ProposalStatus, ProposalTitle, VotingWindow, MAX_CONTENT_CHARS,
    MAX_TITLE_CHARS,
};
