//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::RepositoryError;
use crate::domain::VotingError;

/// 前置条件失败的具体原因
///
/// 调用方按种类映射状态码（重复投票 → conflict，已截止/自投 → forbidden）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionKind {
    VotingClosed,
    AlreadyVotedProposal,
    AlreadyVotedChapter,
    SelfVote,
}

impl PreconditionKind {
    pub fn reason(&self) -> &'static str {
        match self {
            PreconditionKind::VotingClosed => "voting period closed",
            PreconditionKind::AlreadyVotedProposal => "already voted on this proposal",
            PreconditionKind::AlreadyVotedChapter => "already voted in this chapter",
            PreconditionKind::SelfVote => "cannot vote for your own proposal",
        }
    }
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: i64,
    },

    /// 前置条件失败
    #[error("{}", kind.reason())]
    PreconditionFailed { kind: PreconditionKind },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 不变量被破坏（只记录，不自动修复）
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// 下游依赖失败（结算时晋升章节所需的数据缺失等）
    #[error("Downstream failure: {0}")]
    DownstreamFailure(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: i64) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建前置条件失败错误
    pub fn precondition(kind: PreconditionKind) -> Self {
        Self::PreconditionFailed { kind }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建不变量破坏错误
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// 创建下游失败错误
    pub fn downstream(message: impl Into<String>) -> Self {
        Self::DownstreamFailure(message.into())
    }

    /// 前置条件种类（其他错误返回 None）
    pub fn precondition_kind(&self) -> Option<PreconditionKind> {
        match self {
            Self::PreconditionFailed { kind } => Some(*kind),
            _ => None,
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<VotingError> for ApplicationError {
    fn from(err: VotingError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_message_is_reason() {
        let err = ApplicationError::precondition(PreconditionKind::AlreadyVotedChapter);
        assert_eq!(err.to_string(), "already voted in this chapter");
        assert_eq!(
            err.precondition_kind(),
            Some(PreconditionKind::AlreadyVotedChapter)
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ApplicationError::not_found("Proposal", 42);
        assert_eq!(err.to_string(), "Proposal not found: 42");
        assert_eq!(err.precondition_kind(), None);
    }
}
