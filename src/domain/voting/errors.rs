//! Voting Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("无效的正文: {0}")]
    InvalidContent(String),

    #[error("无效的投票窗口: {0}")]
    InvalidWindow(String),

    #[error("未知的提案状态: {0}")]
    UnknownStatus(String),
}
