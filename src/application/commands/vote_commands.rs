//! Vote Commands

/// 投票命令
#[derive(Debug, Clone)]
pub struct CastVote {
    pub proposal_id: i64,
    pub user_id: i64,
}

/// 取消投票命令
#[derive(Debug, Clone)]
pub struct CancelVote {
    pub proposal_id: i64,
    pub user_id: i64,
}
