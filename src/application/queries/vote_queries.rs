//! Vote Queries

/// 小说最新章节的提案投票榜（分页，`page` 从 0 开始）
#[derive(Debug, Clone)]
pub struct ListProposals {
    pub novel_id: i64,
    pub page: u32,
    pub page_size: u32,
}

/// 核对章节内每个提案的票数与投票行数
#[derive(Debug, Clone)]
pub struct VerifyVoteTallies {
    pub chapter_id: i64,
}
