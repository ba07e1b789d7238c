//! Proposal Queries

/// 列出章节的全部提案（按提交时间）
#[derive(Debug, Clone)]
pub struct ListChapterProposals {
    pub chapter_id: i64,
}
