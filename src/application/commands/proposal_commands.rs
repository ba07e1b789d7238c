//! Proposal Commands

/// 提交续写提案命令
#[derive(Debug, Clone)]
pub struct SubmitProposal {
    pub chapter_id: i64,
    pub proposer_id: i64,
    pub title: String,
    pub content: String,
    pub ai_generated: bool,
}
