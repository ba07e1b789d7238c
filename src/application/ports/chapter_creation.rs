//! Chapter Creation Port
//!
//! 章节创作功能对外提供的能力：按 `max + 1` 分配序号并持久化章节

use async_trait::async_trait;

use super::{CreatedChapter, NewChapter, RepositoryError};

/// Chapter Creation Port
///
/// 单独晋升（`ChapterPromoter::promote`）走这里。定时结算不经过本端口：
/// 晋升章节由 `ProposalRepositoryPort::commit_finalization` 在状态变更的同一事务内写入，
/// 两条路径共用 `max + 1` 序号规则与 `from_proposal_id` 唯一约束
#[async_trait]
pub trait ChapterCreationPort: Send + Sync {
    /// 创建章节并分配下一个序号
    ///
    /// 同一提案已有章节时返回 `RepositoryError::Duplicate`
    async fn create_chapter(&self, chapter: &NewChapter) -> Result<CreatedChapter, RepositoryError>;
}
