//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::ProposalStatus;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// 条件更新未命中（记录已被并发修改或状态不符）
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 存储中的冗余数据互相矛盾
    #[error("Inconsistent state: {0}")]
    Inconsistent(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Novel / Chapter
// ============================================================================

/// 小说（只读视图）
#[derive(Debug, Clone)]
pub struct NovelRecord {
    pub id: i64,
    pub title: String,
    pub chapter_count: u32,
    pub created_at: DateTime<Utc>,
}

/// 章节
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub id: i64,
    pub novel_id: i64,
    /// 从 1 开始，同一小说内连续递增
    pub chapter_number: u32,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    /// 由提案晋升而来时指向原提案
    pub from_proposal_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Novel Repository Port
#[async_trait]
pub trait NovelRepositoryPort: Send + Sync {
    /// 根据 ID 查找小说
    async fn find_by_id(&self, id: i64) -> Result<Option<NovelRecord>, RepositoryError>;
}

/// Chapter Repository Port
#[async_trait]
pub trait ChapterRepositoryPort: Send + Sync {
    /// 根据 ID 查找章节
    async fn find_by_id(&self, id: i64) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 获取小说序号最大的章节
    async fn find_latest_by_novel(
        &self,
        novel_id: i64,
    ) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 查找由指定提案晋升而来的章节
    async fn find_by_origin_proposal(
        &self,
        proposal_id: i64,
    ) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 获取小说的所有章节（按序号升序）
    async fn find_by_novel(&self, novel_id: i64) -> Result<Vec<ChapterRecord>, RepositoryError>;
}

// ============================================================================
// Proposal Repository
// ============================================================================

/// 提案
#[derive(Debug, Clone)]
pub struct ProposalRecord {
    pub id: i64,
    pub chapter_id: i64,
    pub proposer_id: i64,
    pub title: String,
    pub content: String,
    /// 缓存计数，必须等于有效投票行数
    pub vote_count: u32,
    pub vote_deadline: DateTime<Utc>,
    pub status: ProposalStatus,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

/// 新建提案
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub chapter_id: i64,
    pub proposer_id: i64,
    pub title: String,
    pub content: String,
    pub vote_deadline: DateTime<Utc>,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

/// 结算时的单条状态变更
///
/// `expected_vote_count` 为结算读取时的票数，写入时作为条件，
/// 票数变化则整组回滚
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub proposal_id: i64,
    pub status: ProposalStatus,
    pub expected_vote_count: u32,
}

/// 待创建的章节
#[derive(Debug, Clone)]
pub struct NewChapter {
    pub novel_id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub from_proposal_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 已创建章节的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedChapter {
    pub id: i64,
    pub chapter_number: u32,
}

/// Proposal Repository Port
#[async_trait]
pub trait ProposalRepositoryPort: Send + Sync {
    /// 保存新提案，返回 ID
    async fn insert(&self, proposal: &NewProposal) -> Result<i64, RepositoryError>;

    /// 根据 ID 查找提案
    async fn find_by_id(&self, id: i64) -> Result<Option<ProposalRecord>, RepositoryError>;

    /// 获取章节的所有提案（按创建时间升序）
    async fn find_by_chapter(&self, chapter_id: i64)
        -> Result<Vec<ProposalRecord>, RepositoryError>;

    /// 分页获取章节提案（按票数降序）
    async fn find_by_chapter_ranked(
        &self,
        chapter_id: i64,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProposalRecord>, RepositoryError>;

    /// 统计章节的提案数
    async fn count_by_chapter(&self, chapter_id: i64) -> Result<u64, RepositoryError>;

    /// 获取所有截止时间早于 `now` 且仍在投票中的提案
    async fn find_expired_voting(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProposalRecord>, RepositoryError>;

    /// 获取指定章节中已过期且仍在投票中的提案
    async fn find_expired_voting_by_chapter(
        &self,
        chapter_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProposalRecord>, RepositoryError>;

    /// 在一个事务内写入一组状态变更，并可选地创建晋升章节
    ///
    /// 任一变更未命中（状态已非投票中或票数已变化）时整组回滚，
    /// 返回 `RepositoryError::Conflict`
    async fn commit_finalization(
        &self,
        changes: &[StatusChange],
        promotion: Option<&NewChapter>,
    ) -> Result<Option<CreatedChapter>, RepositoryError>;
}

// ============================================================================
// Vote Repository
// ============================================================================

/// 投票
#[derive(Debug, Clone)]
pub struct VoteRecord {
    pub id: i64,
    pub user_id: i64,
    pub proposal_id: i64,
    pub chapter_id: i64,
    pub voted_at: DateTime<Utc>,
}

/// 新建投票
#[derive(Debug, Clone)]
pub struct NewVote {
    pub user_id: i64,
    pub proposal_id: i64,
    pub chapter_id: i64,
    pub voted_at: DateTime<Utc>,
}

/// 投票写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTally {
    pub vote_id: i64,
    pub proposal_id: i64,
    /// 写入后的票数
    pub vote_count: u32,
}

/// Vote Repository Port
#[async_trait]
pub trait VoteRepositoryPort: Send + Sync {
    /// 用户是否已为该提案投票
    async fn exists(&self, user_id: i64, proposal_id: i64) -> Result<bool, RepositoryError>;

    /// 用户是否已在该章节的任一提案投票
    async fn exists_for_chapter(
        &self,
        user_id: i64,
        chapter_id: i64,
    ) -> Result<bool, RepositoryError>;

    /// 查找用户对提案的投票
    async fn find(
        &self,
        user_id: i64,
        proposal_id: i64,
    ) -> Result<Option<VoteRecord>, RepositoryError>;

    /// 插入投票并原子地增加提案票数
    ///
    /// 提案不在投票中或已过截止时间时返回 `Conflict`，
    /// 违反唯一约束时返回 `Duplicate`
    async fn record(&self, vote: &NewVote) -> Result<VoteTally, RepositoryError>;

    /// 删除投票并原子地减少提案票数
    ///
    /// 投票不存在时返回 `Ok(None)`；提案已不可投票时返回 `Conflict`；
    /// 票数已为 0 时返回 `Inconsistent`
    async fn retract(
        &self,
        user_id: i64,
        proposal_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<VoteTally>, RepositoryError>;

    /// 统计提案的有效投票行数
    async fn count_for_proposal(&self, proposal_id: i64) -> Result<u32, RepositoryError>;
}

// ============================================================================
// User Directory
// ============================================================================

/// 用户目录端口（账户体系属于外部系统，这里只读）
#[async_trait]
pub trait UserDirectoryPort: Send + Sync {
    /// 用户是否存在
    async fn exists(&self, user_id: i64) -> Result<bool, RepositoryError>;

    /// 批量获取昵称
    async fn find_nicknames(&self, user_ids: &[i64])
        -> Result<HashMap<i64, String>, RepositoryError>;
}
