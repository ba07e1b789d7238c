//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、ChapterCreation、Clock）
//! - commands: CQRS 命令及处理器（投票、取消投票、提交提案、结算）
//! - queries: CQRS 查询及处理器（投票榜、章节提案、票数核对）
//! - promoter: 提案晋升为章节
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod promoter;
pub mod queries;

// Re-exports
pub use commands::{
    // Vote commands
    CancelVote,
    CastVote,
    // Proposal commands
    SubmitProposal,
    // Finalization commands
    FinalizeNovel,
    RunFinalization,
    // Handlers
    handlers::{
        CancelVoteHandler, CastVoteHandler, FinalizationReport, FinalizeVotingHandler,
        GroupOutcome, SubmitProposalHandler, SubmitProposalResponse, VoteResponse,
    },
};

pub use error::{ApplicationError, PreconditionKind};

pub use ports::{
    // Repositories
    ChapterRecord,
    ChapterRepositoryPort,
    NovelRecord,
    NovelRepositoryPort,
    ProposalRecord,
    ProposalRepositoryPort,
    RepositoryError,
    UserDirectoryPort,
    VoteRecord,
    VoteRepositoryPort,
    // Chapter creation
    ChapterCreationPort,
    // Clock
    ClockPort,
};

pub use promoter::{ChapterPromoter, PromotedChapter};

pub use queries::{
    // Vote queries
    ListProposals,
    VerifyVoteTallies,
    // Proposal queries
    ListChapterProposals,
    // Handlers
    handlers::{
        DeadlineInfo, ListChapterProposalsHandler, ListProposalsHandler, ProposalBoard,
        ProposalEntry, ProposalSummary, TallyReport, VerifyVoteTalliesHandler,
    },
};
