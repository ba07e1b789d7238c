//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod chapter_creation;
mod clock;
mod repositories;

pub use chapter_creation::ChapterCreationPort;
pub use clock::ClockPort;
pub use repositories::{
    ChapterRecord, ChapterRepositoryPort, CreatedChapter, NewChapter, NewProposal, NewVote,
    NovelRecord, NovelRepositoryPort, ProposalRecord, ProposalRepositoryPort, RepositoryError,
    StatusChange, UserDirectoryPort, VoteRecord, VoteRepositoryPort, VoteTally,
};
