//! SQLite Persistence - SQLite 数据库持久化实现

mod chapter_repo;
mod database;
mod novel_repo;
mod proposal_repo;
mod user_repo;
mod vote_repo;

pub use chapter_repo::SqliteChapterRepository;
pub use database::{create_pool, run_migrations, DatabaseConfig, DbPool};
pub(crate) use database::{db_error, decode_ts, decode_u32, encode_ts, is_unique_violation};
pub use novel_repo::SqliteNovelRepository;
pub use proposal_repo::SqliteProposalRepository;
pub use user_repo::SqliteUserDirectory;
pub use vote_repo::SqliteVoteRepository;
