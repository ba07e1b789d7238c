//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod proposal_queries;
mod vote_queries;

pub mod handlers;

pub use proposal_queries::*;
pub use vote_queries::*;
