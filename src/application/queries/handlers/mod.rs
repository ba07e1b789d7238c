//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod proposal_handlers;
mod vote_handlers;

pub use proposal_handlers::*;
pub use vote_handlers::*;
