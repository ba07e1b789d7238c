//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod finalize_handlers;
mod proposal_handlers;
mod vote_handlers;

pub use finalize_handlers::*;
pub use proposal_handlers::*;
pub use vote_handlers::*;
