//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod finalize_commands;
mod proposal_commands;
mod vote_commands;

pub mod handlers;

pub use finalize_commands::*;
pub use proposal_commands::*;
pub use vote_commands::*;
