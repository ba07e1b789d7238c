//! Relay Novel - 接龙小说提案投票与章节晋升服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voting Context: 提案状态机、投票窗口、分组结算规则
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repositories, ChapterCreation, Clock）
//! - Commands: 投票、取消投票、提交提案、结算
//! - Queries: 投票榜、章节提案、票数核对
//! - Promoter: 提案晋升为章节
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Worker: FinalizationWorker 定时结算
//! - Persistence: SQLite 存储
//! - Clock: 系统时钟 / 手动时钟

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{load_config, AppConfig};
