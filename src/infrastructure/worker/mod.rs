//! Worker Layer - Background Task Processing
//!
//! 实现 FinalizationWorker，定时结算过期投票

mod finalization_worker;

pub use finalization_worker::{FinalizationWorker, FinalizationWorkerConfig};
