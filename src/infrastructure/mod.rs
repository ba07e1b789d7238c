//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod clock;
pub mod http;
pub mod persistence;
pub mod worker;

pub use clock::{ManualClock, SystemClock};
pub use worker::{FinalizationWorker, FinalizationWorkerConfig};
