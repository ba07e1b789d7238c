//! Clock Port - 时间来源
//!
//! 结算与投票截止判断都通过该端口获取当前时间，测试时可注入手动时钟

use chrono::{DateTime, Utc};

/// Clock Port
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
