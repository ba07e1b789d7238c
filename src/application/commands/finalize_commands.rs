//! Finalize Commands

/// 扫描所有已过期的投票并结算（定时任务触发）
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFinalization;

/// 立即结算指定小说最新章节的已过期投票（投票页倒计时结束时触发）
#[derive(Debug, Clone, Copy)]
pub struct FinalizeNovel {
    pub novel_id: i64,
}
