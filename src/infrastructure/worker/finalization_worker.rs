//! Finalization Worker - 定时结算投票

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::application::commands::handlers::FinalizeVotingHandler;
use crate::application::commands::RunFinalization;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct FinalizationWorkerConfig {
    /// 扫描间隔
    pub interval: Duration,
}

impl Default for FinalizationWorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
        }
    }
}

/// 结算 Worker
///
/// 按固定间隔触发结算；收到关闭信号后在当前一轮结束时退出
pub struct FinalizationWorker {
    config: FinalizationWorkerConfig,
    handler: Arc<FinalizeVotingHandler>,
    shutdown: watch::Receiver<bool>,
}

impl FinalizationWorker {
    pub fn new(
        config: FinalizationWorkerConfig,
        handler: Arc<FinalizeVotingHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            handler,
            shutdown,
        }
    }

    /// 启动 Worker
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs_f64(),
            "FinalizationWorker started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = self.shutdown.clone();

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("FinalizationWorker stopped");
    }

    async fn tick(&self) {
        match self.handler.handle(RunFinalization).await {
            Ok(report) if report.skipped => {}
            Ok(report) => {
                if !report.failed_chapters.is_empty() {
                    tracing::warn!(
                        failed_chapters = ?report.failed_chapters,
                        "Some chapter groups will be retried on the next run"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Finalization run failed");
            }
        }
    }
}
