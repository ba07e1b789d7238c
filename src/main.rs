//! Relay Novel - 接龙小说提案投票服务
//!
//! - Domain: voting/ (Bounded Context)
//! - Application: commands, queries, ports, promoter
//! - Infrastructure: http, worker, persistence, clock

use std::sync::Arc;

use relay_novel::config::{load_config, print_config, AppConfig};
use relay_novel::infrastructure::http::{
    AppState, HttpServer, Repositories, VotingOptions,
};
use relay_novel::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteChapterRepository, SqliteNovelRepository,
    SqliteProposalRepository, SqliteUserDirectory, SqliteVoteRepository,
};
use relay_novel::infrastructure::{FinalizationWorker, FinalizationWorkerConfig, SystemClock};
use tokio::sync::watch;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},relay_novel={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Relay Novel - proposal voting service");
    print_config(&config);

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let chapters = Arc::new(SqliteChapterRepository::new(pool.clone()));
    let repos = Repositories {
        novels: Arc::new(SqliteNovelRepository::new(pool.clone())),
        chapters: chapters.clone(),
        chapter_creation: chapters,
        proposals: Arc::new(SqliteProposalRepository::new(pool.clone())),
        votes: Arc::new(SqliteVoteRepository::new(pool.clone())),
        users: Arc::new(SqliteUserDirectory::new(pool)),
    };

    let options = VotingOptions {
        window: config.voting.window()?,
        default_page_size: config.voting.default_page_size,
        max_page_size: config.voting.max_page_size,
    };
    let state = Arc::new(AppState::new(repos, Arc::new(SystemClock), options));

    // 启动定时结算
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = if config.scheduler.enabled {
        let worker = FinalizationWorker::new(
            FinalizationWorkerConfig {
                interval: config.scheduler.interval(),
            },
            state.finalize_handler.clone(),
            shutdown_rx,
        );
        Some(tokio::spawn(worker.run()))
    } else {
        tracing::warn!("Scheduled finalization disabled");
        None
    };

    let server = HttpServer::new(config.server.addr(), state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "FinalizationWorker task failed");
        }
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
