//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::domain::{VotingError, VotingWindow};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 投票配置
    #[serde(default)]
    pub voting: VotingConfig,

    /// 定时结算配置
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/relay.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 投票配置
#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    /// 投票窗口（秒），从章节发布时刻起算
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// 投票榜默认每页条数
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// 投票榜每页上限
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_window_secs() -> u64 {
    259_200 // 3 天
}

fn default_page_size() -> u32 {
    6
}

fn default_max_page_size() -> u32 {
    50
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl VotingConfig {
    pub fn window(&self) -> Result<VotingWindow, VotingError> {
        VotingWindow::from_secs(self.window_secs)
    }
}

/// 定时结算配置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// 是否启用定时结算
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// 结算间隔（秒）
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    3600 // 1 小时
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
