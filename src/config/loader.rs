//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `RELAY_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `RELAY_SERVER__PORT=8080`
/// - `RELAY_DATABASE__PATH=/data/relay.db`
/// - `RELAY_VOTING__WINDOW_SECS=86400`
/// - `RELAY_SCHEDULER__ENABLED=false`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.path", "data/relay.db")?
        .set_default("database.max_connections", 5)?
        .set_default("voting.window_secs", 259_200)?
        .set_default("voting.default_page_size", 6)?
        .set_default("voting.max_page_size", 50)?
        .set_default("scheduler.enabled", true)?
        .set_default("scheduler.interval_secs", 3600)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("RELAY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    config
        .voting
        .window()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.voting.default_page_size == 0 || config.voting.max_page_size == 0 {
        return Err(ConfigError::ValidationError(
            "Page size cannot be 0".to_string(),
        ));
    }

    if config.voting.default_page_size > config.voting.max_page_size {
        return Err(ConfigError::ValidationError(format!(
            "Default page size {} exceeds max page size {}",
            config.voting.default_page_size, config.voting.max_page_size
        )));
    }

    if config.scheduler.enabled && config.scheduler.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Scheduler interval cannot be 0 when scheduler is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Voting Window: {}s", config.voting.window_secs);
    tracing::info!(
        "Page Size: default {}, max {}",
        config.voting.default_page_size,
        config.voting.max_page_size
    );
    tracing::info!("Scheduler Enabled: {}", config.scheduler.enabled);
    if config.scheduler.enabled {
        tracing::info!("Scheduler Interval: {}s", config.scheduler.interval_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_db_path() {
        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_window() {
        let mut config = AppConfig::default();
        config.voting.window_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_page_sizes() {
        let mut config = AppConfig::default();
        config.voting.default_page_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.voting.default_page_size = 60;
        config.voting.max_page_size = 50;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_interval_only_matters_when_enabled() {
        let mut config = AppConfig::default();
        config.scheduler.interval_secs = 0;
        assert!(validate_config(&config).is_err());

        config.scheduler.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[voting]
window_secs = 120
default_page_size = 10

[scheduler]
interval_secs = 30
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();

        assert_eq!(config.voting.window_secs, 120);
        assert_eq!(config.voting.default_page_size, 10);
        assert_eq!(config.voting.max_page_size, 50);
        assert_eq!(config.scheduler.interval_secs, 30);
        assert_eq!(config.database.path, "data/relay.db");
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 0").unwrap();

        let result = load_config_from_path(Some(file.path()));

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
