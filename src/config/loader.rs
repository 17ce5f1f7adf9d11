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
/// 1. 环境变量（前缀 `YOMIAGE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `YOMIAGE_GATEWAY__TOKEN=xxxx`
/// - `YOMIAGE_GATEWAY__URL=wss://chat.example.com/gateway`
/// - `YOMIAGE_GATEWAY__LOG_CHANNEL_ID=1234567890`
/// - `YOMIAGE_TTS__LOCALE=ja-JP`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("gateway.url", "ws://127.0.0.1:8700/gateway")?
        .set_default("gateway.token", "")?
        .set_default("gateway.command_prefix", ">")?
        .set_default("tts.locale", "ja-JP")?
        .set_default("tts.timeout_secs", 30)?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: YOMIAGE_
    // 层级分隔符: __ (双下划线)
    // 例如: YOMIAGE_GATEWAY__TOKEN=xxxx
    builder = builder.add_source(
        Environment::with_prefix("YOMIAGE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // token 缺失是唯一的致命启动错误
    if config.gateway.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Gateway token is required (YOMIAGE_GATEWAY__TOKEN)".to_string(),
        ));
    }

    if config.gateway.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Gateway URL cannot be empty".to_string(),
        ));
    }

    if config.gateway.command_prefix.chars().count() != 1 {
        return Err(ConfigError::ValidationError(
            "Command prefix must be exactly one character".to_string(),
        ));
    }

    if config.tts.locale.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS locale cannot be empty".to_string(),
        ));
    }

    if config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "TTS timeout cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Gateway URL: {}", config.gateway.url);
    tracing::info!("Command Prefix: {}", config.gateway.command_prefix);
    match config.gateway.log_channel_id {
        Some(id) => tracing::info!("Log Channel: {}", id),
        None => tracing::info!("Log Channel: disabled"),
    }
    tracing::info!("TTS Locale: {}", config.tts.locale);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
