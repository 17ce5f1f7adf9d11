//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// 聊天平台网关配置
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// 合成服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 聊天平台网关配置
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// 网关 WebSocket 地址
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// 认证 token；缺失是启动期唯一的致命错误
    #[serde(default)]
    pub token: String,

    /// 启动通知发送到的频道；不设则不通知
    #[serde(default)]
    pub log_channel_id: Option<u64>,

    /// 命令前缀字符，以此开头的消息不朗读
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_gateway_url() -> String {
    "ws://127.0.0.1:8700/gateway".to_string()
}

fn default_command_prefix() -> String {
    ">".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            token: String::new(),
            log_channel_id: None,
            command_prefix: default_command_prefix(),
        }
    }
}

impl GatewayConfig {
    /// 命令前缀字符
    pub fn prefix_char(&self) -> char {
        // validate_config 保证恰好一个字符
        self.command_prefix.chars().next().unwrap_or('>')
    }
}

/// 合成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 目录过滤到的 locale
    #[serde(default = "default_locale")]
    pub locale: String,

    /// 单次合成的超时时间（秒），约束连接与整条流的读取
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_locale() -> String {
    "ja-JP".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
