//! Yomiage - 语音频道读上げボット (chat-to-speech relay)
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Catalog: 音色目录（启动时从合成服务加载，只读）
//! - Utterance Text: 朗读文本的归一化与可读性判定
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SynthesisProvider, VoiceSession, VoiceConnector, GuildConfig）
//! - Playback: 每服务器播放队列 + 播放控制器（核心状态机）
//! - Intake: 消息过滤与入队
//! - Commands / Queries: join / leave / speaker 命令与补全查询
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: Edge TTS 合成客户端（生产）/ Fake 合成客户端（测试）
//! - Memory: GuildConfig 内存实现
//! - Gateway: 聊天平台 WebSocket 客户端与语音会话

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
