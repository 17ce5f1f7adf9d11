//! Domain Layer - 领域层
//!
//! 包含:
//! - Voice Context: 音色目录
//! - Utterance Text: 朗读文本规则

pub mod voice;

mod text;

pub use text::{is_speakable, normalize_utterance};

/// 聊天平台的服务器标识
pub type GuildId = u64;
