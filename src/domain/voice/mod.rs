//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 音色目录的构建与查询
//! - 显示名解析
//! - speaker 补全候选

mod catalog;

pub use catalog::{parse_display_name, Voice, VoiceCatalog, FALLBACK_VOICE_ID, MAX_AUTOCOMPLETE_CHOICES};
