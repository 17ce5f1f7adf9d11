//! Voice Catalog - 音色目录
//!
//! 启动时从合成服务整体重建，进程内只读。目录为空时所有需要选择的
//! 地方退回到固定的 fallback 音色。

/// 目录为空时使用的保底音色
pub const FALLBACK_VOICE_ID: &str = "ja-JP-NanamiNeural";

/// speaker 补全候选上限（聊天平台的硬限制）
pub const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

/// 一个可用音色
///
/// 不变量:
/// - id 是合成服务的稳定标识（ShortName）
/// - display_name 从服务原始标签解析，加载后不再变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub display_name: String,
}

/// 从合成服务的原始标签解析人类可读的显示名
///
/// 标签形如 `Microsoft Server Speech Text to Speech Voice (ja-JP, NanamiNeural)`，
/// 取第一个 `", "` 与其后 `")"` 之间的子串。不符合该模式时原样返回。
pub fn parse_display_name(raw_label: &str) -> String {
    raw_label
        .split_once(", ")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| raw_label.to_string())
}

/// 音色目录
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// 空目录（合成服务不可达时 fail-open）
    pub fn empty() -> Self {
        Self { voices: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// 默认音色：目录第一项，目录为空时为保底音色
    pub fn default_voice_id(&self) -> &str {
        self.voices
            .first()
            .map(|v| v.id.as_str())
            .unwrap_or(FALLBACK_VOICE_ID)
    }

    pub fn contains(&self, voice_id: &str) -> bool {
        self.voices.iter().any(|v| v.id == voice_id)
    }

    pub fn display_name(&self, voice_id: &str) -> Option<&str> {
        self.voices
            .iter()
            .find(|v| v.id == voice_id)
            .map(|v| v.display_name.as_str())
    }

    /// 按显示名做大小写不敏感的子串匹配，最多返回补全上限个候选
    pub fn search(&self, fragment: &str) -> Vec<&Voice> {
        let needle = fragment.to_lowercase();
        self.voices
            .iter()
            .filter(|v| v.display_name.to_lowercase().contains(&needle))
            .take(MAX_AUTOCOMPLETE_CHOICES)
            .collect()
    }
}
