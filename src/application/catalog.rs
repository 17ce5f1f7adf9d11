//! 音色目录引导
//!
//! 启动时从合成服务整体重建目录。服务不可达时 fail-open：返回空目录，
//! 选择处退回保底音色，进程照常启动。

use crate::application::ports::SynthesisProviderPort;
use crate::domain::voice::{parse_display_name, Voice, VoiceCatalog};

/// 加载指定 locale 的音色目录
///
/// 不与既有状态合并，每次启动整体重建。
pub async fn load_catalog(provider: &dyn SynthesisProviderPort, locale: &str) -> VoiceCatalog {
    match provider.list_voices(locale).await {
        Ok(raw) => {
            let voices: Vec<Voice> = raw
                .into_iter()
                .map(|r| Voice {
                    display_name: parse_display_name(&r.label),
                    id: r.short_id,
                })
                .collect();
            tracing::info!(locale = %locale, count = voices.len(), "Voice catalog loaded");
            VoiceCatalog::new(voices)
        }
        Err(e) => {
            tracing::warn!(locale = %locale, error = %e, "Failed to load voice catalog, starting with empty catalog");
            VoiceCatalog::empty()
        }
    }
}
