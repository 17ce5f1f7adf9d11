//! Speech Synthesizer - 合成适配器
//!
//! 把一条原始文本变成可播放的音频字节，或者一个跳过信号。
//! "没什么可说" 和 "合成失败" 在这里被折叠成同一个 `Skip`：
//! 控制器拿到 Skip 就当作瞬时完成，继续推进队列。

use std::sync::Arc;

use crate::application::ports::{ChunkKind, SynthesisProviderPort};
use crate::domain::{is_speakable, normalize_utterance};

/// 一次合成的结果
#[derive(Debug)]
pub enum SynthesisOutcome {
    /// 可播放的音频字节
    Audio(Vec<u8>),
    /// 无可播放内容，按已完成推进队列
    Skip,
}

/// 合成适配器
pub struct SpeechSynthesizer {
    provider: Arc<dyn SynthesisProviderPort>,
}

impl SpeechSynthesizer {
    pub fn new(provider: Arc<dyn SynthesisProviderPort>) -> Self {
        Self { provider }
    }

    /// 合成一条文本
    ///
    /// 归一化 → 可读性判定 → 打开合成流并累积音频分片。
    /// 任何服务故障、空输出都降级为 `Skip` 并记日志，不向上传播。
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> SynthesisOutcome {
        let clean = normalize_utterance(text);
        if !is_speakable(&clean) {
            tracing::debug!(text_len = text.len(), "Nothing speakable, skipping");
            return SynthesisOutcome::Skip;
        }

        let mut stream = match self.provider.open_stream(&clean, voice_id).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(voice_id = %voice_id, error = %e, "Failed to open synthesis stream, skipping");
                return SynthesisOutcome::Skip;
            }
        };

        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(c) if c.kind == ChunkKind::Audio => audio.extend_from_slice(&c.data),
                Ok(_) => {} // 元数据/边界分片不进音频
                Err(e) => {
                    tracing::warn!(voice_id = %voice_id, error = %e, "Synthesis stream failed, skipping");
                    return SynthesisOutcome::Skip;
                }
            }
        }

        if audio.is_empty() {
            tracing::debug!(voice_id = %voice_id, "Synthesis produced no audio, skipping");
            return SynthesisOutcome::Skip;
        }

        tracing::debug!(
            voice_id = %voice_id,
            audio_size = audio.len(),
            "Synthesis completed"
        );
        SynthesisOutcome::Audio(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeSynthesisClient;

    fn synthesizer(client: FakeSynthesisClient) -> SpeechSynthesizer {
        SpeechSynthesizer::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_punctuation_only_is_skipped() {
        let synth = synthesizer(FakeSynthesisClient::new());
        assert!(matches!(
            synth.synthesize("!!!", "v").await,
            SynthesisOutcome::Skip
        ));
        assert!(matches!(
            synth.synthesize("", "v").await,
            SynthesisOutcome::Skip
        ));
    }

    #[tokio::test]
    async fn test_audio_chunks_accumulated_metadata_ignored() {
        // FakeSynthesisClient 把文本字节作为音频回显，并夹入元数据分片
        let synth = synthesizer(FakeSynthesisClient::new());
        match synth.synthesize("ok text", "v").await {
            SynthesisOutcome::Audio(audio) => assert_eq!(audio, b"ok text".to_vec()),
            SynthesisOutcome::Skip => panic!("expected audio"),
        }
    }

    #[tokio::test]
    async fn test_provider_error_downgrades_to_skip() {
        let synth = synthesizer(FakeSynthesisClient::new().with_failure_for("boom"));
        assert!(matches!(
            synth.synthesize("boom", "v").await,
            SynthesisOutcome::Skip
        ));
    }

    #[tokio::test]
    async fn test_empty_stream_downgrades_to_skip() {
        let synth = synthesizer(FakeSynthesisClient::new().with_empty_audio_for("quiet"));
        assert!(matches!(
            synth.synthesize("quiet", "v").await,
            SynthesisOutcome::Skip
        ));
    }

    #[tokio::test]
    async fn test_japanese_text_is_synthesized() {
        let synth = synthesizer(FakeSynthesisClient::new());
        assert!(matches!(
            synth.synthesize("日本語", "v").await,
            SynthesisOutcome::Audio(_)
        ));
    }
}
