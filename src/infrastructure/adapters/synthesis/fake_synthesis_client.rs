//! Fake Synthesis Client - 用于测试的合成客户端
//!
//! 不访问网络。默认把文本字节作为音频分片回显（测试可据此还原播放
//! 顺序），并在音频前后夹入元数据分片。可按文本脚本化故障、空输出
//! 与人工延迟。

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{
    ChunkKind, RawVoice, SynthesisChunk, SynthesisError, SynthesisProviderPort, SynthesisStream,
};

/// Fake Synthesis Client
pub struct FakeSynthesisClient {
    voices: Vec<(String, String)>,
    catalog_fails: bool,
    /// 以此开头的文本打开流即失败
    failure_prefix: Option<String>,
    /// 以此开头的文本返回只有元数据、没有音频的流
    empty_prefix: Option<String>,
    /// 以此开头的文本在打开流前人工延迟
    latency_prefix: Option<String>,
    latency: Duration,
}

impl FakeSynthesisClient {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            catalog_fails: false,
            failure_prefix: None,
            empty_prefix: None,
            latency_prefix: None,
            latency: Duration::from_millis(150),
        }
    }

    /// 目录返回给定的 (label, short_id) 条目
    pub fn with_voices(mut self, voices: Vec<(String, String)>) -> Self {
        self.voices = voices;
        self
    }

    /// 目录拉取失败
    pub fn with_catalog_failure(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    /// 以 prefix 开头的文本合成失败
    pub fn with_failure_for(mut self, prefix: &str) -> Self {
        self.failure_prefix = Some(prefix.to_string());
        self
    }

    /// 以 prefix 开头的文本产出空音频
    pub fn with_empty_audio_for(mut self, prefix: &str) -> Self {
        self.empty_prefix = Some(prefix.to_string());
        self
    }

    /// 以 prefix 开头的文本延迟后才返回
    pub fn with_latency_for(mut self, prefix: &str) -> Self {
        self.latency_prefix = Some(prefix.to_string());
        self
    }

    fn matches(prefix: &Option<String>, text: &str) -> bool {
        prefix.as_deref().is_some_and(|p| text.starts_with(p))
    }
}

impl Default for FakeSynthesisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisProviderPort for FakeSynthesisClient {
    async fn list_voices(&self, locale: &str) -> Result<Vec<RawVoice>, SynthesisError> {
        if self.catalog_fails {
            return Err(SynthesisError::NetworkError("catalog unavailable".into()));
        }
        Ok(self
            .voices
            .iter()
            .map(|(label, short_id)| RawVoice {
                label: label.clone(),
                short_id: short_id.clone(),
                locale: locale.to_string(),
            })
            .collect())
    }

    async fn open_stream(
        &self,
        text: &str,
        _voice_id: &str,
    ) -> Result<SynthesisStream, SynthesisError> {
        if Self::matches(&self.latency_prefix, text) {
            tokio::time::sleep(self.latency).await;
        }
        if Self::matches(&self.failure_prefix, text) {
            return Err(SynthesisError::ProviderError("scripted failure".into()));
        }

        let mut chunks = vec![Ok(SynthesisChunk {
            kind: ChunkKind::Metadata,
            data: b"turn.start".to_vec(),
        })];
        if !Self::matches(&self.empty_prefix, text) {
            chunks.push(Ok(SynthesisChunk {
                kind: ChunkKind::Audio,
                data: text.as_bytes().to_vec(),
            }));
        }
        chunks.push(Ok(SynthesisChunk {
            kind: ChunkKind::Metadata,
            data: b"turn.end".to_vec(),
        }));

        Ok(SynthesisStream::from_chunks(chunks))
    }
}
