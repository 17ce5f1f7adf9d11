//! Synthesis Provider Port - 语音合成服务抽象
//!
//! 定义音色目录拉取与流式合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// 合成服务目录里的一个原始条目
#[derive(Debug, Clone)]
pub struct RawVoice {
    /// 服务端完整标签（显示名从中解析）
    pub label: String,
    /// 稳定短标识，作为音色 id 使用
    pub short_id: String,
    /// 音色所属 locale
    pub locale: String,
}

/// 合成流里一个分片的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// 音频数据
    Audio,
    /// 元数据/边界标记等非音频分片
    Metadata,
}

/// 合成流分片
#[derive(Debug, Clone)]
pub struct SynthesisChunk {
    pub kind: ChunkKind,
    pub data: Vec<u8>,
}

/// 惰性合成分片序列
///
/// 以有界 channel 承载，消费侧逐个拉取，生产侧受背压约束。
pub struct SynthesisStream {
    rx: mpsc::Receiver<Result<SynthesisChunk, SynthesisError>>,
}

impl SynthesisStream {
    pub fn from_channel(rx: mpsc::Receiver<Result<SynthesisChunk, SynthesisError>>) -> Self {
        Self { rx }
    }

    /// 从现成的分片序列构造（测试适配器使用）
    pub fn from_chunks(chunks: Vec<Result<SynthesisChunk, SynthesisError>>) -> Self {
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            // 容量等于分片数，try_send 不会失败
            let _ = tx.try_send(chunk);
        }
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<Result<SynthesisChunk, SynthesisError>> {
        self.rx.recv().await
    }
}

/// Synthesis Provider Port
///
/// 外部语音合成服务的抽象接口
#[async_trait]
pub trait SynthesisProviderPort: Send + Sync {
    /// 拉取指定 locale 的音色目录
    async fn list_voices(&self, locale: &str) -> Result<Vec<RawVoice>, SynthesisError>;

    /// 打开一条合成流
    ///
    /// 返回惰性分片序列；网络或服务故障以 `SynthesisError` 的形式出现在
    /// 打开阶段或流内。
    async fn open_stream(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<SynthesisStream, SynthesisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_from_chunks_preserves_order() {
        let mut stream = SynthesisStream::from_chunks(vec![
            Ok(SynthesisChunk {
                kind: ChunkKind::Audio,
                data: vec![1],
            }),
            Ok(SynthesisChunk {
                kind: ChunkKind::Metadata,
                data: vec![2],
            }),
        ]);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.kind, ChunkKind::Audio);
        assert_eq!(first.data, vec![1]);

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.kind, ChunkKind::Metadata);

        assert!(stream.next().await.is_none());
    }
}
