//! Voice Session Port - 语音会话抽象
//!
//! 语音会话由聊天平台拥有，应用层只持引用。每个服务器同一时刻至多
//! 一个会话、至多一路播放。

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::GuildId;

/// 启动播放失败
#[derive(Debug, Error)]
pub enum PlaybackStartError {
    /// 会话上已有播放在进行（启动竞态）
    #[error("session is already playing")]
    SessionBusy,

    /// 会话已断开或发送失败
    #[error("session closed: {0}")]
    SessionClosed(String),
}

/// 连接语音频道失败
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Voice Session Port
///
/// 一次 `play` 对应恰好一次完成信号：播放结束、失败或被打断时，
/// 平台适配器触发 `on_complete`；会话被拆除时信号以发送端被丢弃的
/// 形式出现。
pub trait VoiceSessionPort: Send + Sync {
    /// 启动一段音频的播放
    ///
    /// 非阻塞；音频尚在播放时返回 `SessionBusy`。
    fn play(
        &self,
        audio: Vec<u8>,
        on_complete: oneshot::Sender<()>,
    ) -> Result<(), PlaybackStartError>;

    fn is_playing(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// 主动断开会话
    fn disconnect(&self);
}

/// Voice Connector Port
///
/// 连接到某服务器的某个语音频道，返回新的会话句柄
#[async_trait]
pub trait VoiceConnectorPort: Send + Sync {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: u64,
    ) -> Result<Arc<dyn VoiceSessionPort>, ConnectError>;
}
