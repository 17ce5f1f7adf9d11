//! Ws Voice Session - 语音会话句柄
//!
//! 实现 VoiceSessionPort。播放状态用本地原子标记跟踪：`play` 同步置忙，
//! 平台的 playback_finished 事件触发完成信号并解除忙碌。完成信号的
//! 发送端在会话被拆除时直接丢弃，等待方据此识别被取代的播放。

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use crate::application::ports::{
    ConnectError, PlaybackStartError, VoiceConnectorPort, VoiceSessionPort,
};
use crate::domain::GuildId;
use crate::infrastructure::gateway::protocol::{GatewayCommand, OutboundFrame};

/// 一条活跃语音连接的句柄
pub struct WsVoiceSession {
    guild_id: GuildId,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    connected: AtomicBool,
    playing: AtomicBool,
    completion: Mutex<Option<oneshot::Sender<()>>>,
}

impl WsVoiceSession {
    fn new(guild_id: GuildId, outbound: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self {
            guild_id,
            outbound,
            connected: AtomicBool::new(true),
            playing: AtomicBool::new(false),
            completion: Mutex::new(None),
        }
    }

    /// 平台报告播放结束：解除忙碌并触发完成信号
    pub(crate) fn finish_playback(&self) {
        self.playing.store(false, Ordering::SeqCst);
        if let Some(tx) = self.completion.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }

    /// 平台侧断开：标记关闭，丢弃未决的完成信号发送端
    pub(crate) fn mark_closed(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        self.completion.lock().unwrap().take();
    }
}

impl VoiceSessionPort for WsVoiceSession {
    fn play(
        &self,
        audio: Vec<u8>,
        on_complete: oneshot::Sender<()>,
    ) -> Result<(), PlaybackStartError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(PlaybackStartError::SessionClosed("disconnected".into()));
        }
        // 启动竞态：已有播放在途
        if self.playing.swap(true, Ordering::SeqCst) {
            return Err(PlaybackStartError::SessionBusy);
        }

        // 完成信号必须在指令发出前就位
        *self.completion.lock().unwrap() = Some(on_complete);

        let header = OutboundFrame::Command(GatewayCommand::VoicePlay {
            guild_id: self.guild_id,
        });
        if self.outbound.send(header).is_err() || self.outbound.send(OutboundFrame::Audio(audio)).is_err()
        {
            self.playing.store(false, Ordering::SeqCst);
            self.completion.lock().unwrap().take();
            return Err(PlaybackStartError::SessionClosed("gateway gone".into()));
        }

        tracing::debug!(guild_id = self.guild_id, "Playback started");
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self
                .outbound
                .send(OutboundFrame::Command(GatewayCommand::VoiceDisconnect {
                    guild_id: self.guild_id,
                }));
        }
        self.playing.store(false, Ordering::SeqCst);
        self.completion.lock().unwrap().take();
        tracing::info!(guild_id = self.guild_id, "Voice session disconnected");
    }
}

/// 会话注册表
///
/// 每服务器至多一条会话。同时作为 VoiceConnectorPort 的实现。
pub struct SessionRegistry {
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    sessions: DashMap<GuildId, Arc<WsVoiceSession>>,
}

impl SessionRegistry {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self {
            outbound,
            sessions: DashMap::new(),
        }
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<WsVoiceSession>> {
        self.sessions.get(&guild_id).map(|s| s.clone())
    }

    /// 摘除会话（平台侧断开时调用）
    pub fn remove(&self, guild_id: GuildId) -> Option<Arc<WsVoiceSession>> {
        self.sessions.remove(&guild_id).map(|(_, s)| s)
    }
}

#[async_trait]
impl VoiceConnectorPort for SessionRegistry {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: u64,
    ) -> Result<Arc<dyn VoiceSessionPort>, ConnectError> {
        self.outbound
            .send(OutboundFrame::Command(GatewayCommand::VoiceConnect {
                guild_id,
                channel_id,
            }))
            .map_err(|_| ConnectError::Gateway("gateway connection lost".to_string()))?;

        let session = Arc::new(WsVoiceSession::new(guild_id, self.outbound.clone()));
        // 残留的旧会话直接作废
        if let Some(stale) = self.sessions.insert(guild_id, session.clone()) {
            stale.mark_closed();
        }

        tracing::info!(guild_id, channel_id, "Voice connect requested");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (Arc<WsVoiceSession>, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(WsVoiceSession::new(1, tx)), rx)
    }

    #[tokio::test]
    async fn test_play_emits_header_then_audio() {
        let (session, mut rx) = session();
        let (done_tx, _done_rx) = oneshot::channel();

        session.play(vec![1, 2, 3], done_tx).unwrap();
        assert!(session.is_playing());

        match rx.recv().await.unwrap() {
            OutboundFrame::Command(GatewayCommand::VoicePlay { guild_id }) => {
                assert_eq!(guild_id, 1)
            }
            other => panic!("unexpected frame: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            OutboundFrame::Audio(audio) => assert_eq!(audio, vec![1, 2, 3]),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_play_is_busy_until_finished() {
        let (session, _rx) = session();
        let (tx1, mut rx1) = oneshot::channel();
        session.play(vec![1], tx1).unwrap();

        let (tx2, _rx2) = oneshot::channel();
        assert!(matches!(
            session.play(vec![2], tx2),
            Err(PlaybackStartError::SessionBusy)
        ));

        session.finish_playback();
        assert!(rx1.try_recv().is_ok());
        assert!(!session.is_playing());

        let (tx3, _rx3) = oneshot::channel();
        assert!(session.play(vec![3], tx3).is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_drops_pending_completion() {
        let (session, _rx) = session();
        let (done_tx, mut done_rx) = oneshot::channel();
        session.play(vec![1], done_tx).unwrap();

        session.disconnect();
        assert!(!session.is_connected());
        // 发送端被丢弃，等待方收到 Err 而不是完成信号
        assert!(done_rx.try_recv().is_err());

        let (tx, _rx2) = oneshot::channel();
        assert!(matches!(
            session.play(vec![2], tx),
            Err(PlaybackStartError::SessionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_registry_replaces_stale_session() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let registry = SessionRegistry::new(tx);

        let first = registry.connect(1, 10).await.unwrap();
        let _second = registry.connect(1, 11).await.unwrap();

        assert!(!first.is_connected());
        assert!(registry.get(1).unwrap().is_connected());
    }
}
