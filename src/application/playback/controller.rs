//! Playback Controller - 播放控制器
//!
//! 持有 "每服务器同一时刻至多一路合成/播放" 这一不变量。消费队列、
//! 调用合成、把音频喂进语音会话，并在完成信号之后推进下一条。
//!
//! 排空以每服务器的异步互斥锁串行化：同一服务器任意时刻只有一个
//! drain 循环在跑，循环内逐条取队首、合成、播放、等完成。Skip 直接
//! continue，显式循环代替递归。不同服务器之间完全独立，互不加锁。
//!
//! 断开通过 epoch 计数器隔代：detach 时 epoch 自增并清队列，仍在途的
//! 合成或完成信号回来后发现 epoch 变了就什么都不做。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::application::ports::{GuildConfigPort, PlaybackStartError, VoiceSessionPort};
use crate::application::playback::{SpeechSynthesizer, SynthesisOutcome, UtteranceQueue};
use crate::domain::voice::VoiceCatalog;
use crate::domain::GuildId;

/// 单个服务器的播放状态
struct GuildPlayback {
    queue: UtteranceQueue,
    session: Mutex<Option<Arc<dyn VoiceSessionPort>>>,
    /// 断开一次自增一次，旧世代的在途工作作废
    epoch: AtomicU64,
    /// 串行化本服务器的 drain 循环
    drain_gate: tokio::sync::Mutex<()>,
}

impl GuildPlayback {
    fn new() -> Self {
        Self {
            queue: UtteranceQueue::new(),
            session: Mutex::new(None),
            epoch: AtomicU64::new(0),
            drain_gate: tokio::sync::Mutex::new(()),
        }
    }

    fn current_session(&self) -> Option<Arc<dyn VoiceSessionPort>> {
        self.session.lock().unwrap().clone()
    }
}

/// 播放控制器
pub struct PlaybackController {
    guilds: DashMap<GuildId, Arc<GuildPlayback>>,
    synthesizer: SpeechSynthesizer,
    catalog: Arc<VoiceCatalog>,
    guild_config: Arc<dyn GuildConfigPort>,
}

impl PlaybackController {
    pub fn new(
        synthesizer: SpeechSynthesizer,
        catalog: Arc<VoiceCatalog>,
        guild_config: Arc<dyn GuildConfigPort>,
    ) -> Self {
        Self {
            guilds: DashMap::new(),
            synthesizer,
            catalog,
            guild_config,
        }
    }

    /// 首次观测到某服务器时惰性建立其播放状态
    fn guild(&self, guild_id: GuildId) -> Arc<GuildPlayback> {
        self.guilds
            .entry(guild_id)
            .or_insert_with(|| Arc::new(GuildPlayback::new()))
            .clone()
    }

    /// 绑定新建立的语音会话
    pub fn attach_session(&self, guild_id: GuildId, session: Arc<dyn VoiceSessionPort>) {
        let state = self.guild(guild_id);
        *state.session.lock().unwrap() = Some(session);
        tracing::info!(guild_id, "Voice session attached");
    }

    /// 解除会话绑定：epoch 自增、队列整体丢弃、会话引用置空
    ///
    /// 在途合成不强行中止，其完成信号回来后因 epoch 不符而成为 no-op。
    pub fn detach_session(&self, guild_id: GuildId) {
        let state = self.guild(guild_id);
        state.epoch.fetch_add(1, Ordering::SeqCst);
        let dropped = state.queue.len();
        state.queue.clear();
        *state.session.lock().unwrap() = None;
        tracing::info!(guild_id, dropped_utterances = dropped, "Voice session detached");
    }

    pub fn session(&self, guild_id: GuildId) -> Option<Arc<dyn VoiceSessionPort>> {
        self.guilds
            .get(&guild_id)
            .and_then(|state| state.current_session())
    }

    pub fn enqueue(&self, guild_id: GuildId, text: String) {
        self.guild(guild_id).queue.enqueue(text);
    }

    pub fn has_pending(&self, guild_id: GuildId) -> bool {
        self.guilds
            .get(&guild_id)
            .map(|state| state.queue.has_pending())
            .unwrap_or(false)
    }

    /// 当前生效的音色：服务器选择优先，否则目录默认
    fn voice_for(&self, guild_id: GuildId) -> String {
        self.guild_config
            .selected_voice(guild_id)
            .unwrap_or_else(|| self.catalog.default_voice_id().to_string())
    }

    /// 在后台任务里排空某服务器的队列
    pub fn spawn_drain(self: &Arc<Self>, guild_id: GuildId) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.drain(guild_id).await;
        });
    }

    /// 排空循环：队首 → 合成 → 播放 → 等完成 → 下一条
    pub async fn drain(self: Arc<Self>, guild_id: GuildId) {
        let state = self.guild(guild_id);
        let _gate = state.drain_gate.lock().await;
        let epoch = state.epoch.load(Ordering::SeqCst);

        loop {
            if state.epoch.load(Ordering::SeqCst) != epoch {
                return; // 会话在我们工作期间被拆除
            }
            let Some(session) = state.current_session() else {
                return;
            };
            if !session.is_connected() || session.is_playing() {
                return; // 正在播放，完成信号会把控制权交还给下一轮 drain
            }
            let Some(text) = state.queue.dequeue() else {
                return;
            };

            let voice_id = self.voice_for(guild_id);
            let audio = match self.synthesizer.synthesize(&text, &voice_id).await {
                SynthesisOutcome::Audio(audio) => audio,
                SynthesisOutcome::Skip => continue,
            };

            // 合成挂起期间可能发生了断开
            if state.epoch.load(Ordering::SeqCst) != epoch {
                return;
            }

            let (done_tx, done_rx) = oneshot::channel();
            match session.play(audio, done_tx) {
                Ok(()) => {
                    // 一次播放恰好一次完成信号；会话先被拆除时发送端
                    // 被丢弃，这里以 Err 返回，循环顶部的 epoch 检查兜底
                    let _ = done_rx.await;
                }
                Err(PlaybackStartError::SessionBusy) => {
                    // 启动竞态：保序放回队首，不推进
                    state.queue.requeue_front(text);
                    tracing::debug!(guild_id, "Playback start raced, requeued at front");
                    return;
                }
                Err(e) => {
                    // 其他启动失败按已完成推进，避免队列永久卡死
                    tracing::warn!(guild_id, error = %e, "Failed to start playback, advancing queue");
                    continue;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::Voice;
    use crate::infrastructure::adapters::FakeSynthesisClient;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    /// 录制 play 调用的假语音会话
    struct FakeVoiceSession {
        connected: AtomicBool,
        playing: AtomicBool,
        /// true 时 play 立即发完成信号（瞬时播放）
        auto_complete: bool,
        /// 下一次 play 返回 SessionBusy
        busy_next: AtomicBool,
        played: Mutex<Vec<Vec<u8>>>,
        completion: Mutex<Option<oneshot::Sender<()>>>,
    }

    impl FakeVoiceSession {
        fn auto() -> Arc<Self> {
            Arc::new(Self {
                connected: AtomicBool::new(true),
                playing: AtomicBool::new(false),
                auto_complete: true,
                busy_next: AtomicBool::new(false),
                played: Mutex::new(Vec::new()),
                completion: Mutex::new(None),
            })
        }

        fn manual() -> Arc<Self> {
            Arc::new(Self {
                auto_complete: false,
                ..Self::blank()
            })
        }

        fn blank() -> Self {
            Self {
                connected: AtomicBool::new(true),
                playing: AtomicBool::new(false),
                auto_complete: true,
                busy_next: AtomicBool::new(false),
                played: Mutex::new(Vec::new()),
                completion: Mutex::new(None),
            }
        }

        fn played_texts(&self) -> Vec<String> {
            self.played
                .lock()
                .unwrap()
                .iter()
                .map(|a| String::from_utf8_lossy(a).into_owned())
                .collect()
        }

        /// 模拟平台侧播放结束
        fn finish(&self) {
            self.playing.store(false, Ordering::SeqCst);
            if let Some(tx) = self.completion.lock().unwrap().take() {
                let _ = tx.send(());
            }
        }
    }

    impl VoiceSessionPort for FakeVoiceSession {
        fn play(
            &self,
            audio: Vec<u8>,
            on_complete: oneshot::Sender<()>,
        ) -> Result<(), PlaybackStartError> {
            if !self.connected.load(Ordering::SeqCst) {
                return Err(PlaybackStartError::SessionClosed("disconnected".into()));
            }
            if self.busy_next.swap(false, Ordering::SeqCst) {
                return Err(PlaybackStartError::SessionBusy);
            }
            self.played.lock().unwrap().push(audio);
            if self.auto_complete {
                let _ = on_complete.send(());
            } else {
                self.playing.store(true, Ordering::SeqCst);
                *self.completion.lock().unwrap() = Some(on_complete);
            }
            Ok(())
        }

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn disconnect(&self) {
            self.connected.store(false, Ordering::SeqCst);
            self.playing.store(false, Ordering::SeqCst);
            self.completion.lock().unwrap().take();
        }
    }

    /// 固定返回默认音色的配置存根
    struct StaticConfig;

    impl GuildConfigPort for StaticConfig {
        fn ensure(&self, _guild_id: GuildId, _default_voice: &str) {}
        fn selected_voice(&self, _guild_id: GuildId) -> Option<String> {
            None
        }
        fn set_voice(&self, _guild_id: GuildId, _voice_id: &str) {}
    }

    fn controller(client: FakeSynthesisClient) -> Arc<PlaybackController> {
        let catalog = Arc::new(VoiceCatalog::new(vec![Voice {
            id: "v".to_string(),
            display_name: "V".to_string(),
        }]));
        Arc::new(PlaybackController::new(
            SpeechSynthesizer::new(Arc::new(client)),
            catalog,
            Arc::new(StaticConfig),
        ))
    }

    #[tokio::test]
    async fn test_play_order_matches_enqueue_order_across_skips() {
        let controller = controller(FakeSynthesisClient::new());
        let session = FakeVoiceSession::auto();
        controller.attach_session(1, session.clone());

        for text in ["ok text", "", "!!!", "日本語"] {
            controller.enqueue(1, text.to_string());
        }
        controller.clone().drain(1).await;

        // 不可朗读的两条被跳过，剩余顺序不变
        assert_eq!(session.played_texts(), vec!["ok text", "日本語"]);
        assert!(!controller.has_pending(1));
    }

    #[tokio::test]
    async fn test_provider_failure_advances_queue() {
        let controller = controller(FakeSynthesisClient::new().with_failure_for("boom"));
        let session = FakeVoiceSession::auto();
        controller.attach_session(1, session.clone());

        for text in ["first", "boom", "last"] {
            controller.enqueue(1, text.to_string());
        }
        controller.clone().drain(1).await;

        assert_eq!(session.played_texts(), vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_session_busy_requeues_at_front() {
        let controller = controller(FakeSynthesisClient::new());
        let session = FakeVoiceSession::auto();
        session.busy_next.store(true, Ordering::SeqCst);
        controller.attach_session(1, session.clone());

        controller.enqueue(1, "a".to_string());
        controller.enqueue(1, "b".to_string());
        controller.clone().drain(1).await;

        // 第一条撞上竞态被放回队首，没有任何 play 发生
        assert!(session.played_texts().is_empty());
        assert!(controller.has_pending(1));

        // 下一轮 drain 仍然从 "a" 开始
        controller.clone().drain(1).await;
        assert_eq!(session.played_texts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_disconnect_clears_queue_and_voids_completion() {
        let controller = controller(FakeSynthesisClient::new());
        let session = FakeVoiceSession::manual();
        controller.attach_session(1, session.clone());

        controller.enqueue(1, "one".to_string());
        controller.enqueue(1, "two".to_string());
        let drain = tokio::spawn(controller.clone().drain(1));

        // 等第一条进入播放
        while session.played.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        controller.detach_session(1);
        assert!(!controller.has_pending(1));

        // 被取代的播放完成信号到达：必须是 no-op
        session.finish();
        drain.await.unwrap();
        assert_eq!(session.played_texts(), vec!["one"]);
        assert!(!controller.has_pending(1));

        // 重新接入后一切如初，配置仍然生效
        let fresh = FakeVoiceSession::auto();
        controller.attach_session(1, fresh.clone());
        controller.enqueue(1, "three".to_string());
        controller.clone().drain(1).await;
        assert_eq!(fresh.played_texts(), vec!["three"]);
    }

    #[tokio::test]
    async fn test_guilds_do_not_block_each_other() {
        // "slow " 前缀的文本在假合成器里有人工延迟
        let controller = controller(FakeSynthesisClient::new().with_latency_for("slow"));
        let slow_session = FakeVoiceSession::auto();
        let fast_session = FakeVoiceSession::auto();
        controller.attach_session(1, slow_session.clone());
        controller.attach_session(2, fast_session.clone());

        controller.enqueue(1, "slow utterance".to_string());
        controller.enqueue(2, "quick".to_string());

        let slow = tokio::spawn(controller.clone().drain(1));
        tokio::time::timeout(Duration::from_millis(80), controller.clone().drain(2))
            .await
            .expect("guild 2 must not wait on guild 1's synthesis");

        assert_eq!(fast_session.played_texts(), vec!["quick"]);
        assert!(slow_session.played_texts().is_empty());

        slow.await.unwrap();
        assert_eq!(slow_session.played_texts(), vec!["slow utterance"]);
    }
}
