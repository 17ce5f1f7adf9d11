//! Chat Gateway - 连接与分发循环
//!
//! 维持到聊天平台网关的 WebSocket 连接：入站事件解码后交给路由器，
//! 由其分发给 intake / 命令处理器 / 会话注册表；出站帧从统一的
//! channel 转发到连接上。连接断开后固定间隔重连，直到进程收到退出
//! 信号。

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::application::commands::{JoinVoice, LeaveVoice, SelectSpeaker};
use crate::application::ports::GuildConfigPort;
use crate::application::{
    ChatMessage, JoinHandler, LeaveHandler, MessageIntake, PlaybackController,
    SelectSpeakerHandler, SpeakerAutocompleteHandler,
};
use crate::config::GatewayConfig;
use crate::domain::voice::VoiceCatalog;
use crate::infrastructure::gateway::protocol::{
    AutocompleteChoice, GatewayCommand, GatewayEvent, InteractionCommand, OutboundFrame,
};
use crate::infrastructure::gateway::SessionRegistry;

/// 重连间隔
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// 网关错误
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// 分发循环依赖的应用层组件
pub struct GatewayDeps {
    pub controller: Arc<PlaybackController>,
    pub intake: Arc<MessageIntake>,
    pub join: JoinHandler,
    pub leave: LeaveHandler,
    pub speaker: SelectSpeakerHandler,
    pub autocomplete: SpeakerAutocompleteHandler,
    pub guild_config: Arc<dyn GuildConfigPort>,
    pub catalog: Arc<VoiceCatalog>,
}

/// 入站事件路由器
///
/// 与连接循环分开持有，读循环只借用它分发事件，不触碰出站接收端。
struct EventRouter {
    config: GatewayConfig,
    registry: Arc<SessionRegistry>,
    outbound_tx: mpsc::UnboundedSender<OutboundFrame>,
    deps: GatewayDeps,
}

impl EventRouter {
    /// 分发一个入站事件
    async fn dispatch(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready { guilds } => self.on_ready(guilds),
            GatewayEvent::MessageCreate {
                guild_id,
                author_is_bot,
                content,
            } => {
                self.deps.intake.handle(ChatMessage {
                    guild_id,
                    author_is_bot,
                    content,
                });
            }
            GatewayEvent::InteractionCreate {
                id,
                guild_id,
                command,
                channel_id,
                channel_name,
                value,
            } => {
                self.on_interaction(id, guild_id, command, channel_id, channel_name, value)
                    .await;
            }
            GatewayEvent::PlaybackFinished { guild_id } => {
                if let Some(session) = self.registry.get(guild_id) {
                    session.finish_playback();
                }
                // 完成信号之后队列里可能还有东西等着
                self.deps.controller.spawn_drain(guild_id);
            }
            GatewayEvent::VoiceDisconnected { guild_id } => {
                if let Some(session) = self.registry.remove(guild_id) {
                    session.mark_closed();
                }
                self.deps.controller.detach_session(guild_id);
            }
        }
    }

    /// 启动枚举：为每个服务器建立默认配置，并视情况发启动通知
    fn on_ready(&self, guilds: Vec<u64>) {
        for guild_id in &guilds {
            self.deps
                .guild_config
                .ensure(*guild_id, self.deps.catalog.default_voice_id());
        }
        tracing::info!(guild_count = guilds.len(), "Gateway ready");

        if let Some(channel_id) = self.config.log_channel_id {
            self.send_command(GatewayCommand::ChannelMessage {
                channel_id,
                content: format!(
                    "TTS Bot 起動完了！ {} 個の声をロードしました。",
                    self.deps.catalog.len()
                ),
            });
        }
    }

    async fn on_interaction(
        &self,
        interaction_id: String,
        guild_id: u64,
        command: InteractionCommand,
        channel_id: Option<u64>,
        channel_name: Option<String>,
        value: Option<String>,
    ) {
        match command {
            InteractionCommand::Join => {
                let result = self
                    .deps
                    .join
                    .handle(JoinVoice {
                        guild_id,
                        channel_id,
                        channel_name,
                    })
                    .await;
                match result {
                    Ok(response) => self.respond(
                        interaction_id,
                        format!("✅ {} に接続しました。", response.channel_name),
                        false,
                    ),
                    Err(e) => self.respond(interaction_id, e.user_message().to_string(), true),
                }
            }
            InteractionCommand::Leave => match self.deps.leave.handle(LeaveVoice { guild_id }) {
                Ok(()) => self.respond(interaction_id, "👋 退室しました。".to_string(), false),
                Err(e) => self.respond(interaction_id, e.user_message().to_string(), true),
            },
            InteractionCommand::Speaker => {
                let result = self.deps.speaker.handle(SelectSpeaker {
                    guild_id,
                    voice_id: value.unwrap_or_default(),
                });
                match result {
                    Ok(response) => self.respond(
                        interaction_id,
                        format!("🗣 話者を **{}** に設定しました。", response.display_name),
                        false,
                    ),
                    Err(e) => self.respond(interaction_id, e.user_message().to_string(), true),
                }
            }
            InteractionCommand::SpeakerAutocomplete => {
                let choices = self
                    .deps
                    .autocomplete
                    .handle(value.as_deref().unwrap_or(""))
                    .into_iter()
                    .map(|c| AutocompleteChoice {
                        name: c.name,
                        value: c.value,
                    })
                    .collect();
                self.send_command(GatewayCommand::AutocompleteResponse {
                    interaction_id,
                    choices,
                });
            }
        }
    }

    fn respond(&self, interaction_id: String, content: String, ephemeral: bool) {
        self.send_command(GatewayCommand::InteractionResponse {
            interaction_id,
            content,
            ephemeral,
        });
    }

    fn send_command(&self, command: GatewayCommand) {
        if self
            .outbound_tx
            .send(OutboundFrame::Command(command))
            .is_err()
        {
            tracing::warn!("Outbound channel closed, dropping gateway command");
        }
    }
}

/// 聊天平台网关客户端
pub struct ChatGateway {
    router: EventRouter,
    outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
}

impl ChatGateway {
    pub fn new(
        config: GatewayConfig,
        registry: Arc<SessionRegistry>,
        outbound_tx: mpsc::UnboundedSender<OutboundFrame>,
        outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
        deps: GatewayDeps,
    ) -> Self {
        Self {
            router: EventRouter {
                config,
                registry,
                outbound_tx,
                deps,
            },
            outbound_rx,
        }
    }

    /// 维持连接直到进程退出：断开后固定间隔重连
    pub async fn run(mut self) {
        loop {
            match self.run_once().await {
                Ok(()) => tracing::info!("Gateway connection closed, reconnecting"),
                Err(e) => tracing::warn!(error = %e, "Gateway connection failed, reconnecting"),
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    /// 单次连接的生命周期
    async fn run_once(&mut self) -> Result<(), GatewayError> {
        let (ws, _response) = connect_async(self.router.config.url.as_str())
            .await
            .map_err(|e| GatewayError::Connect(e.to_string()))?;
        tracing::info!(url = %self.router.config.url, "Gateway connected");

        let (mut sink, mut stream) = ws.split();

        let identify = serde_json::to_string(&GatewayCommand::Identify {
            token: self.router.config.token.clone(),
        })
        .map_err(|e| GatewayError::Connect(e.to_string()))?;
        sink.send(Message::Text(identify))
            .await
            .map_err(|e| GatewayError::Connect(e.to_string()))?;

        loop {
            tokio::select! {
                frame = self.outbound_rx.recv() => {
                    // 发送端在本进程内常驻，channel 不会关闭
                    let Some(frame) = frame else { return Ok(()) };
                    let message = match frame {
                        OutboundFrame::Command(cmd) => {
                            match serde_json::to_string(&cmd) {
                                Ok(json) => Message::Text(json),
                                Err(e) => {
                                    tracing::error!(error = %e, "Failed to encode gateway command");
                                    continue;
                                }
                            }
                        }
                        OutboundFrame::Audio(audio) => Message::Binary(audio),
                    };
                    sink.send(message)
                        .await
                        .map_err(|e| GatewayError::ConnectionLost(e.to_string()))?;
                }
                incoming = stream.next() => {
                    match incoming {
                        None => return Ok(()),
                        Some(Err(e)) => return Err(GatewayError::ConnectionLost(e.to_string())),
                        Some(Ok(Message::Text(json))) => {
                            match serde_json::from_str::<GatewayEvent>(&json) {
                                Ok(event) => self.router.dispatch(event).await,
                                Err(e) => tracing::warn!(error = %e, "Unrecognized gateway event"),
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            sink.send(Message::Pong(payload))
                                .await
                                .map_err(|e| GatewayError::ConnectionLost(e.to_string()))?;
                        }
                        Some(Ok(Message::Close(_))) => return Ok(()),
                        Some(Ok(_)) => {} // 其余帧类型与我们无关
                    }
                }
            }
        }
    }
}
