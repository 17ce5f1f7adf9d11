//! Message Intake - 消息过滤与入队
//!
//! 把入站聊天消息变成入队或立即排空的决策。机器人账号、命令前缀、
//! 私信一律忽略；没有活跃语音会话的服务器也忽略（断线期间不积压）。

use std::sync::Arc;

use crate::application::playback::PlaybackController;
use crate::domain::GuildId;

/// 一条入站聊天消息
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// 所属服务器；私信为 None
    pub guild_id: Option<GuildId>,
    pub author_is_bot: bool,
    pub content: String,
}

/// 消息入口
pub struct MessageIntake {
    controller: Arc<PlaybackController>,
    command_prefix: char,
}

impl MessageIntake {
    pub fn new(controller: Arc<PlaybackController>, command_prefix: char) -> Self {
        Self {
            controller,
            command_prefix,
        }
    }

    /// 处理一条入站消息
    ///
    /// 正在播放或队列非空时只入队，完成信号会接着排空；
    /// 空闲时入队并立即触发一轮排空（排空循环内处理启动竞态）。
    pub fn handle(&self, message: ChatMessage) {
        if message.author_is_bot {
            return;
        }
        if message.content.starts_with(self.command_prefix) {
            return;
        }
        let Some(guild_id) = message.guild_id else {
            return; // 私信不朗读
        };
        let Some(session) = self.controller.session(guild_id) else {
            return; // 没有活跃会话就不积压
        };
        if !session.is_connected() {
            return;
        }

        let idle = !session.is_playing() && !self.controller.has_pending(guild_id);
        self.controller.enqueue(guild_id, message.content);
        if idle {
            self.controller.spawn_drain(guild_id);
        } else {
            tracing::debug!(guild_id, "Utterance queued behind current playback");
        }
    }
}
