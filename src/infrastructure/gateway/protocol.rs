//! Gateway Protocol - 网关线上协议
//!
//! 与聊天平台网关之间的 JSON-over-WebSocket 协议。入站事件以 `t` 字段
//! 区分，出站指令以 `op` 字段区分；`voice_play` 指令之后紧跟一个承载
//! 音频数据的二进制帧。

use serde::{Deserialize, Serialize};

use crate::domain::GuildId;

/// 入站事件（平台 → bot）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// 认证完成，附带 bot 当前所在的服务器列表
    Ready { guilds: Vec<GuildId> },

    /// 新聊天消息
    MessageCreate {
        /// 私信为 None
        #[serde(default)]
        guild_id: Option<GuildId>,
        author_is_bot: bool,
        content: String,
    },

    /// 斜杠命令调用
    InteractionCreate {
        id: String,
        guild_id: GuildId,
        command: InteractionCommand,
        /// 调用者所在语音频道（join 用）；不在频道时为 None
        #[serde(default)]
        channel_id: Option<u64>,
        #[serde(default)]
        channel_name: Option<String>,
        /// 命令参数（speaker 的音色 id / 补全的输入片段）
        #[serde(default)]
        value: Option<String>,
    },

    /// 某服务器的一次播放结束（成功、失败或被打断都恰好一次）
    PlaybackFinished { guild_id: GuildId },

    /// 语音连接被平台侧断开
    VoiceDisconnected { guild_id: GuildId },
}

/// 斜杠命令种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionCommand {
    Join,
    Leave,
    Speaker,
    SpeakerAutocomplete,
}

/// 出站指令（bot → 平台）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GatewayCommand {
    /// 认证
    Identify { token: String },

    /// 命令回执
    InteractionResponse {
        interaction_id: String,
        content: String,
        ephemeral: bool,
    },

    /// 补全候选
    AutocompleteResponse {
        interaction_id: String,
        choices: Vec<AutocompleteChoice>,
    },

    /// 向普通文字频道发消息（启动通知）
    ChannelMessage { channel_id: u64, content: String },

    /// 连接语音频道
    VoiceConnect { guild_id: GuildId, channel_id: u64 },

    /// 开始播放；随后跟一个二进制音频帧
    VoicePlay { guild_id: GuildId },

    /// 断开语音连接
    VoiceDisconnect { guild_id: GuildId },
}

/// 补全候选条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: String,
}

/// 写循环消费的出站帧
#[derive(Debug)]
pub enum OutboundFrame {
    /// JSON 指令帧
    Command(GatewayCommand),
    /// 二进制音频帧
    Audio(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialization() {
        let event: GatewayEvent = serde_json::from_str(
            r#"{"t":"message_create","guild_id":42,"author_is_bot":false,"content":"hi"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            GatewayEvent::MessageCreate {
                guild_id: Some(42),
                author_is_bot: false,
                content: "hi".to_string(),
            }
        );

        let event: GatewayEvent = serde_json::from_str(
            r#"{"t":"interaction_create","id":"i1","guild_id":42,"command":"join","channel_id":7,"channel_name":"general"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            GatewayEvent::InteractionCreate {
                id: "i1".to_string(),
                guild_id: 42,
                command: InteractionCommand::Join,
                channel_id: Some(7),
                channel_name: Some("general".to_string()),
                value: None,
            }
        );
    }

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_string(&GatewayCommand::VoicePlay { guild_id: 42 }).unwrap();
        assert_eq!(json, r#"{"op":"voice_play","guild_id":42}"#);

        let json = serde_json::to_string(&GatewayCommand::Identify {
            token: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"op":"identify","token":"secret"}"#);
    }
}
