//! Commands - 斜杠命令
//!
//! join / leave / speaker 三个命令及其处理器。命令注册与 UI 由聊天
//! 平台网关负责，这里只做业务编排。

mod handlers;

pub use handlers::{
    JoinHandler, JoinResponse, LeaveHandler, SelectSpeakerHandler, SelectSpeakerResponse,
};

use crate::domain::GuildId;

/// 加入调用者所在的语音频道
#[derive(Debug, Clone)]
pub struct JoinVoice {
    pub guild_id: GuildId,
    /// 调用者当前所在语音频道；不在任何频道时为 None
    pub channel_id: Option<u64>,
    pub channel_name: Option<String>,
}

/// 退出语音频道
#[derive(Debug, Clone)]
pub struct LeaveVoice {
    pub guild_id: GuildId,
}

/// 为本服务器选择朗读音色
#[derive(Debug, Clone)]
pub struct SelectSpeaker {
    pub guild_id: GuildId,
    pub voice_id: String,
}
