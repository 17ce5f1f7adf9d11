//! 应用层错误定义
//!
//! 只有用户输入类校验错误会传播到命令响应层；合成与播放层的故障在
//! 播放控制器/合成适配器内部就地消化，永远不会让队列卡死。

use thiserror::Error;

/// 命令层错误
#[derive(Debug, Error)]
pub enum CommandError {
    /// join 时调用者不在任何语音频道
    #[error("invoker is not in a voice channel")]
    VoiceChannelMissing,

    /// leave 等命令执行时没有活跃会话
    #[error("no active voice session")]
    NotConnected,

    /// speaker 选择的音色不在目录里
    #[error("voice not in catalog: {0}")]
    InvalidSelection(String),

    /// 网关/连接层故障
    #[error("gateway error: {0}")]
    Gateway(String),
}

impl CommandError {
    /// 回复给用户的文案
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::VoiceChannelMissing => "❌ 先にボイスチャンネルに入ってください。",
            Self::NotConnected => "接続していません。",
            Self::InvalidSelection(_) => "有効なスピーカーを候補から選んでください。",
            Self::Gateway(_) => "コマンドの実行に失敗しました。",
        }
    }
}
