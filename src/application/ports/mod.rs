//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod guild_config;
mod synthesis;
mod voice_session;

pub use guild_config::{GuildConfigPort, GuildConfigRecord};
pub use synthesis::{
    ChunkKind, RawVoice, SynthesisChunk, SynthesisError, SynthesisProviderPort, SynthesisStream,
};
pub use voice_session::{
    ConnectError, PlaybackStartError, VoiceConnectorPort, VoiceSessionPort,
};
