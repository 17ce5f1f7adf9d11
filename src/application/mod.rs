//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SynthesisProvider、VoiceSession、GuildConfig 等）
//! - playback: 播放队列 + 播放控制器（核心）
//! - intake: 消息过滤与入队
//! - commands / queries: 命令与补全查询
//! - catalog: 音色目录引导
//! - error: 命令层错误定义

pub mod catalog;
pub mod commands;
pub mod error;
pub mod intake;
pub mod playback;
pub mod ports;
pub mod queries;

pub use catalog::load_catalog;
pub use commands::{
    JoinHandler, JoinResponse, JoinVoice, LeaveHandler, LeaveVoice, SelectSpeaker,
    SelectSpeakerHandler, SelectSpeakerResponse,
};
pub use error::CommandError;
pub use intake::{ChatMessage, MessageIntake};
pub use playback::{PlaybackController, SpeechSynthesizer, SynthesisOutcome, UtteranceQueue};
pub use ports::{
    ChunkKind, ConnectError, GuildConfigPort, GuildConfigRecord, PlaybackStartError, RawVoice,
    SynthesisChunk, SynthesisError, SynthesisProviderPort, SynthesisStream, VoiceConnectorPort,
    VoiceSessionPort,
};
pub use queries::{SpeakerAutocompleteHandler, SpeakerChoice};
