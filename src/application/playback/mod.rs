//! Playback - 每服务器播放管线
//!
//! - queue: 严格 FIFO 的朗读队列
//! - synthesizer: 合成适配器（归一化 / 跳过判定 / 流式累积）
//! - controller: 播放控制器（核心状态机）

mod controller;
mod queue;
mod synthesizer;

pub use controller::PlaybackController;
pub use queue::UtteranceQueue;
pub use synthesizer::{SpeechSynthesizer, SynthesisOutcome};
