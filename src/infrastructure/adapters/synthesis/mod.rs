//! Synthesis Adapters - 合成服务适配器

mod edge_tts_client;
mod fake_synthesis_client;

pub use edge_tts_client::{EdgeTtsClient, EdgeTtsClientConfig};
pub use fake_synthesis_client::FakeSynthesisClient;
