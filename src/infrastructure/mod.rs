//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod gateway;
pub mod memory;

pub use adapters::{EdgeTtsClient, EdgeTtsClientConfig, FakeSynthesisClient};
pub use gateway::{ChatGateway, GatewayDeps, SessionRegistry};
pub use memory::InMemoryGuildConfig;
