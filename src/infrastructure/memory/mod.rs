//! In-Memory Implementations - 内存实现

mod guild_config;

pub use guild_config::InMemoryGuildConfig;
