//! In-Memory Guild Config Implementation
//!
//! 进程内存活，不持久化。记录只增不删。

use chrono::Utc;
use dashmap::DashMap;

use crate::application::ports::{GuildConfigPort, GuildConfigRecord};
use crate::domain::GuildId;

/// 内存服务器配置存储
pub struct InMemoryGuildConfig {
    records: DashMap<GuildId, GuildConfigRecord>,
}

impl InMemoryGuildConfig {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for InMemoryGuildConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GuildConfigPort for InMemoryGuildConfig {
    fn ensure(&self, guild_id: GuildId, default_voice: &str) {
        self.records.entry(guild_id).or_insert_with(|| {
            tracing::debug!(guild_id, voice_id = %default_voice, "Guild config created");
            GuildConfigRecord {
                guild_id,
                voice_id: default_voice.to_string(),
                updated_at: Utc::now(),
            }
        });
    }

    fn selected_voice(&self, guild_id: GuildId) -> Option<String> {
        self.records.get(&guild_id).map(|r| r.voice_id.clone())
    }

    fn set_voice(&self, guild_id: GuildId, voice_id: &str) {
        let mut record = self.records.entry(guild_id).or_insert_with(|| {
            GuildConfigRecord {
                guild_id,
                voice_id: voice_id.to_string(),
                updated_at: Utc::now(),
            }
        });
        record.voice_id = voice_id.to_string();
        record.updated_at = Utc::now();
        tracing::info!(guild_id, voice_id = %voice_id, "Guild voice updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_config_lifecycle() {
        let store = InMemoryGuildConfig::new();

        // 未观测过的服务器没有记录
        assert_eq!(store.selected_voice(1), None);

        // ensure 建立默认值
        store.ensure(1, "default-voice");
        assert_eq!(store.selected_voice(1).as_deref(), Some("default-voice"));

        // set 覆盖
        store.set_voice(1, "other-voice");
        assert_eq!(store.selected_voice(1).as_deref(), Some("other-voice"));

        // 再次 ensure 保留既有选择
        store.ensure(1, "default-voice");
        assert_eq!(store.selected_voice(1).as_deref(), Some("other-voice"));
    }
}
