//! Guild Config Port - 每服务器配置存储抽象
//!
//! 保存每个服务器当前选中的音色。进程内存活，不持久化。

use chrono::{DateTime, Utc};

use crate::domain::GuildId;

/// 一条服务器配置记录
#[derive(Debug, Clone)]
pub struct GuildConfigRecord {
    pub guild_id: GuildId,
    pub voice_id: String,
    pub updated_at: DateTime<Utc>,
}

/// Guild Config Port
///
/// 音色 id 的合法性校验在命令层完成，存储本身不持有目录。
pub trait GuildConfigPort: Send + Sync {
    /// 确保记录存在；已存在时保留现有选择
    fn ensure(&self, guild_id: GuildId, default_voice: &str);

    /// 当前选中的音色
    fn selected_voice(&self, guild_id: GuildId) -> Option<String>;

    /// 覆盖选中的音色
    fn set_voice(&self, guild_id: GuildId, voice_id: &str);
}
