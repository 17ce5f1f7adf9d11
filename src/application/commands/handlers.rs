//! Command Handlers

use std::sync::Arc;

use crate::application::commands::{JoinVoice, LeaveVoice, SelectSpeaker};
use crate::application::error::CommandError;
use crate::application::playback::PlaybackController;
use crate::application::ports::{GuildConfigPort, VoiceConnectorPort};
use crate::domain::voice::VoiceCatalog;

// ============================================================================
// JoinVoice
// ============================================================================

/// 加入成功的回执
#[derive(Debug, Clone)]
pub struct JoinResponse {
    pub channel_name: String,
}

/// JoinVoice Handler
pub struct JoinHandler {
    connector: Arc<dyn VoiceConnectorPort>,
    controller: Arc<PlaybackController>,
    guild_config: Arc<dyn GuildConfigPort>,
    catalog: Arc<VoiceCatalog>,
}

impl JoinHandler {
    pub fn new(
        connector: Arc<dyn VoiceConnectorPort>,
        controller: Arc<PlaybackController>,
        guild_config: Arc<dyn GuildConfigPort>,
        catalog: Arc<VoiceCatalog>,
    ) -> Self {
        Self {
            connector,
            controller,
            guild_config,
            catalog,
        }
    }

    pub async fn handle(&self, command: JoinVoice) -> Result<JoinResponse, CommandError> {
        let channel_id = command.channel_id.ok_or(CommandError::VoiceChannelMissing)?;

        let session = self
            .connector
            .connect(command.guild_id, channel_id)
            .await
            .map_err(|e| CommandError::Gateway(e.to_string()))?;

        self.controller.attach_session(command.guild_id, session);
        self.guild_config
            .ensure(command.guild_id, self.catalog.default_voice_id());

        tracing::info!(
            guild_id = command.guild_id,
            channel_id,
            "Joined voice channel"
        );

        Ok(JoinResponse {
            channel_name: command
                .channel_name
                .unwrap_or_else(|| channel_id.to_string()),
        })
    }
}

// ============================================================================
// LeaveVoice
// ============================================================================

/// LeaveVoice Handler
pub struct LeaveHandler {
    controller: Arc<PlaybackController>,
}

impl LeaveHandler {
    pub fn new(controller: Arc<PlaybackController>) -> Self {
        Self { controller }
    }

    pub fn handle(&self, command: LeaveVoice) -> Result<(), CommandError> {
        let session = self
            .controller
            .session(command.guild_id)
            .ok_or(CommandError::NotConnected)?;

        session.disconnect();
        self.controller.detach_session(command.guild_id);

        tracing::info!(guild_id = command.guild_id, "Left voice channel");
        Ok(())
    }
}

// ============================================================================
// SelectSpeaker
// ============================================================================

/// 选择成功的回执
#[derive(Debug, Clone)]
pub struct SelectSpeakerResponse {
    pub display_name: String,
}

/// SelectSpeaker Handler
pub struct SelectSpeakerHandler {
    catalog: Arc<VoiceCatalog>,
    guild_config: Arc<dyn GuildConfigPort>,
}

impl SelectSpeakerHandler {
    pub fn new(catalog: Arc<VoiceCatalog>, guild_config: Arc<dyn GuildConfigPort>) -> Self {
        Self {
            catalog,
            guild_config,
        }
    }

    pub fn handle(&self, command: SelectSpeaker) -> Result<SelectSpeakerResponse, CommandError> {
        // 先校验目录成员资格，拒绝时不触碰存储
        if !self.catalog.contains(&command.voice_id) {
            return Err(CommandError::InvalidSelection(command.voice_id));
        }

        self.guild_config
            .set_voice(command.guild_id, &command.voice_id);

        let display_name = self
            .catalog
            .display_name(&command.voice_id)
            .unwrap_or(&command.voice_id)
            .to_string();

        tracing::info!(
            guild_id = command.guild_id,
            voice_id = %command.voice_id,
            "Speaker selected"
        );

        Ok(SelectSpeakerResponse { display_name })
    }
}
