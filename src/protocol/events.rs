use serde::Serialize;

use crate::{
    common::{Severity, types::GuildId},
    protocol::tracks::Track,
};

/// Why a track stopped being the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackEndReason {
    /// The transport reported the end of the stream, including skips.
    Finished,
    /// The transport reported an error while playing.
    LoadFailed,
    /// `stop` or `disconnect` dropped it.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackException {
    pub message: String,
    pub severity: Severity,
}

/// Events published by a session for presenters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    #[serde(rename = "TrackStartEvent")]
    TrackStart {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: Track,
    },

    #[serde(rename = "TrackEndEvent")]
    TrackEnd {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: Track,
        reason: TrackEndReason,
    },

    #[serde(rename = "TrackExceptionEvent")]
    TrackException {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: Track,
        exception: TrackException,
    },

    /// `advance` found nothing left to play.
    #[serde(rename = "QueueEndEvent")]
    QueueEnd {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
    },

    /// The idle timer fired and the session let go of its transport.
    #[serde(rename = "IdleDisconnectEvent")]
    IdleDisconnect {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
    },
}

impl SessionEvent {
    pub fn guild_id(&self) -> &GuildId {
        match self {
            Self::TrackStart { guild_id, .. }
            | Self::TrackEnd { guild_id, .. }
            | Self::TrackException { guild_id, .. }
            | Self::QueueEnd { guild_id }
            | Self::IdleDisconnect { guild_id } => guild_id,
        }
    }
}
