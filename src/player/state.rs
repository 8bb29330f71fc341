use serde::Serialize;

use crate::{common::types::GuildId, protocol::tracks::Track};

/// Playback state of a session. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl PlaybackState {
    /// True while a current track exists.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// How far into the current track playback is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Elapsed seconds, never more than `total_secs`.
    pub elapsed_secs: u64,
    pub total_secs: u64,
    /// Whole percent in `0..=100`.
    pub percent: u8,
}

impl Progress {
    pub fn new(elapsed_secs: u64, total_secs: u64) -> Self {
        let elapsed_secs = elapsed_secs.min(total_secs);
        let percent = if total_secs > 0 {
            (elapsed_secs * 100 / total_secs) as u8
        } else {
            0
        };
        Self {
            elapsed_secs,
            total_secs,
            percent,
        }
    }
}

/// Consistent view of one session, taken under the session lock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub guild_id: GuildId,
    pub current: Option<Track>,
    pub queue: Vec<Track>,
    pub state: PlaybackState,
    pub shuffled: bool,
    pub progress: Progress,
    /// Queue plus current track, in seconds.
    pub total_duration_secs: u64,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePageEntry {
    /// 1-based position in the whole queue.
    pub position: usize,
    pub track: Track,
}

/// One page of the upcoming queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage {
    /// 1-based, clamped into the valid range.
    pub page: usize,
    pub total_pages: usize,
    pub total_tracks: usize,
    pub entries: Vec<QueuePageEntry>,
}
