use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::{
  common::types::GuildId, configs::PlayerConfig, player::PlaybackSession,
  protocol::events::SessionEvent,
};

/// Every live playback session, keyed by guild.
pub struct SessionRegistry {
  sessions: DashMap<GuildId, Arc<PlaybackSession>>,
  config: PlayerConfig,
  events: Option<flume::Sender<SessionEvent>>,
}

impl SessionRegistry {
  pub fn new(config: PlayerConfig, events: Option<flume::Sender<SessionEvent>>) -> Self {
    Self {
      sessions: DashMap::new(),
      config,
      events,
    }
  }

  /// Returns the guild's session, creating it on first use. Concurrent
  /// callers for the same guild always get the same session.
  pub fn get_or_create(&self, guild_id: impl Into<GuildId>) -> Arc<PlaybackSession> {
    let guild_id = guild_id.into();
    self
      .sessions
      .entry(guild_id.clone())
      .or_insert_with(|| {
        info!("[{}] creating playback session", guild_id);
        PlaybackSession::new(guild_id.clone(), self.config.clone(), self.events.clone())
      })
      .clone()
  }

  pub fn get(&self, guild_id: &GuildId) -> Option<Arc<PlaybackSession>> {
    self.sessions.get(guild_id).map(|s| s.clone())
  }

  /// Disconnects the session and forgets it. Returns false when the guild
  /// had no session.
  pub async fn teardown(&self, guild_id: &GuildId) -> bool {
    let Some((_, session)) = self.sessions.remove(guild_id) else {
      return false;
    };
    session.disconnect().await;
    info!("[{}] playback session torn down", guild_id);
    true
  }

  /// Tears down every session.
  pub async fn shutdown(&self) {
    let keys = self.keys();
    info!("Shutting down {} playback session(s)", keys.len());
    for guild_id in keys {
      self.teardown(&guild_id).await;
    }
  }

  pub fn keys(&self) -> Vec<GuildId> {
    self.sessions.iter().map(|e| e.key().clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.sessions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.is_empty()
  }
}
