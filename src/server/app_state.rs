use std::sync::Arc;

use crate::{lyrics::LyricsService, server::SessionRegistry, sources::TrackCatalog};

/// Top-level application state.
pub struct AppState {
    pub sessions: SessionRegistry,
    pub catalog: Arc<TrackCatalog>,
    pub lyrics: Arc<LyricsService>,
    pub config: crate::configs::Config,
}

impl AppState {
    pub fn new(
        config: crate::configs::Config,
        events: Option<flume::Sender<crate::protocol::SessionEvent>>,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(config.player.clone(), events),
            catalog: Arc::new(TrackCatalog::new(&config)),
            lyrics: Arc::new(LyricsService::new(&config)),
            config,
        }
    }
}
