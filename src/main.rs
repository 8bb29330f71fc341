use std::sync::Arc;

use guildplay::{
    common::logger, configs::Config, log_println, protocol::SessionEvent, server::AppState,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::load()?;
    logger::init(&config);

    log_println!(
        "guildplay v{} | idle timeout {}s",
        env!("CARGO_PKG_VERSION"),
        config.player.idle_timeout_secs
    );

    let (events_tx, events_rx) = flume::unbounded::<SessionEvent>();
    let state = Arc::new(AppState::new(config, Some(events_tx)));

    let sweeper = state.lyrics.cache().spawn_sweeper(tokio::time::Duration::from_secs(
        state.config.lyrics.sweep_interval_secs.max(1),
    ));

    let event_logger = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv_async().await {
            match &event {
                SessionEvent::TrackException { exception, .. } => {
                    warn!("[{}] track exception: {}", event.guild_id(), exception.message)
                }
                _ => match serde_json::to_string(&event) {
                    Ok(json) => info!("[{}] event {}", event.guild_id(), json),
                    Err(e) => warn!("[{}] unserializable event: {}", event.guild_id(), e),
                },
            }
        }
    });

    info!(
        "Ready with sources [{}] and {} lyrics provider(s)",
        state.catalog.source_names().join(", "),
        state.lyrics.providers.len()
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    state.sessions.shutdown().await;
    sweeper.abort();
    event_logger.abort();

    Ok(())
}
