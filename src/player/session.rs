use std::sync::{Arc, Weak};

use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    common::{PlaybackError, PlaybackResult, types::GuildId},
    configs::PlayerConfig,
    lyrics::LyricsService,
    player::{
        context::PlayerContext,
        state::{PlaybackState, PlayerSnapshot, Progress, QueuePage},
        timer::Timer,
        transport::{CompletionHandle, SessionCommand, Transport},
    },
    protocol::{
        events::{SessionEvent, TrackEndReason, TrackException},
        tracks::Track,
    },
};

struct SessionInner {
    player: PlayerContext,
    transport: Option<Arc<dyn Transport>>,
    idle_timer: Timer,
    /// Last token handed to the transport.
    play_token: u64,
    /// Token whose completion may still advance the queue.
    active_token: Option<u64>,
}

impl SessionInner {
    fn connected_transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport.as_ref().filter(|t| t.is_connected()).cloned()
    }
}

/// Playback state of one guild.
///
/// Every operation takes the session lock for its whole duration, so no two
/// mutations interleave. Transport completions and idle timer firings arrive
/// as messages on a per-session channel and are applied by a worker task
/// through the same lock.
pub struct PlaybackSession {
    guild_id: GuildId,
    config: PlayerConfig,
    inner: Mutex<SessionInner>,
    commands: flume::Sender<SessionCommand>,
    events: Option<flume::Sender<SessionEvent>>,
    worker: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackSession {
    /// Creates the session and its command worker. Must be called inside a Tokio runtime.
    pub fn new(
        guild_id: GuildId,
        config: PlayerConfig,
        events: Option<flume::Sender<SessionEvent>>,
    ) -> Arc<Self> {
        let (commands, receiver) = flume::unbounded();
        let session = Arc::new(Self {
            inner: Mutex::new(SessionInner {
                player: PlayerContext::new(guild_id.clone()),
                transport: None,
                idle_timer: Timer::new(),
                play_token: 0,
                active_token: None,
            }),
            guild_id,
            config,
            commands,
            events,
            worker: parking_lot::Mutex::new(None),
        });

        let worker = tokio::spawn(command_loop(Arc::downgrade(&session), receiver));
        *session.worker.lock() = Some(worker);
        session
    }

    pub fn guild_id(&self) -> &GuildId {
        &self.guild_id
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    /// Hands the session a voice connection, replacing any previous one.
    pub async fn attach_transport(&self, transport: Arc<dyn Transport>) {
        let mut inner = self.inner.lock().await;
        if inner.transport.is_some() {
            debug!("[{}] replacing transport", self.guild_id);
        }
        inner.transport = Some(transport);
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.connected_transport().is_some()
    }

    // -- Queue operations ---------------------------------------------------

    /// Adds a track and returns its 0-based queue index.
    pub async fn enqueue(&self, track: Track) -> usize {
        let mut inner = self.inner.lock().await;
        self.cancel_idle_timer(&mut inner);
        debug!("[{}] queued {}", self.guild_id, track);
        inner.player.enqueue(track)
    }

    /// Adds every track in order and returns how many were added.
    pub async fn enqueue_many(&self, tracks: Vec<Track>) -> usize {
        if tracks.is_empty() {
            return 0;
        }
        let mut inner = self.inner.lock().await;
        self.cancel_idle_timer(&mut inner);
        let count = tracks.len();
        for track in tracks {
            inner.player.enqueue(track);
        }
        debug!("[{}] queued {} tracks", self.guild_id, count);
        count
    }

    pub async fn remove_at(&self, index: usize) -> Option<Track> {
        let mut inner = self.inner.lock().await;
        let removed = inner.player.remove_at(index)?;
        self.cancel_idle_timer(&mut inner);
        debug!("[{}] removed {} at {}", self.guild_id, removed, index);
        Some(removed)
    }

    pub async fn move_to(&self, from: usize, to: usize) -> PlaybackResult<()> {
        self.inner.lock().await.player.move_to(from, to)
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.player.clear();
        self.cancel_idle_timer(&mut inner);
    }

    /// Flips shuffle mode and returns the new flag.
    pub async fn toggle_shuffle(&self) -> bool {
        let shuffled = self.inner.lock().await.player.toggle_shuffle();
        info!("[{}] shuffle {}", self.guild_id, if shuffled { "on" } else { "off" });
        shuffled
    }

    // -- Playback state machine ---------------------------------------------

    /// Starts the next queued track.
    ///
    /// `Ok(None)` means the queue was empty: the session is idle and the idle
    /// timer is armed. Tracks the transport refuses are dropped and the next
    /// one is tried. Fails with `NotConnected`, leaving state untouched, when
    /// there is work but no live transport.
    ///
    /// A track that is still playing is stopped and reported as
    /// `TrackEnd { Stopped }` before the next one starts.
    pub async fn advance(&self) -> PlaybackResult<Option<Track>> {
        let mut inner = self.inner.lock().await;
        if inner.player.state().is_active() {
            if let Some(transport) = inner.connected_transport() {
                transport.stop();
                inner.active_token = None;
                if let Some(track) = inner.player.finish() {
                    debug!("[{}] replacing {}", self.guild_id, track);
                    self.emit(SessionEvent::TrackEnd {
                        guild_id: self.guild_id.clone(),
                        track,
                        reason: TrackEndReason::Stopped,
                    });
                }
            }
        }
        self.advance_locked(&mut inner).await
    }

    async fn advance_locked(&self, inner: &mut SessionInner) -> PlaybackResult<Option<Track>> {
        self.cancel_idle_timer(inner);

        loop {
            if inner.player.queue_is_empty() {
                self.enter_idle(inner);
                return Ok(None);
            }

            let Some(transport) = inner.connected_transport() else {
                warn!("[{}] cannot advance: transport not connected", self.guild_id);
                return Err(PlaybackError::NotConnected);
            };

            let Some(track) = inner.player.pop_next() else {
                continue;
            };
            inner.play_token += 1;
            let token = inner.play_token;
            let on_complete = CompletionHandle::new(token, self.commands.clone());

            let request = transport.play(&track, on_complete);
            let outcome = tokio::time::timeout(self.config.transport_timeout(), request)
                .await
                .unwrap_or(Err(PlaybackError::Timeout(self.config.transport_timeout_ms)));

            match outcome {
                Ok(()) => {
                    inner.player.begin(track.clone(), Instant::now());
                    inner.active_token = Some(token);
                    info!("[{}] now playing: {}", self.guild_id, track);
                    self.emit(SessionEvent::TrackStart {
                        guild_id: self.guild_id.clone(),
                        track: track.clone(),
                    });
                    return Ok(Some(track));
                }
                Err(e) => {
                    warn!("[{}] failed to play {}: {}", self.guild_id, track, e);
                    self.emit(SessionEvent::TrackException {
                        guild_id: self.guild_id.clone(),
                        exception: TrackException {
                            message: e.to_string(),
                            severity: e.severity(),
                        },
                        track,
                    });
                }
            }
        }
    }

    /// Clears the current track, goes `Idle` and arms the idle timer. The queue is left alone.
    fn enter_idle(&self, inner: &mut SessionInner) {
        if let Some(previous) = inner.player.finish() {
            debug!("[{}] released {}", self.guild_id, previous);
        }
        inner.active_token = None;

        let commands = self.commands.clone();
        let generation = inner
            .idle_timer
            .arm(self.config.idle_timeout(), move |generation| {
                let _ = commands.send(SessionCommand::IdleTimeout { generation });
            });
        info!(
            "[{}] idle, timer armed for {}s (generation {})",
            self.guild_id, self.config.idle_timeout_secs, generation
        );
        self.emit(SessionEvent::QueueEnd {
            guild_id: self.guild_id.clone(),
        });
    }

    fn cancel_idle_timer(&self, inner: &mut SessionInner) {
        if inner.idle_timer.cancel() {
            info!("[{}] idle timer cancelled", self.guild_id);
        }
    }

    /// Ends the current track early; the transport's completion advances the queue.
    pub async fn skip(&self) -> bool {
        let inner = self.inner.lock().await;
        if !inner.player.state().is_active() {
            return false;
        }
        let Some(transport) = inner.connected_transport() else {
            return false;
        };
        transport.stop();
        info!("[{}] skipped track", self.guild_id);
        true
    }

    pub async fn pause(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.player.state() != PlaybackState::Playing {
            return false;
        }
        let Some(transport) = inner.transport.clone() else {
            return false;
        };
        transport.pause();
        inner.player.pause(Instant::now());
        info!("[{}] paused", self.guild_id);
        true
    }

    pub async fn resume(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.player.state() != PlaybackState::Paused {
            return false;
        }
        let Some(transport) = inner.transport.clone() else {
            return false;
        };
        transport.resume();
        inner.player.resume(Instant::now());
        info!("[{}] resumed", self.guild_id);
        true
    }

    /// Stops playback and drops the queue. The transport stays attached and
    /// the idle timer starts counting, unless an idle session already had it
    /// running.
    pub async fn stop(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(transport) = inner.transport.clone() else {
            return false;
        };
        let already_idle =
            inner.player.state() == PlaybackState::Idle && inner.idle_timer.is_armed();
        self.halt(&mut inner, transport.as_ref());
        if !already_idle {
            self.enter_idle(&mut inner);
        }
        info!("[{}] stopped playback", self.guild_id);
        true
    }

    /// Stops playback, drops the queue and releases the transport.
    /// Returns false when no transport was attached.
    pub async fn disconnect(&self) -> bool {
        let mut inner = self.inner.lock().await;
        self.disconnect_locked(&mut inner).await
    }

    async fn disconnect_locked(&self, inner: &mut SessionInner) -> bool {
        self.cancel_idle_timer(inner);
        let Some(transport) = inner.transport.take() else {
            return false;
        };
        self.halt(inner, transport.as_ref());
        transport.disconnect().await;
        info!("[{}] disconnected", self.guild_id);
        true
    }

    /// Stops the transport and clears queue and current track. Any completion
    /// the stop triggers is stale afterwards.
    fn halt(&self, inner: &mut SessionInner, transport: &dyn Transport) {
        if inner.player.state().is_active() {
            transport.stop();
        }
        inner.active_token = None;
        inner.player.clear();
        if let Some(track) = inner.player.finish() {
            self.emit(SessionEvent::TrackEnd {
                guild_id: self.guild_id.clone(),
                track,
                reason: TrackEndReason::Stopped,
            });
        }
    }

    // -- Admitted commands --------------------------------------------------

    async fn handle_command(&self, command: SessionCommand) {
        match command {
            SessionCommand::TrackEnded { token, error } => self.on_track_end(token, error).await,
            SessionCommand::IdleTimeout { generation } => self.on_idle_timeout(generation).await,
        }
    }

    async fn on_track_end(&self, token: u64, error: Option<String>) {
        let mut inner = self.inner.lock().await;
        if inner.active_token != Some(token) {
            debug!("[{}] ignoring stale completion {}", self.guild_id, token);
            return;
        }
        inner.active_token = None;

        if let Some(track) = inner.player.current().cloned() {
            let reason = match &error {
                Some(message) => {
                    warn!("[{}] {} ended with error: {}", self.guild_id, track, message);
                    self.emit(SessionEvent::TrackException {
                        guild_id: self.guild_id.clone(),
                        track: track.clone(),
                        exception: TrackException {
                            message: message.clone(),
                            severity: crate::common::Severity::Fault,
                        },
                    });
                    TrackEndReason::LoadFailed
                }
                None => TrackEndReason::Finished,
            };
            self.emit(SessionEvent::TrackEnd {
                guild_id: self.guild_id.clone(),
                track,
                reason,
            });
        }

        if let Err(e) = self.advance_locked(&mut inner).await {
            // Queue is kept for a later advance on a fresh transport.
            warn!("[{}] could not continue after track end: {}", self.guild_id, e);
            self.enter_idle(&mut inner);
        }
    }

    async fn on_idle_timeout(&self, generation: u64) {
        let mut inner = self.inner.lock().await;
        if !inner.idle_timer.take_if_current(generation) {
            debug!("[{}] ignoring stale idle timer {}", self.guild_id, generation);
            return;
        }
        if !inner.player.queue_is_empty() || inner.player.state() == PlaybackState::Playing {
            debug!("[{}] idle timer fired but session is busy", self.guild_id);
            return;
        }

        info!("[{}] idle timeout reached, disconnecting", self.guild_id);
        if self.disconnect_locked(&mut inner).await {
            self.emit(SessionEvent::IdleDisconnect {
                guild_id: self.guild_id.clone(),
            });
        }
    }

    // -- Read-only accessors ------------------------------------------------

    pub async fn state(&self) -> PlaybackState {
        self.inner.lock().await.player.state()
    }

    pub async fn current(&self) -> Option<Track> {
        self.inner.lock().await.player.current().cloned()
    }

    pub async fn queue(&self) -> Vec<Track> {
        self.inner.lock().await.player.queue()
    }

    pub async fn is_shuffled(&self) -> bool {
        self.inner.lock().await.player.is_shuffled()
    }

    pub async fn is_idle_timer_armed(&self) -> bool {
        self.inner.lock().await.idle_timer.is_armed()
    }

    pub async fn progress(&self) -> Progress {
        self.inner.lock().await.player.progress(Instant::now())
    }

    pub async fn total_duration(&self) -> u64 {
        self.inner.lock().await.player.total_duration()
    }

    pub async fn position_of(&self, track: &Track) -> Option<usize> {
        self.inner.lock().await.player.position_of(track)
    }

    /// 1-based page of the queue using the configured page size.
    pub async fn queue_page(&self, page: usize) -> QueuePage {
        self.inner
            .lock()
            .await
            .player
            .queue_page(page, self.config.queue_page_size)
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        let inner = self.inner.lock().await;
        let connected = inner.connected_transport().is_some();
        inner.player.snapshot(Instant::now(), connected)
    }

    /// Lyrics of the current track, cache first. The session lock is not held
    /// while the provider is queried.
    pub async fn current_lyrics(&self, lyrics: &LyricsService) -> Option<String> {
        let track = self.current().await?;
        lyrics.lyrics_for(&track).await
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
    }
}

async fn command_loop(session: Weak<PlaybackSession>, commands: flume::Receiver<SessionCommand>) {
    while let Ok(command) = commands.recv_async().await {
        let Some(session) = session.upgrade() else {
            break;
        };
        session.handle_command(command).await;
    }
}
