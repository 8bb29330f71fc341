use async_trait::async_trait;

use crate::{common::PlaybackResult, protocol::tracks::Track};

/// Work admitted into a session from outside its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionCommand {
    /// The transport finished the play request identified by `token`.
    TrackEnded { token: u64, error: Option<String> },
    /// The idle timer armed with `generation` elapsed.
    IdleTimeout { generation: u64 },
}

/// Callback a transport uses to report the end of a track.
///
/// Safe to call from any thread: it only posts a message into the owning
/// session, which handles it in order with every other operation. Reports for
/// a track that is no longer current are dropped by the session.
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    token: u64,
    commands: flume::Sender<SessionCommand>,
}

impl CompletionHandle {
    pub(crate) fn new(token: u64, commands: flume::Sender<SessionCommand>) -> Self {
        Self { token, commands }
    }

    /// The play request this handle belongs to.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Reports the end of the track, with the error that ended it if any.
    pub fn complete(&self, error: Option<String>) {
        let _ = self.commands.send(SessionCommand::TrackEnded {
            token: self.token,
            error,
        });
    }

    pub fn finished(&self) {
        self.complete(None);
    }

    pub fn failed(&self, error: impl Into<String>) {
        self.complete(Some(error.into()));
    }
}

/// Audio output connection owned by the voice layer.
///
/// `stop`, `pause` and `resume` must not block. `play` should return once the
/// stream is requested; the session bounds it with a timeout regardless.
#[async_trait]
pub trait Transport: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Starts streaming `track`. When it ends, for any reason including
    /// `stop`, the transport calls `on_complete` exactly once.
    async fn play(&self, track: &Track, on_complete: CompletionHandle) -> PlaybackResult<()>;

    fn stop(&self);

    fn pause(&self);

    fn resume(&self);

    /// Leaves the voice channel. Called once when the session lets go of it.
    async fn disconnect(&self) {}
}
