use serde::Serialize;
use thiserror::Error;

/// How bad a reported failure is for the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// The track could not be played, the session carries on.
    Common,
    /// The transport misbehaved in a way that may repeat.
    Fault,
}

/// Failures of session operations. None of them tear the session down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("transport is not connected")]
    NotConnected,
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("transport did not answer within {0} ms")]
    Timeout(u64),
}

impl PlaybackError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::InvalidArgument(_) | Self::NotConnected => Severity::Common,
            Self::TransportFailure(_) | Self::Timeout(_) => Severity::Fault,
        }
    }
}

pub type PlaybackResult<T> = std::result::Result<T, PlaybackError>;

/// Failures while resolving a query or URL into tracks.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("a URL or search query is required")]
    EmptyQuery,
    #[error("nothing found for '{0}'")]
    NotFound(String),
    #[error("no source can handle '{0}'")]
    Unsupported(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Failures of a lyrics lookup.
#[derive(Debug, Error)]
pub enum LyricsError {
    #[error("no lyrics for {artist} - {title}")]
    NotFound { artist: String, title: String },
    #[error("provider returned status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
