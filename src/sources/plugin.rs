use async_trait::async_trait;

use crate::{common::CatalogError, protocol::tracks::Track};

/// What a user typed: a direct link or free-text search terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Url(String),
    Search(String),
}

impl Query {
    /// Trims the input and strips the `<...>` wrapping chat clients add to
    /// links. Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let clean = input
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim();

        if clean.is_empty() {
            return None;
        }

        if clean.starts_with("http://") || clean.starts_with("https://") {
            Some(Self::Url(clean.to_string()))
        } else {
            Some(Self::Search(clean.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Search(s) => s,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, Self::Search(_))
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend that turns queries into tracks.
///
/// Sources are tried in registration order; the first one whose
/// [`can_handle`](TrackSource::can_handle) accepts the query resolves it.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Unique identifier for this source (e.g. "http").
    fn name(&self) -> &str;

    fn can_handle(&self, query: &Query) -> bool;

    /// Resolves the query into zero or more tracks, best match first.
    async fn resolve(&self, query: &Query) -> Result<Vec<Track>, CatalogError>;
}

pub type BoxedSource = Box<dyn TrackSource>;
