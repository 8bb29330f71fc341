use serde::{Deserialize, Serialize};

use crate::common::title::{clean_title, format_duration};

/// A playable track as produced by the catalog. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Stream or page URL handed to the transport.
    pub url: String,
    /// Title as reported by the source.
    pub title: String,
    /// Title without artist prefix and annotations.
    pub clean_title: String,
    pub artist: String,
    /// Length in seconds, 0 when unknown or a live stream.
    pub duration_secs: u64,
    pub thumbnail_url: Option<String>,
    pub webpage_url: String,
    /// Source specific identifier.
    pub id: Option<String>,
}

impl Track {
    /// Builds a track, deriving the clean title from `title` and `artist`.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_secs: u64,
    ) -> Self {
        let url = url.into();
        let title = title.into();
        let artist = artist.into();
        Self {
            clean_title: clean_title(&title, &artist),
            webpage_url: url.clone(),
            url,
            title,
            artist,
            duration_secs,
            thumbnail_url: None,
            id: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }

    pub fn with_webpage_url(mut self, webpage_url: impl Into<String>) -> Self {
        self.webpage_url = webpage_url.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Title for display, preferring the cleaned one.
    pub fn display_title(&self) -> &str {
        if self.clean_title.is_empty() {
            &self.title
        } else {
            &self.clean_title
        }
    }

    pub fn display_duration(&self) -> String {
        format_duration(self.duration_secs)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.display_title())
    }
}
