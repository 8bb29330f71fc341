use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::plugin::{Query, TrackSource};
use crate::{common::CatalogError, protocol::tracks::Track};

const PUBLIC_API_BASE: &str = "https://api.deezer.com";

/// Free-text search over Deezer's public API. No credentials needed.
pub struct DeezerSource {
    client: reqwest::Client,
    limit: usize,
}

impl DeezerSource {
    pub fn new(limit: usize) -> Result<Self, CatalogError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            limit: limit.max(1),
        })
    }

    pub(crate) fn parse_track(json: &Value) -> Option<Track> {
        let id = json.get("id").map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })?;
        let title = json.get("title")?.as_str()?;
        let artist = json.pointer("/artist/name")?.as_str()?;
        let duration = json.get("duration").and_then(|v| v.as_u64()).unwrap_or(0);
        let link = json
            .get("link")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://www.deezer.com/track/{}", id));

        let mut track = Track::new(link, title, artist, duration).with_id(id);
        if let Some(cover) = json
            .pointer("/album/cover_xl")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
        {
            track = track.with_thumbnail(cover);
        }
        Some(track)
    }

    /// Tracks from a `/search` response, at most `limit`, skipping malformed items.
    pub(crate) fn parse_search(json: &Value, limit: usize) -> Vec<Track> {
        json.get("data")
            .and_then(|v| v.as_array())
            .map(|data| {
                data.iter()
                    .filter_map(Self::parse_track)
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl TrackSource for DeezerSource {
    fn name(&self) -> &str {
        "deezer"
    }

    fn can_handle(&self, query: &Query) -> bool {
        query.is_search()
    }

    async fn resolve(&self, query: &Query) -> Result<Vec<Track>, CatalogError> {
        let url = format!(
            "{}/search?q={}&limit={}",
            PUBLIC_API_BASE,
            urlencoding::encode(query.as_str()),
            self.limit
        );
        debug!("Searching Deezer: {}", query);

        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            warn!(
                "Deezer public API request failed: {} (Status: {})",
                url,
                res.status()
            );
            return Err(CatalogError::NotFound(query.to_string()));
        }

        let json: Value = res.json().await?;
        if let Some(message) = json.pointer("/error/message").and_then(|v| v.as_str()) {
            warn!("Deezer search error for '{}': {}", query, message);
            return Err(CatalogError::NotFound(query.to_string()));
        }

        Ok(Self::parse_search(&json, self.limit))
    }
}
