use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use tracing::debug;

use super::plugin::{Query, TrackSource};
use crate::{common::CatalogError, protocol::tracks::Track};

/// Direct audio links.
///
/// Metadata comes from the response headers of a `HEAD` request. Durations
/// are not probed, so every HTTP track reports an unknown length.
pub struct HttpSource {
    url_regex: Regex,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self {
            url_regex: Regex::new(r"^https?://[^\s/$.?#][^\s]*$")
                .map_err(|e| CatalogError::Unsupported(e.to_string()))?,
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::limited(5))
                .build()?,
        })
    }

    fn is_valid_content_type(content_type: &str) -> bool {
        content_type.starts_with("audio/")
            || content_type.starts_with("video/")
            || content_type.starts_with("application/octet-stream")
            || content_type.starts_with("application/ogg")
            || content_type.is_empty()
    }

    /// Builds a track from response headers, falling back to the last path
    /// segment for the title.
    pub fn track_from_headers(url: &str, headers: &HeaderMap) -> Track {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let title = header("icy-name")
            .map(str::to_string)
            .or_else(|| {
                headers
                    .get(CONTENT_DISPOSITION)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.split("filename=").nth(1))
                    .map(|s| s.trim_matches(|c| c == '"' || c == ';' || c == ' ').to_string())
                    .filter(|s| !s.is_empty())
            })
            .or_else(|| {
                url.split('?')
                    .next()
                    .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
                    .filter(|segment| !segment.is_empty() && !segment.contains(':'))
                    .map(|segment| {
                        let decoded = urlencoding::decode(segment)
                            .map(|s| s.into_owned())
                            .unwrap_or_else(|_| segment.to_string());
                        match decoded.rsplit_once('.') {
                            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                            _ => decoded,
                        }
                    })
            })
            .unwrap_or_else(|| "Audio Stream".to_string());

        let artist = header("icy-description").unwrap_or("Unknown Artist");

        Track::new(url, title, artist, 0)
    }
}

#[async_trait]
impl TrackSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn can_handle(&self, query: &Query) -> bool {
        matches!(query, Query::Url(url) if self.url_regex.is_match(url))
    }

    async fn resolve(&self, query: &Query) -> Result<Vec<Track>, CatalogError> {
        let url = query.as_str();
        debug!("Probing HTTP source: {}", url);

        let resp = self.client.head(url).send().await?;
        if !resp.status().is_success() {
            debug!("HEAD {} returned {}", url, resp.status());
            return Err(CatalogError::NotFound(url.to_string()));
        }

        let headers = resp.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !Self::is_valid_content_type(content_type) {
            return Err(CatalogError::Unsupported(format!(
                "{} ({})",
                url, content_type
            )));
        }

        Ok(vec![Self::track_from_headers(url, headers)])
    }
}
