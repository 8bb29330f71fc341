use async_trait::async_trait;
use serde::Deserialize;

use super::LyricsProvider;
use crate::common::LyricsError;

const SEARCH_URL: &str = "https://lrclib.net/api/search";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrcLibRecord {
    #[serde(default)]
    synced_lyrics: Option<String>,
    #[serde(default)]
    plain_lyrics: Option<String>,
    #[serde(default)]
    instrumental: bool,
}

pub struct LrcLibProvider {
    client: reqwest::Client,
    search_results: usize,
}

impl LrcLibProvider {
    pub fn new(search_results: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_results: search_results.max(1),
        }
    }

    /// First usable text among the top hits, synced lyrics preferred per hit.
    fn pick(&self, records: &[LrcLibRecord]) -> Option<String> {
        records
            .iter()
            .take(self.search_results)
            .filter(|r| !r.instrumental)
            .find_map(|r| {
                [r.synced_lyrics.as_deref(), r.plain_lyrics.as_deref()]
                    .into_iter()
                    .flatten()
                    .find(|text| !text.trim().is_empty())
                    .map(str::to_string)
            })
    }
}

#[async_trait]
impl LyricsProvider for LrcLibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn fetch(&self, artist: &str, title: &str) -> Result<String, LyricsError> {
        let query = format!("{} {}", artist, title);
        tracing::debug!("Searching lrclib with query: {}", query);
        let url = format!("{}?q={}", SEARCH_URL, urlencoding::encode(&query));

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(LyricsError::Status(resp.status().as_u16()));
        }

        let records: Vec<LrcLibRecord> = resp.json().await?;
        self.pick(&records).ok_or_else(|| LyricsError::NotFound {
            artist: artist.to_string(),
            title: title.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(json: &str) -> Vec<LrcLibRecord> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_prefers_synced_lyrics() {
        let provider = LrcLibProvider::new(3);
        let hits = records(
            r#"[{"syncedLyrics": "[00:01.00] hello", "plainLyrics": "hello", "trackName": "x"}]"#,
        );
        assert_eq!(provider.pick(&hits).as_deref(), Some("[00:01.00] hello"));
    }

    #[test]
    fn test_falls_through_empty_hits() {
        let provider = LrcLibProvider::new(3);
        let hits = records(
            r#"[
                {"syncedLyrics": null, "plainLyrics": null},
                {"instrumental": true, "plainLyrics": "[instrumental]"},
                {"syncedLyrics": "", "plainLyrics": "plain words"}
            ]"#,
        );
        assert_eq!(provider.pick(&hits).as_deref(), Some("plain words"));
    }

    #[test]
    fn test_only_top_hits_are_considered() {
        let provider = LrcLibProvider::new(1);
        let hits = records(r#"[{"plainLyrics": null}, {"plainLyrics": "too far down"}]"#);
        assert_eq!(provider.pick(&hits), None);
    }
}
