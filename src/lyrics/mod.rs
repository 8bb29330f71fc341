use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Duration;

use crate::{
    common::{LyricsError, title::clean_title},
    configs::Config,
    protocol::tracks::Track,
};

pub mod cache;
pub mod lrclib;

pub use cache::{LyricsCache, LyricsKey};
use lrclib::LrcLibProvider;

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Looks up lyrics over the network. Only called on a cache miss.
    async fn fetch(&self, artist: &str, title: &str) -> Result<String, LyricsError>;
}

/// Cache-first lyrics lookup over the enabled providers.
pub struct LyricsService {
    pub providers: Vec<Arc<dyn LyricsProvider>>,
    cache: Arc<LyricsCache>,
}

impl LyricsService {
    pub fn new(config: &Config) -> Self {
        let mut providers: Vec<Arc<dyn LyricsProvider>> = Vec::new();

        macro_rules! register_provider {
            ($enabled:expr, $name:literal, $ctor:expr) => {
                if $enabled {
                    providers.push(Arc::new($ctor));
                    tracing::info!("Loaded lyrics provider: {}", $name);
                }
            };
        }

        register_provider!(
            config.lyrics.lrclib,
            "LRCLib",
            LrcLibProvider::new(config.lyrics.search_results)
        );

        Self::with_providers(Duration::from_secs(config.lyrics.ttl_secs), providers)
    }

    pub fn with_providers(ttl: Duration, providers: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self {
            providers,
            cache: Arc::new(LyricsCache::new(ttl)),
        }
    }

    pub fn cache(&self) -> &Arc<LyricsCache> {
        &self.cache
    }

    /// Lyrics for a track, or `None` when it has no artist or title.
    pub async fn lyrics_for(&self, track: &Track) -> Option<String> {
        let title = if track.clean_title.is_empty() {
            &track.title
        } else {
            &track.clean_title
        };
        if track.artist.trim().is_empty() || title.trim().is_empty() {
            return None;
        }
        self.lyrics(&track.artist, title).await
    }

    pub async fn lyrics(&self, artist: &str, title: &str) -> Option<String> {
        let key = LyricsKey::new(artist, title);
        if let Some(text) = self.cache.get(&key) {
            tracing::info!("Cache hit for lyrics: {}", key);
            return Some(text);
        }

        let clean = clean_title(title, artist);
        let mut futures = FuturesUnordered::new();
        for provider in &self.providers {
            let provider = provider.clone();
            let artist = artist.to_string();
            let title = clean.clone();
            futures.push(async move {
                let result = provider.fetch(&artist, &title).await;
                (provider.name(), result)
            });
        }

        while let Some((name, result)) = futures.next().await {
            match result {
                Ok(text) => {
                    tracing::info!("Found lyrics for {} via {}", key, name);
                    self.cache.put(key, text.clone());
                    return Some(text);
                }
                Err(e) => tracing::debug!("{} has no lyrics for {}: {}", name, key, e),
            }
        }

        tracing::info!("No lyrics found for {}", key);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        text: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LyricsProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, artist: &str, title: &str) -> Result<String, LyricsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text.map(str::to_string).ok_or_else(|| LyricsError::NotFound {
                artist: artist.to_string(),
                title: title.to_string(),
            })
        }
    }

    fn service(text: Option<&'static str>) -> (LyricsService, Arc<FixedProvider>) {
        let provider = Arc::new(FixedProvider {
            text,
            calls: AtomicUsize::new(0),
        });
        let providers: Vec<Arc<dyn LyricsProvider>> = vec![provider.clone()];
        let service = LyricsService::with_providers(Duration::from_secs(3600), providers);
        (service, provider)
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let (service, provider) = service(Some("la la la"));

        assert_eq!(service.lyrics("Artist", "Song").await.as_deref(), Some("la la la"));
        assert_eq!(
            service.lyrics("ARTIST", "Artist - Song (Live)").await.as_deref(),
            Some("la la la")
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let (service, provider) = service(None);

        assert_eq!(service.lyrics("Artist", "Song").await, None);
        assert_eq!(service.lyrics("Artist", "Song").await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_track_without_artist_is_skipped() {
        let (service, provider) = service(Some("words"));
        let track = Track::new("https://example.com/a.mp3", "Song", "", 100);

        assert_eq!(service.lyrics_for(&track).await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refetched() {
        let (service, provider) = service(Some("words"));
        service
            .cache()
            .put(LyricsKey::new("Artist", "Song"), "stale".into());

        tokio::time::advance(Duration::from_secs(3601)).await;
        assert_eq!(service.lyrics("Artist", "Song").await.as_deref(), Some("words"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
