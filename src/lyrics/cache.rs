use std::sync::Arc;

use dashmap::DashMap;
use tokio::{
    task::JoinHandle,
    time::{Duration, Instant},
};
use tracing::{debug, info};

use crate::{common::title::clean_title, protocol::tracks::Track};

/// Lower-cased `(artist, clean title)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LyricsKey {
    pub artist: String,
    pub title: String,
}

impl LyricsKey {
    /// Cleans `title` against `artist`, then lower-cases both.
    pub fn new(artist: &str, title: &str) -> Self {
        Self {
            artist: artist.trim().to_lowercase(),
            title: clean_title(title, artist).to_lowercase(),
        }
    }

    pub fn for_track(track: &Track) -> Self {
        Self::new(&track.artist, &track.title)
    }
}

impl std::fmt::Display for LyricsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.artist, self.title)
    }
}

struct CachedLyrics {
    text: String,
    inserted_at: Instant,
}

/// Lyrics texts that expire a fixed time after insertion.
///
/// Expired entries are dropped when read and by [`LyricsCache::sweep`].
/// Nothing here touches the network.
pub struct LyricsCache {
    ttl: Duration,
    entries: DashMap<LyricsKey, CachedLyrics>,
}

impl LyricsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, inserted_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(inserted_at) >= self.ttl
    }

    pub fn get(&self, key: &LyricsKey) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &LyricsKey, now: Instant) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            if !self.is_expired(entry.inserted_at, now) {
                return Some(entry.text.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| self.is_expired(entry.inserted_at, now));
        None
    }

    pub fn put(&self, key: LyricsKey, text: String) {
        self.put_at(key, text, Instant::now());
    }

    pub fn put_at(&self, key: LyricsKey, text: String, now: Instant) {
        self.entries.insert(
            key,
            CachedLyrics {
                text,
                inserted_at: now,
            },
        );
    }

    /// Drops every expired entry and returns how many went.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !self.is_expired(entry.inserted_at, now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            info!("Cleaned up {} expired lyrics cache entries", removed);
        }
        removed
    }

    /// Sweeps every `interval` until the returned task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("lyrics cache dropped, sweeper exiting");
                    break;
                };
                cache.sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_normalised() {
        let a = LyricsKey::new("Daft Punk", "Daft Punk - Get Lucky (Radio Edit)");
        let b = LyricsKey::new("daft punk ", "GET LUCKY");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "daft punk:get lucky");
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = LyricsCache::new(Duration::from_secs(3600));
        let key = LyricsKey::new("Queen", "Bohemian Rhapsody");
        let start = Instant::now();

        cache.put_at(key.clone(), "Is this the real life?".into(), start);
        assert_eq!(
            cache.get_at(&key, start + Duration::from_secs(3599)).as_deref(),
            Some("Is this the real life?")
        );
        assert_eq!(cache.get_at(&key, start + Duration::from_secs(3600)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_refreshes_insertion_time() {
        let cache = LyricsCache::new(Duration::from_secs(10));
        let key = LyricsKey::new("A", "B");
        let start = Instant::now();

        cache.put_at(key.clone(), "old".into(), start);
        cache.put_at(key.clone(), "new".into(), start + Duration::from_secs(8));
        assert_eq!(
            cache.get_at(&key, start + Duration::from_secs(15)).as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let cache = LyricsCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.put_at(LyricsKey::new("A", "old"), "x".into(), start);
        cache.put_at(
            LyricsKey::new("A", "fresh"),
            "y".into(),
            start + Duration::from_secs(50),
        );

        assert_eq!(cache.sweep_at(start + Duration::from_secs(70)), 1);
        assert_eq!(cache.len(), 1);
        assert!(
            cache
                .get_at(&LyricsKey::new("A", "fresh"), start + Duration::from_secs(70))
                .is_some()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_periodically() {
        let cache = Arc::new(LyricsCache::new(Duration::from_secs(30)));
        cache.put(LyricsKey::new("A", "B"), "text".into());
        let sweeper = cache.spawn_sweeper(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(cache.is_empty());
        sweeper.abort();
    }
}
