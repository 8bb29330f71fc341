use std::collections::{HashSet, VecDeque};

use rand::{Rng, seq::SliceRandom};
use tokio::time::{Duration, Instant};

use crate::{
    common::{PlaybackError, PlaybackResult, types::GuildId},
    player::state::{PlaybackState, PlayerSnapshot, Progress, QueuePage, QueuePageEntry},
    protocol::tracks::Track,
};

/// A queued track plus an id that survives shuffling, so unshuffle can tell
/// which entries are still queued.
#[derive(Debug, Clone)]
struct QueueEntry {
    id: u64,
    track: Track,
}

/// Queue, current track and clock of one session.
///
/// Holds no timers and no transport: the owning session drives those and
/// serializes every call into this type.
pub struct PlayerContext {
    pub guild_id: GuildId,
    queue: VecDeque<QueueEntry>,
    /// Pre-shuffle order. `Some` exactly while shuffle is on.
    original_queue: Option<Vec<QueueEntry>>,
    current: Option<Track>,
    state: PlaybackState,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
    next_entry_id: u64,
}

impl PlayerContext {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            queue: VecDeque::new(),
            original_queue: None,
            current: None,
            state: PlaybackState::Idle,
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            next_entry_id: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn is_shuffled(&self) -> bool {
        self.original_queue.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue(&self) -> Vec<Track> {
        self.queue.iter().map(|e| e.track.clone()).collect()
    }

    /// Adds a track and returns the index it landed at. While shuffled the
    /// track goes to a uniformly random slot instead of the tail.
    pub fn enqueue(&mut self, track: Track) -> usize {
        let entry = QueueEntry {
            id: self.next_entry_id,
            track,
        };
        self.next_entry_id += 1;

        if self.is_shuffled() {
            let index = rand::thread_rng().gen_range(0..=self.queue.len());
            self.queue.insert(index, entry);
            index
        } else {
            self.queue.push_back(entry);
            self.queue.len() - 1
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Track> {
        self.queue.remove(index).map(|e| e.track)
    }

    /// Moves the entry at `from` so it ends up at `to` in the shortened queue.
    pub fn move_to(&mut self, from: usize, to: usize) -> PlaybackResult<()> {
        let len = self.queue.len();
        if from >= len || to >= len {
            return Err(PlaybackError::InvalidArgument(format!(
                "cannot move {from} to {to} in a queue of {len}"
            )));
        }
        if let Some(entry) = self.queue.remove(from) {
            self.queue.insert(to, entry);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.original_queue = None;
    }

    /// Flips shuffle mode and returns the new flag.
    ///
    /// Turning it off restores the pre-shuffle order of the entries that are
    /// still queued; entries added while shuffled follow in their current order.
    pub fn toggle_shuffle(&mut self) -> bool {
        match self.original_queue.take() {
            Some(original) => {
                let queued: HashSet<u64> = self.queue.iter().map(|e| e.id).collect();
                let known: HashSet<u64> = original.iter().map(|e| e.id).collect();

                let mut restored: VecDeque<QueueEntry> = original
                    .into_iter()
                    .filter(|e| queued.contains(&e.id))
                    .collect();
                restored.extend(self.queue.drain(..).filter(|e| !known.contains(&e.id)));
                self.queue = restored;
                false
            }
            None => {
                self.original_queue = Some(self.queue.iter().cloned().collect());
                self.queue.make_contiguous().shuffle(&mut rand::thread_rng());
                true
            }
        }
    }

    /// Pops the head of the queue without touching the playback state.
    pub fn pop_next(&mut self) -> Option<Track> {
        self.queue.pop_front().map(|e| e.track)
    }

    /// Makes `track` current and starts its clock.
    pub fn begin(&mut self, track: Track, now: Instant) {
        self.current = Some(track);
        self.state = PlaybackState::Playing;
        self.started_at = Some(now);
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }

    /// Drops the current track and returns to `Idle`.
    pub fn finish(&mut self) -> Option<Track> {
        self.state = PlaybackState::Idle;
        self.started_at = None;
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.current.take()
    }

    pub fn pause(&mut self, now: Instant) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.state = PlaybackState::Paused;
        self.paused_at = Some(now);
        true
    }

    pub fn resume(&mut self, now: Instant) -> bool {
        if self.state != PlaybackState::Paused {
            return false;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
        self.state = PlaybackState::Playing;
        true
    }

    /// Time spent playing the current track, paused spans excluded.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let until = self.paused_at.unwrap_or(now);
        until
            .saturating_duration_since(started_at)
            .saturating_sub(self.paused_total)
    }

    pub fn progress(&self, now: Instant) -> Progress {
        match (&self.current, self.state.is_active()) {
            (Some(track), true) => Progress::new(self.elapsed(now).as_secs(), track.duration_secs),
            _ => Progress::default(),
        }
    }

    pub fn total_duration(&self) -> u64 {
        let queued: u64 = self.queue.iter().map(|e| e.track.duration_secs).sum();
        queued + self.current.as_ref().map_or(0, |t| t.duration_secs)
    }

    pub fn position_of(&self, track: &Track) -> Option<usize> {
        self.queue.iter().position(|e| &e.track == track)
    }

    pub fn queue_page(&self, page: usize, per_page: usize) -> QueuePage {
        let per_page = per_page.max(1);
        let total_tracks = self.queue.len();
        let total_pages = total_tracks.div_ceil(per_page);
        let page = page.min(total_pages).max(1);

        let entries = self
            .queue
            .iter()
            .enumerate()
            .skip((page - 1) * per_page)
            .take(per_page)
            .map(|(i, e)| QueuePageEntry {
                position: i + 1,
                track: e.track.clone(),
            })
            .collect();

        QueuePage {
            page,
            total_pages,
            total_tracks,
            entries,
        }
    }

    pub fn snapshot(&self, now: Instant, connected: bool) -> PlayerSnapshot {
        PlayerSnapshot {
            guild_id: self.guild_id.clone(),
            current: self.current.clone(),
            queue: self.queue(),
            state: self.state,
            shuffled: self.is_shuffled(),
            progress: self.progress(now),
            total_duration_secs: self.total_duration(),
            connected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str) -> Track {
        Track::new(format!("https://example.com/{name}.mp3"), name, "Artist", 180)
    }

    fn titles(ctx: &PlayerContext) -> Vec<String> {
        ctx.queue().into_iter().map(|t| t.title).collect()
    }

    fn context_with(names: &[&str]) -> PlayerContext {
        let mut ctx = PlayerContext::new(GuildId::from(1u64));
        for name in names {
            ctx.enqueue(track(name));
        }
        ctx
    }

    #[test]
    fn test_enqueue_is_fifo_when_unshuffled() {
        let mut ctx = PlayerContext::new(GuildId::from(1u64));
        assert_eq!(ctx.enqueue(track("a")), 0);
        assert_eq!(ctx.enqueue(track("b")), 1);
        assert_eq!(ctx.enqueue(track("c")), 2);
        assert_eq!(ctx.pop_next().map(|t| t.title).as_deref(), Some("a"));
        assert_eq!(titles(&ctx), ["b", "c"]);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut ctx = context_with(&["a", "b"]);
        assert_eq!(ctx.remove_at(2), None);
        assert_eq!(ctx.remove_at(usize::MAX), None);
        assert_eq!(titles(&ctx), ["a", "b"]);
        assert_eq!(ctx.remove_at(0).map(|t| t.title).as_deref(), Some("a"));
        assert_eq!(titles(&ctx), ["b"]);
    }

    #[test]
    fn test_move_to() {
        let mut ctx = context_with(&["a", "b", "c", "d"]);
        ctx.move_to(0, 2).unwrap();
        assert_eq!(titles(&ctx), ["b", "c", "a", "d"]);
        ctx.move_to(3, 0).unwrap();
        assert_eq!(titles(&ctx), ["d", "b", "c", "a"]);
        ctx.move_to(1, 1).unwrap();
        assert_eq!(titles(&ctx), ["d", "b", "c", "a"]);
    }

    #[test]
    fn test_move_out_of_range_is_rejected() {
        let mut ctx = context_with(&["a", "b"]);
        assert!(matches!(
            ctx.move_to(0, 2),
            Err(PlaybackError::InvalidArgument(_))
        ));
        assert!(ctx.move_to(5, 0).is_err());
        assert_eq!(titles(&ctx), ["a", "b"]);
    }

    #[test]
    fn test_shuffle_twice_restores_order() {
        let names: Vec<String> = (0..40).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut ctx = context_with(&refs);
        let before = ctx.queue();

        assert!(ctx.toggle_shuffle());
        assert!(ctx.is_shuffled());
        let mut shuffled = ctx.queue();
        shuffled.sort_by(|a, b| a.title.cmp(&b.title));
        let mut sorted = before.clone();
        sorted.sort_by(|a, b| a.title.cmp(&b.title));
        assert_eq!(shuffled, sorted);

        assert!(!ctx.toggle_shuffle());
        assert!(!ctx.is_shuffled());
        assert_eq!(ctx.queue(), before);
    }

    #[test]
    fn test_unshuffle_keeps_mutations_made_while_shuffled() {
        let mut ctx = context_with(&["a", "b", "c", "d"]);
        ctx.toggle_shuffle();

        let index = ctx.position_of(&track("b")).unwrap();
        ctx.remove_at(index);
        ctx.enqueue(track("e"));
        ctx.pop_next();

        let remaining = ctx.queue();
        ctx.toggle_shuffle();
        let restored = titles(&ctx);

        assert_eq!(restored.len(), remaining.len());
        assert!(!restored.contains(&"b".to_string()));
        let expected_order: Vec<&str> = ["a", "c", "d", "e"]
            .into_iter()
            .filter(|n| restored.iter().any(|r| r == n))
            .collect();
        assert_eq!(restored, expected_order);
    }

    #[test]
    fn test_clear_resets_shuffle() {
        let mut ctx = context_with(&["a", "b"]);
        ctx.toggle_shuffle();
        ctx.clear();
        ctx.clear();
        assert!(ctx.queue_is_empty());
        assert!(!ctx.is_shuffled());
    }

    #[test]
    fn test_shuffled_enqueue_lands_inside_queue() {
        let mut ctx = context_with(&["a", "b", "c"]);
        ctx.toggle_shuffle();
        let index = ctx.enqueue(track("d"));
        assert!(index <= 3);
        assert_eq!(ctx.queue()[index].title, "d");
        assert_eq!(ctx.queue_len(), 4);
    }

    #[test]
    fn test_pause_requires_playing() {
        let now = Instant::now();
        let mut ctx = context_with(&["a"]);
        assert!(!ctx.pause(now));
        assert_eq!(ctx.state(), PlaybackState::Idle);
        assert!(!ctx.resume(now));

        let next = ctx.pop_next().unwrap();
        ctx.begin(next, now);
        assert!(ctx.pause(now));
        assert!(!ctx.pause(now));
        assert_eq!(ctx.state(), PlaybackState::Paused);
        assert!(ctx.resume(now));
        assert_eq!(ctx.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_progress_excludes_paused_time() {
        let start = Instant::now();
        let mut ctx = context_with(&["a"]);
        let next = ctx.pop_next().unwrap();
        ctx.begin(next, start);

        ctx.pause(start + Duration::from_secs(30));
        assert_eq!(ctx.progress(start + Duration::from_secs(90)).elapsed_secs, 30);
        ctx.resume(start + Duration::from_secs(100));
        let progress = ctx.progress(start + Duration::from_secs(120));
        assert_eq!(progress.elapsed_secs, 50);
        assert_eq!(progress.total_secs, 180);
        assert_eq!(progress.percent, 27);
    }

    #[test]
    fn test_progress_clamps_past_the_end() {
        let start = Instant::now();
        let mut ctx = context_with(&["a"]);
        let next = ctx.pop_next().unwrap();
        ctx.begin(next, start);

        let progress = ctx.progress(start + Duration::from_secs(250));
        assert_eq!(progress.elapsed_secs, 180);
        assert_eq!(progress.percent, 100);
    }

    #[test]
    fn test_idle_progress_is_zero() {
        let mut ctx = context_with(&["a"]);
        let next = ctx.pop_next().unwrap();
        ctx.begin(next, Instant::now());
        assert_eq!(ctx.finish().map(|t| t.title).as_deref(), Some("a"));
        assert_eq!(ctx.progress(Instant::now()), Progress::default());
        assert!(ctx.current().is_none());
    }

    #[test]
    fn test_total_duration_counts_current() {
        let mut ctx = context_with(&["a", "b", "c"]);
        assert_eq!(ctx.total_duration(), 540);
        let next = ctx.pop_next().unwrap();
        ctx.begin(next, Instant::now());
        assert_eq!(ctx.total_duration(), 540);
        ctx.finish();
        assert_eq!(ctx.total_duration(), 360);
    }

    #[test]
    fn test_queue_page_clamps() {
        let names: Vec<String> = (1..=23).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let ctx = context_with(&refs);

        let page = ctx.queue_page(3, 10);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_tracks, 23);
        assert_eq!(page.entries.len(), 3);
        assert_eq!(page.entries[0].position, 21);

        assert_eq!(ctx.queue_page(99, 10).page, 3);
        assert_eq!(ctx.queue_page(0, 10).page, 1);
        assert_eq!(ctx.queue_page(0, 10).entries[0].track.title, "t1");
    }

    #[test]
    fn test_queue_page_of_empty_queue() {
        let ctx = PlayerContext::new(GuildId::from(1u64));
        let page = ctx.queue_page(4, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.entries.is_empty());
    }
}
