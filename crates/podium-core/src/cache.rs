// Rank-keyed entry cache: the single source of truth for leaderboard rows and
// the maximum known rank.

use std::collections::HashMap;

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::image::ImageHandle;
use crate::page::RankedRecord;
use crate::protocol::CacheEvent;

const EVENT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotRequested,
    Queued,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    /// Queued or loading: the avatar queue already holds this entry.
    pub fn is_pending(self) -> bool {
        matches!(self, LoadState::Queued | LoadState::Loading)
    }
}

/// One ranked participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub rank: u32,
    pub score: i64,
    pub player_name: String,
    pub avatar_url: String,
    pub image: Option<ImageHandle>,
    pub load_state: LoadState,
}

impl Entry {
    fn from_record(record: RankedRecord) -> Self {
        Entry {
            rank: record.rank,
            score: record.score,
            player_name: record.player_name,
            avatar_url: record.avatar_url,
            image: None,
            load_state: LoadState::NotRequested,
        }
    }
}

// ---------------------------------------------------------------------------
// EntryCache
// ---------------------------------------------------------------------------

/// Entries keyed by rank. Record fields are written only through
/// [`EntryCache::upsert`]; the image and load state only by the avatar queue.
#[derive(Debug)]
pub struct EntryCache {
    entries: HashMap<u32, Entry>,
    max_known_rank: u32,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for EntryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        EntryCache {
            entries: HashMap::new(),
            max_known_rank: 0,
            events,
        }
    }

    /// Insert or overwrite the entry at `record.rank`. Returns true when the
    /// maximum known rank increased, in which case `MaxRankChanged` is sent.
    pub fn upsert(&mut self, record: RankedRecord) -> bool {
        let rank = record.rank;
        match self.entries.get_mut(&rank) {
            Some(entry) => {
                entry.score = record.score;
                entry.player_name = record.player_name;
                entry.avatar_url = record.avatar_url;
                trace!(rank, "entry updated");
            }
            None => {
                self.entries.insert(rank, Entry::from_record(record));
                trace!(rank, "entry created");
            }
        }

        if rank > self.max_known_rank {
            self.max_known_rank = rank;
            debug!(max_known_rank = rank, "max known rank raised");
            self.notify(CacheEvent::MaxRankChanged(rank));
            true
        } else {
            false
        }
    }

    pub fn get(&self, rank: u32) -> Option<&Entry> {
        self.entries.get(&rank)
    }

    /// 0 until the first valid record arrives.
    pub fn max_known_rank(&self) -> u32 {
        self.max_known_rank
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Receive every cache event from now on. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Receive only the image events of `rank`.
    pub fn watch(&self, rank: u32) -> EntryWatch {
        EntryWatch {
            rank,
            rx: self.events.subscribe(),
        }
    }

    pub(crate) fn notify(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn set_load_state(&mut self, rank: u32, state: LoadState) {
        if let Some(entry) = self.entries.get_mut(&rank) {
            entry.load_state = state;
        }
    }

    /// Store the outcome of an avatar job: image and `Loaded` together, or
    /// `Failed` with no image.
    pub(crate) fn finish_image(&mut self, rank: u32, image: Option<ImageHandle>) {
        let Some(entry) = self.entries.get_mut(&rank) else {
            return;
        };
        match image {
            Some(handle) => {
                entry.image = Some(handle);
                entry.load_state = LoadState::Loaded;
                self.notify(CacheEvent::ImageReady { rank });
            }
            None => {
                entry.load_state = LoadState::Failed;
                self.notify(CacheEvent::ImageFailed { rank });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EntryWatch
// ---------------------------------------------------------------------------

/// Subscription scoped to one rank's image events. Dropping it unsubscribes.
#[derive(Debug)]
pub struct EntryWatch {
    rank: u32,
    rx: broadcast::Receiver<CacheEvent>,
}

impl EntryWatch {
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Wait for the next event about this rank. `None` once the cache is
    /// gone.
    pub async fn changed(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.rank() == Some(self.rank) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(rank = self.rank, skipped, "entry watch lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking form of [`EntryWatch::changed`], for per-frame polling.
    pub fn try_changed(&mut self) -> Option<CacheEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.rank() == Some(self.rank) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(rank = self.rank, skipped, "entry watch lagged");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(rank: u32, score: i64, name: &str) -> RankedRecord {
        RankedRecord {
            rank,
            score,
            player_name: name.to_string(),
            avatar_url: format!("http://avatars/{rank}.svg"),
        }
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut once = EntryCache::new();
        once.upsert(rec(4, 100, "Ada"));

        let mut twice = EntryCache::new();
        twice.upsert(rec(4, 100, "Ada"));
        twice.upsert(rec(4, 100, "Ada"));

        assert_eq!(once.len(), twice.len());
        assert_eq!(once.get(4), twice.get(4));
        assert_eq!(once.max_known_rank(), twice.max_known_rank());
    }

    #[test]
    fn upsert_overwrites_fields_and_keeps_image_state() {
        let mut cache = EntryCache::new();
        cache.upsert(rec(2, 10, "Old"));
        cache.finish_image(2, Some(ImageHandle::new(None, 3)));

        cache.upsert(rec(2, 20, "New"));
        let entry = cache.get(2).unwrap();
        assert_eq!(entry.score, 20);
        assert_eq!(entry.player_name, "New");
        assert_eq!(entry.load_state, LoadState::Loaded);
        assert!(entry.image.is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn max_rank_is_monotonic_and_notifies_only_on_increase() {
        let mut cache = EntryCache::new();
        let mut rx = cache.subscribe();

        let mut seen_max = 0;
        for rank in [3, 1, 7, 7, 5, 9, 2] {
            let raised = cache.upsert(rec(rank, 1, "p"));
            assert_eq!(raised, rank > seen_max);
            seen_max = seen_max.max(rank);
            assert_eq!(cache.max_known_rank(), seen_max);
        }

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                CacheEvent::MaxRankChanged(3),
                CacheEvent::MaxRankChanged(7),
                CacheEvent::MaxRankChanged(9),
            ]
        );
    }

    #[test]
    fn finish_image_failure_sets_failed_without_image() {
        let mut cache = EntryCache::new();
        cache.upsert(rec(1, 5, "a"));
        cache.set_load_state(1, LoadState::Loading);
        cache.finish_image(1, None);
        let entry = cache.get(1).unwrap();
        assert_eq!(entry.load_state, LoadState::Failed);
        assert!(entry.image.is_none());
    }

    #[test]
    fn watch_filters_by_rank() {
        let mut cache = EntryCache::new();
        cache.upsert(rec(1, 5, "a"));
        cache.upsert(rec(2, 5, "b"));
        let mut watch = cache.watch(2);

        cache.finish_image(1, Some(ImageHandle::new(None, 1)));
        cache.upsert(rec(3, 5, "c"));
        assert_eq!(watch.try_changed(), None);

        cache.finish_image(2, None);
        assert_eq!(watch.try_changed(), Some(CacheEvent::ImageFailed { rank: 2 }));
        assert_eq!(watch.try_changed(), None);
    }

    #[tokio::test]
    async fn watch_ends_when_cache_dropped() {
        let cache = EntryCache::new();
        let mut watch = cache.watch(1);
        drop(cache);
        assert_eq!(watch.changed().await, None);
    }
}
