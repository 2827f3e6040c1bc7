// Leaderboard aggregate: the entry cache, the avatar queue, and load
// progress, owned by one task and mutated only through event application.

use chrono::{DateTime, Local};
use tokio::sync::broadcast;
use tracing::info;

use crate::avatar::AvatarLoadQueue;
use crate::cache::{EntryCache, EntryWatch};
use crate::protocol::{AvatarEvent, CacheEvent, FetchEvent};

/// Page-level progress of the load sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadProgress {
    /// Known after page 1 answers; 0 before.
    pub page_count: u32,
    pub pages_loaded: u32,
    pub pages_failed: u32,
    pub completed_at: Option<DateTime<Local>>,
}

impl LoadProgress {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

pub struct Leaderboard {
    cache: EntryCache,
    avatars: AvatarLoadQueue,
    progress: LoadProgress,
}

impl Leaderboard {
    pub fn new(avatars: AvatarLoadQueue) -> Self {
        Self {
            cache: EntryCache::new(),
            avatars,
            progress: LoadProgress::default(),
        }
    }

    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    pub fn progress(&self) -> &LoadProgress {
        &self.progress
    }

    pub fn avatar_queue_len(&self) -> usize {
        self.avatars.queue_len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    pub fn watch(&self, rank: u32) -> EntryWatch {
        self.cache.watch(rank)
    }

    /// Ask for the avatar of a visible entry.
    pub fn request_avatar(&mut self, rank: u32) -> bool {
        self.avatars.request(&mut self.cache, rank)
    }

    pub fn apply_fetch_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::PageLoaded {
                page,
                page_count,
                records,
            } => {
                if page == 1 {
                    self.progress.page_count = page_count;
                }
                self.progress.pages_loaded += 1;
                for record in records {
                    self.cache.upsert(record);
                }
            }
            FetchEvent::PageFailed { page, .. } => {
                if page == 1 {
                    self.progress.page_count = 1;
                }
                self.progress.pages_failed += 1;
            }
            FetchEvent::Complete {
                pages_loaded,
                pages_failed,
            } => {
                self.progress.completed_at = Some(Local::now());
                info!(
                    pages_loaded,
                    pages_failed,
                    entries = self.cache.len(),
                    max_known_rank = self.cache.max_known_rank(),
                    "leaderboard load finished"
                );
                self.cache.notify(CacheEvent::LoadComplete {
                    pages_loaded,
                    pages_failed,
                });
            }
        }
    }

    pub fn apply_avatar_event(&mut self, event: AvatarEvent) {
        self.avatars.complete(&mut self.cache, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::AvatarLoader;
    use crate::error::LoadError;
    use crate::image::SvgHeaderProbe;
    use crate::page::RankedRecord;
    use crate::retry::RetryPolicy;
    use crate::test_support::ScriptedTransport;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn board() -> (Leaderboard, mpsc::Receiver<AvatarEvent>) {
        let (tx, rx) = mpsc::channel(4);
        let loader = AvatarLoader::new(
            Arc::new(ScriptedTransport::new()),
            Arc::new(SvgHeaderProbe),
            RetryPolicy::new(1, Duration::from_secs(1)),
        );
        (Leaderboard::new(AvatarLoadQueue::new(loader, tx)), rx)
    }

    fn rec(rank: u32) -> RankedRecord {
        RankedRecord {
            rank,
            score: 10,
            player_name: format!("p{rank}"),
            avatar_url: format!("http://a/{rank}"),
        }
    }

    #[test]
    fn fetch_events_update_cache_and_progress() {
        let (mut board, _rx) = board();
        let mut events = board.subscribe();

        board.apply_fetch_event(FetchEvent::PageLoaded {
            page: 1,
            page_count: 3,
            records: vec![rec(1), rec(2)],
        });
        board.apply_fetch_event(FetchEvent::PageFailed {
            page: 2,
            error: LoadError::Transport("down".into()),
        });
        board.apply_fetch_event(FetchEvent::PageLoaded {
            page: 3,
            page_count: 3,
            records: vec![rec(5)],
        });
        assert!(!board.progress().is_complete());
        board.apply_fetch_event(FetchEvent::Complete {
            pages_loaded: 2,
            pages_failed: 1,
        });

        let progress = board.progress();
        assert_eq!(progress.page_count, 3);
        assert_eq!(progress.pages_loaded, 2);
        assert_eq!(progress.pages_failed, 1);
        assert!(progress.is_complete());
        assert_eq!(board.cache().max_known_rank(), 5);
        assert!(board.cache().get(3).is_none());

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                CacheEvent::MaxRankChanged(1),
                CacheEvent::MaxRankChanged(2),
                CacheEvent::MaxRankChanged(5),
                CacheEvent::LoadComplete {
                    pages_loaded: 2,
                    pages_failed: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn avatar_round_trip_through_board() {
        let (mut board, mut rx) = board();
        board.apply_fetch_event(FetchEvent::PageLoaded {
            page: 1,
            page_count: 1,
            records: vec![rec(1)],
        });

        assert!(board.request_avatar(1));
        assert_eq!(board.avatar_queue_len(), 1);
        let event = rx.recv().await.unwrap();
        board.apply_avatar_event(event);
        assert_eq!(board.avatar_queue_len(), 0);
        // unscripted URL with a single-attempt budget
        assert_eq!(
            board.cache().get(1).unwrap().load_state,
            crate::cache::LoadState::Failed
        );
    }
}
