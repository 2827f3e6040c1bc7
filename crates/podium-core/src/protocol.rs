// Messages exchanged between the background loaders, the leaderboard owner,
// and observers.

use crate::error::LoadError;
use crate::image::ImageHandle;
use crate::page::RankedRecord;

/// Progress reported by the page fetcher task.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// A page decoded; `records` holds only the valid ones.
    PageLoaded {
        page: u32,
        page_count: u32,
        records: Vec<RankedRecord>,
    },
    /// A page exhausted its retry budget and was skipped.
    PageFailed { page: u32, error: LoadError },
    /// Sent once, after the last page was attempted.
    Complete { pages_loaded: u32, pages_failed: u32 },
}

/// Outcome of the single in-flight avatar job.
#[derive(Debug, Clone, PartialEq)]
pub enum AvatarEvent {
    Finished {
        rank: u32,
        result: Result<ImageHandle, LoadError>,
    },
}

/// Changes observers may subscribe to.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    MaxRankChanged(u32),
    ImageReady { rank: u32 },
    ImageFailed { rank: u32 },
    LoadComplete { pages_loaded: u32, pages_failed: u32 },
}

impl CacheEvent {
    /// Rank this event concerns, if it is per-entry.
    pub fn rank(&self) -> Option<u32> {
        match self {
            CacheEvent::ImageReady { rank } | CacheEvent::ImageFailed { rank } => Some(*rank),
            _ => None,
        }
    }
}
