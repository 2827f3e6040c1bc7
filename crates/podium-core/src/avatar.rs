// Serialized avatar download queue.
//
// Entries are downloaded strictly one at a time in FIFO request order. Only
// the queue head is ever `Loading`; its job runs on a spawned task and
// reports back through `AvatarEvent::Finished`, which the queue owner feeds to
// `complete` to promote the next head.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::{EntryCache, LoadState};
use crate::error::LoadError;
use crate::image::{ImageBuilder, ImageHandle};
use crate::protocol::AvatarEvent;
use crate::retry::RetryPolicy;
use crate::transport::Transport;

/// What a download job needs. Shared by every job the queue starts.
#[derive(Clone)]
pub struct AvatarLoader {
    transport: Arc<dyn Transport>,
    builder: Arc<dyn ImageBuilder>,
    retry: RetryPolicy,
}

impl AvatarLoader {
    pub fn new(
        transport: Arc<dyn Transport>,
        builder: Arc<dyn ImageBuilder>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            builder,
            retry,
        }
    }

    /// Download and build one avatar. A build failure uses up an attempt just
    /// like a failed download.
    pub async fn load(&self, url: &str) -> Result<ImageHandle, LoadError> {
        let transport = &self.transport;
        let builder = &self.builder;
        self.retry
            .execute("avatar", || async move {
                let bytes = transport.get(url).await?;
                builder.build(&bytes)
            })
            .await
    }
}

pub struct AvatarLoadQueue {
    queue: VecDeque<u32>,
    loader: AvatarLoader,
    tx: mpsc::Sender<AvatarEvent>,
}

impl AvatarLoadQueue {
    pub fn new(loader: AvatarLoader, tx: mpsc::Sender<AvatarEvent>) -> Self {
        Self {
            queue: VecDeque::new(),
            loader,
            tx,
        }
    }

    /// Queue the avatar of `rank`. Does nothing when the entry is unknown, has
    /// no avatar URL, already has an image, or is already queued or loading.
    /// Returns true when the entry was queued.
    pub fn request(&mut self, cache: &mut EntryCache, rank: u32) -> bool {
        let Some(entry) = cache.get(rank) else {
            return false;
        };
        if entry.avatar_url.is_empty() || entry.image.is_some() || entry.load_state.is_pending()
        {
            return false;
        }
        // A failed entry is never retried automatically.
        if entry.load_state == LoadState::Failed {
            return false;
        }

        cache.set_load_state(rank, LoadState::Queued);
        self.queue.push_back(rank);
        debug!(rank, depth = self.queue.len(), "avatar queued");

        if self.queue.len() == 1 {
            self.start_head(cache);
        }
        true
    }

    /// Apply the outcome of the in-flight job and start the next one.
    pub fn complete(&mut self, cache: &mut EntryCache, event: AvatarEvent) {
        let AvatarEvent::Finished { rank, result } = event;
        if self.queue.front() != Some(&rank) {
            warn!(rank, head = ?self.queue.front(), "avatar result for a rank that is not in flight");
            return;
        }
        self.queue.pop_front();

        match result {
            Ok(handle) => {
                info!(rank, bytes = handle.byte_len(), "avatar loaded");
                cache.finish_image(rank, Some(handle));
            }
            Err(error) => {
                warn!(rank, error = %error, "avatar failed; showing placeholder");
                cache.finish_image(rank, None);
            }
        }

        if !self.queue.is_empty() {
            self.start_head(cache);
        }
    }

    /// Entries waiting, including the one in flight.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight(&self) -> Option<u32> {
        self.queue.front().copied()
    }

    fn start_head(&mut self, cache: &mut EntryCache) {
        let Some(&rank) = self.queue.front() else {
            return;
        };
        let url = cache
            .get(rank)
            .map(|entry| entry.avatar_url.clone())
            .unwrap_or_default();
        cache.set_load_state(rank, LoadState::Loading);
        debug!(rank, url = %url, "avatar download started");

        let loader = self.loader.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&url).await;
            let _ = tx.send(AvatarEvent::Finished { rank, result }).await;
        });
    }
}
