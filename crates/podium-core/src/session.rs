// Session wiring: builds the leaderboard, spawns the fetcher, and funnels both
// background event streams into the single owner.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::avatar::{AvatarLoadQueue, AvatarLoader};
use crate::config::Config;
use crate::fetcher::PaginatedFetcher;
use crate::image::ImageBuilder;
use crate::leaderboard::Leaderboard;
use crate::protocol::{AvatarEvent, FetchEvent};
use crate::retry::RetryPolicy;
use crate::transport::Transport;

const FETCH_CHANNEL: usize = 32;
const AVATAR_CHANNEL: usize = 8;

/// Anything a background task reported.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Fetch(FetchEvent),
    Avatar(AvatarEvent),
}

pub struct Session {
    board: Leaderboard,
    fetch_rx: mpsc::Receiver<FetchEvent>,
    avatar_rx: mpsc::Receiver<AvatarEvent>,
    fetch_open: bool,
    fetch_task: JoinHandle<()>,
}

impl Session {
    /// Start loading. Must be called from within a tokio runtime.
    pub fn start(
        config: &Config,
        transport: Arc<dyn Transport>,
        builder: Arc<dyn ImageBuilder>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);

        let (avatar_tx, avatar_rx) = mpsc::channel(AVATAR_CHANNEL);
        let loader = AvatarLoader::new(transport.clone(), builder, retry);
        let board = Leaderboard::new(AvatarLoadQueue::new(loader, avatar_tx));

        let (fetch_tx, fetch_rx) = mpsc::channel(FETCH_CHANNEL);
        let fetcher = PaginatedFetcher::new(transport, config.source.base_url.clone(), retry, fetch_tx);
        let fetch_task = tokio::spawn(fetcher.run());

        info!(
            base_url = %config.source.base_url,
            max_attempts = retry.max_failed_attempts,
            "session started"
        );

        Self {
            board,
            fetch_rx,
            avatar_rx,
            fetch_open: true,
            fetch_task,
        }
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Leaderboard {
        &mut self.board
    }

    /// Next event from the fetcher or the in-flight avatar job. Pends
    /// indefinitely once the fetcher is done and no avatar job is running.
    pub async fn recv(&mut self) -> SessionEvent {
        loop {
            tokio::select! {
                event = self.fetch_rx.recv(), if self.fetch_open => match event {
                    Some(event) => return SessionEvent::Fetch(event),
                    None => self.fetch_open = false,
                },
                Some(event) = self.avatar_rx.recv() => return SessionEvent::Avatar(event),
                else => std::future::pending::<()>().await,
            }
        }
    }

    /// Merge an event into the leaderboard.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Fetch(event) => self.board.apply_fetch_event(event),
            SessionEvent::Avatar(event) => self.board.apply_avatar_event(event),
        }
    }

    /// Stop the fetcher. A running avatar job ends with the runtime.
    pub fn shutdown(self) {
        self.fetch_task.abort();
    }
}
