// Sequential page fetcher. Runs as its own task and reports each page over a
// channel; the leaderboard owner merges the records.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::page::{decode_page, page_url, Page};
use crate::protocol::FetchEvent;
use crate::retry::RetryPolicy;
use crate::transport::Transport;

pub struct PaginatedFetcher {
    transport: Arc<dyn Transport>,
    base_url: String,
    retry: RetryPolicy,
    tx: mpsc::Sender<FetchEvent>,
}

impl PaginatedFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
        tx: mpsc::Sender<FetchEvent>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            retry,
            tx,
        }
    }

    /// Fetch page 1, then pages `2..=page_count` one at a time. A page that
    /// exhausts its retries is reported and skipped. `Complete` is sent
    /// exactly once at the end. Returns early if the receiver is gone.
    pub async fn run(self) {
        let mut pages_loaded = 0u32;
        let mut pages_failed = 0u32;

        // Page 1 decides how many pages there are. If it fails, that is the
        // only page attempted.
        let page_count = match self.fetch_page(1).await {
            Ok(page) => {
                let page_count = page.page_count();
                pages_loaded += 1;
                if !self.report_loaded(1, page_count, page).await {
                    return;
                }
                page_count
            }
            Err(error) => {
                pages_failed += 1;
                if !self.report_failed(1, error).await {
                    return;
                }
                1
            }
        };

        for page_number in 2..=page_count {
            let delivered = match self.fetch_page(page_number).await {
                Ok(page) => {
                    pages_loaded += 1;
                    self.report_loaded(page_number, page_count, page).await
                }
                Err(error) => {
                    pages_failed += 1;
                    self.report_failed(page_number, error).await
                }
            };
            if !delivered {
                return;
            }
        }

        info!(pages_loaded, pages_failed, "load sequence complete");
        let _ = self
            .tx
            .send(FetchEvent::Complete {
                pages_loaded,
                pages_failed,
            })
            .await;
    }

    /// Download and decode one page. Decoding is part of the retried
    /// operation.
    async fn fetch_page(&self, page_number: u32) -> Result<Page, LoadError> {
        let url = page_url(&self.base_url, page_number);
        let transport = &self.transport;
        let url = url.as_str();
        self.retry
            .execute("page", || async move {
                let body = transport.get(url).await?;
                decode_page(&body)
            })
            .await
    }

    async fn report_loaded(&self, page: u32, page_count: u32, body: Page) -> bool {
        let records = body.into_valid_records(page);
        info!(page, page_count, records = records.len(), "page loaded");
        self.tx
            .send(FetchEvent::PageLoaded {
                page,
                page_count,
                records,
            })
            .await
            .is_ok()
    }

    async fn report_failed(&self, page: u32, error: LoadError) -> bool {
        warn!(page, error = %error, "page skipped; its ranks stay missing this session");
        self.tx
            .send(FetchEvent::PageFailed { page, error })
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use std::time::Duration;

    fn page_body(page: u32, page_count: u32, ranks: &[u32]) -> String {
        let records: Vec<String> = ranks
            .iter()
            .map(|r| {
                format!(
                    r#"{{"rank": {r}, "score": {}, "player_name": "p{r}", "avatar_url": "http://a/{r}.svg"}}"#,
                    1000 - r
                )
            })
            .collect();
        format!(
            r#"{{"_metadata": {{"page": {page}, "page_count": {page_count}}}, "records": [{}]}}"#,
            records.join(",")
        )
    }

    async fn collect(fetcher: PaginatedFetcher, mut rx: mpsc::Receiver<FetchEvent>) -> Vec<FetchEvent> {
        fetcher.run().await;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn policy(max: u32) -> RetryPolicy {
        RetryPolicy::new(max, Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn page_count_from_first_page_bounds_the_run() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond("http://lb?page=1", page_body(1, 3, &[1, 2]));
        transport.respond("http://lb?page=2", page_body(2, 3, &[3, 4]));
        // Later metadata is ignored.
        transport.respond("http://lb?page=3", page_body(3, 9, &[5]));

        let (tx, rx) = mpsc::channel(16);
        let fetcher = PaginatedFetcher::new(transport.clone(), "http://lb", policy(3), tx);
        let events = collect(fetcher, rx).await;

        assert_eq!(
            transport.requests(),
            vec!["http://lb?page=1", "http://lb?page=2", "http://lb?page=3"]
        );
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0],
            FetchEvent::PageLoaded { page: 1, page_count: 3, records } if records.len() == 2
        ));
        assert_eq!(
            events[3],
            FetchEvent::Complete {
                pages_loaded: 3,
                pages_failed: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn decode_failure_is_retried_like_transport_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond("http://lb?page=1", "{ not json");
        transport.respond("http://lb?page=1", page_body(1, 1, &[1]));

        let (tx, rx) = mpsc::channel(16);
        let fetcher = PaginatedFetcher::new(transport.clone(), "http://lb", policy(3), tx);
        let events = collect(fetcher, rx).await;

        assert_eq!(transport.requests().len(), 2);
        assert!(matches!(events[0], FetchEvent::PageLoaded { page: 1, .. }));
        assert_eq!(
            events[1],
            FetchEvent::Complete {
                pages_loaded: 1,
                pages_failed: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_page_leaves_gap_and_continues() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond("http://lb?page=1", page_body(1, 3, &[1, 2]));
        // page 2 has no scripted response: every attempt is a transport error
        transport.respond("http://lb?page=3", page_body(3, 3, &[5, 6]));

        let (tx, rx) = mpsc::channel(16);
        let fetcher = PaginatedFetcher::new(transport.clone(), "http://lb", policy(2), tx);
        let events = collect(fetcher, rx).await;

        let page2_attempts = transport
            .requests()
            .iter()
            .filter(|u| u.ends_with("page=2"))
            .count();
        assert_eq!(page2_attempts, 2);
        assert!(matches!(
            &events[1],
            FetchEvent::PageFailed { page: 2, error: LoadError::RetriesExhausted { attempts: 2, .. } }
        ));
        assert!(matches!(events[2], FetchEvent::PageLoaded { page: 3, .. }));
        assert_eq!(
            events[3],
            FetchEvent::Complete {
                pages_loaded: 2,
                pages_failed: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_metadata_fetches_single_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "http://lb?page=1",
            r#"{"records": [{"rank": 1, "score": 5, "player_name": "a", "avatar_url": "u"},]}"#,
        );

        let (tx, rx) = mpsc::channel(16);
        let fetcher = PaginatedFetcher::new(transport.clone(), "http://lb", policy(3), tx);
        let events = collect(fetcher, rx).await;

        assert_eq!(transport.requests(), vec!["http://lb?page=1"]);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_first_page_completes_without_more_fetches() {
        let transport = Arc::new(ScriptedTransport::new());
        let (tx, rx) = mpsc::channel(16);
        let fetcher = PaginatedFetcher::new(transport.clone(), "http://lb", policy(2), tx);
        let events = collect(fetcher, rx).await;

        assert_eq!(transport.requests().len(), 2);
        assert_eq!(
            events.last(),
            Some(&FetchEvent::Complete {
                pages_loaded: 0,
                pages_failed: 1
            })
        );
    }
}
