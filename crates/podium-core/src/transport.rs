// HTTP transport shared by the page fetcher and the avatar queue.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LoadError;

/// Fetch the raw body at a URL. One implementation talks HTTP; tests use
/// in-memory fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Transport(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Transport(format!("GET {url} failed ({status})")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LoadError::Transport(format!("reading body of {url} failed: {e}")))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(Duration::from_millis(200)).expect("client");
        let err = transport.get("http://127.0.0.1:1/leaderboard?page=1").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
