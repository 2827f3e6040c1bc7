// In-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LoadError;
use crate::transport::Transport;

/// Replies from a per-URL script. Scripted replies are served in order and
/// the last one repeats; an unscripted URL is a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Result<Vec<u8>, String>>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.push(url, Ok(body.into()));
    }

    /// Script a transport error for the next request of `url`.
    pub fn fail(&self, url: &str) {
        self.push(url, Err(format!("connection reset: {url}")));
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, url: &str, reply: Result<Vec<u8>, String>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(url)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| LoadError::Transport(format!("connection refused: {url}")))?;
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match reply {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(LoadError::Transport(message)),
            None => Ok(Vec::new()),
        }
    }
}
