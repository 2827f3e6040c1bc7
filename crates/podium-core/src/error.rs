// Error types shared by the network consumers.

use thiserror::Error;

/// Failure of a single load operation (page fetch or avatar download).
///
/// Everything except `RetriesExhausted` is retried locally by
/// [`crate::retry::RetryPolicy`]; `RetriesExhausted` is terminal and is
/// turned into a permanent state change by the caller, never propagated
/// further.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Connection or protocol level failure (including non-2xx status).
    #[error("transport error: {0}")]
    Transport(String),

    /// Payload could not be decoded, even after best-effort repair.
    #[error("decode error: {0}")]
    Decode(String),

    /// The image-build collaborator rejected the downloaded bytes.
    #[error("image build error: {0}")]
    Build(String),

    /// The retry budget ran out; wraps the last underlying error.
    #[error("gave up after {attempts} failed attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<LoadError> },
}

impl LoadError {
    /// Short, stable name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Transport(_) => "transport",
            LoadError::Decode(_) => "decode",
            LoadError::Build(_) => "build",
            LoadError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// The innermost non-exhaustion error.
    pub fn root(&self) -> &LoadError {
        match self {
            LoadError::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }
}
