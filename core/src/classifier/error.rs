//! Failures of the remote classifier
//!
//! None of these reach the executor: [`RemoteClassifier`](super::RemoteClassifier)
//! retries what it can and then degrades to local matching.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ClassifierError {
    pub kind: ClassifierErrorKind,
    pub message: String,
    /// Server-requested wait before the next attempt (429 `Retry-After`)
    pub retry_after: Option<Duration>,
}

impl ClassifierError {
    pub fn new(kind: ClassifierErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClassifierErrorKind::Transport, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ClassifierErrorKind::RateLimited, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ClassifierErrorKind::Upstream, message)
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::new(ClassifierErrorKind::Credentials, message)
    }

    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self::new(ClassifierErrorKind::Misconfigured, message)
    }

    pub fn malformed_reply(message: impl Into<String>) -> Self {
        Self::new(ClassifierErrorKind::MalformedReply, message)
    }

    /// Classify a non-2xx answer from the completions endpoint.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::credentials(format!("api key rejected ({}): {}", status, body)),
            408 => Self::transport(format!("endpoint timed out: {}", body)),
            429 => Self::rate_limited(format!("rate limited: {}", body)),
            400 | 404 | 422 => {
                Self::misconfigured(format!("request refused ({}): {}", status, body))
            }
            500..=599 => Self::upstream(format!("model service failed ({}): {}", status, body)),
            _ => Self::malformed_reply(format!("unexpected status {}: {}", status, body)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierErrorKind {
    /// Connection failed or timed out
    Transport,
    /// 429; retried after the cooldown
    RateLimited,
    /// 5xx from the model service
    Upstream,
    /// Missing or rejected api key
    Credentials,
    /// Bad base URL, proxy, model name or request shape
    Misconfigured,
    /// A reply the classifier can't read
    MalformedReply,
}

impl ClassifierErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport | Self::RateLimited | Self::Upstream)
    }
}
