//! Response coordinator: races every configured reply backend.
//!
//! All backends are called concurrently. The first success observed wins
//! and is returned without waiting for the others. If the first completion
//! is a failure, the remaining backends are awaited in their configured order
//! and the first success among them is returned. The call fails only when
//! every backend failed, and the error lists each backend's failure.
//!
//! Calls that lose the race keep running in the background; their results
//! are dropped when the coordinator returns.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::llm::{LLMError, LLMResult, ReplyBackend};

/// A successful reply and the backend that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Name of the winning backend
    pub source: String,
    pub text: String,
    /// Wall-clock time from dispatch to the winning result
    pub elapsed: Duration,
}

/// One backend's failure within a turn
#[derive(Debug, Clone, PartialEq)]
pub struct BackendFailure {
    pub backend: String,
    pub error: LLMError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

/// Every backend failed for a turn
#[derive(Debug, Clone, PartialEq, Error)]
pub struct AllFailedError {
    /// Failures in configured backend order
    pub failures: Vec<BackendFailure>,
}

impl fmt::Display for AllFailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no reply backends configured");
        }
        let joined = self
            .failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "all reply backends failed: {joined}")
    }
}

/// Races reply backends and falls back in configured order
pub struct ResponseCoordinator {
    backends: Vec<Arc<dyn ReplyBackend>>,
    backend_timeout: Option<Duration>,
}

impl ResponseCoordinator {
    pub fn new(backends: Vec<Arc<dyn ReplyBackend>>) -> Self {
        Self {
            backends,
            backend_timeout: None,
        }
    }

    /// Treat any backend call running longer than `timeout` as that backend's failure
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Names of the configured backends, in call order
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn has_backends(&self) -> bool {
        !self.backends.is_empty()
    }

    /// Get a reply for `text` from whichever backend succeeds first
    pub async fn get_reply(&self, text: &str) -> Result<Reply, AllFailedError> {
        if self.backends.is_empty() {
            return Err(AllFailedError {
                failures: Vec::new(),
            });
        }

        let started = Instant::now();
        let total = self.backends.len();

        // Completion order on this channel is the race order
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(usize, LLMResult<String>)>();

        for (index, backend) in self.backends.iter().enumerate() {
            let backend = Arc::clone(backend);
            let done_tx = done_tx.clone();
            let prompt = text.to_string();
            let limit = self.backend_timeout;

            tokio::spawn(async move {
                let result = match limit {
                    Some(limit) => tokio::time::timeout(limit, backend.generate(&prompt))
                        .await
                        .unwrap_or(Err(LLMError::Timeout(limit))),
                    None => backend.generate(&prompt).await,
                };
                // The receiver is gone once the coordinator has returned
                let _ = done_tx.send((index, result));
            });
        }
        drop(done_tx);

        let mut outcomes: Vec<Option<LLMResult<String>>> = (0..total).map(|_| None).collect();

        // Race: the first completion wins outright if it succeeded
        if let Some((index, result)) = done_rx.recv().await {
            match result {
                Ok(reply) => return Ok(self.reply(index, reply, started)),
                Err(e) => {
                    warn!(
                        backend = self.backends[index].name(),
                        "Reply backend failed first: {}", e
                    );
                    outcomes[index] = Some(Err(e));
                }
            }
        }

        // Fallback: walk the backends in configured order
        let mut failures = Vec::with_capacity(total);
        for index in 0..total {
            while outcomes[index].is_none() {
                match done_rx.recv().await {
                    Some((completed, result)) => outcomes[completed] = Some(result),
                    None => break,
                }
            }

            let name = self.backends[index].name().to_string();
            match outcomes[index].take() {
                Some(Ok(reply)) => {
                    info!(backend = %name, "Reply served by fallback backend");
                    return Ok(self.reply(index, reply, started));
                }
                Some(Err(error)) => failures.push(BackendFailure {
                    backend: name,
                    error,
                }),
                // The backend task ended without reporting (panicked)
                None => failures.push(BackendFailure {
                    backend: name,
                    error: LLMError::Aborted,
                }),
            }
        }

        warn!("All {} reply backends failed", total);
        Err(AllFailedError { failures })
    }

    fn reply(&self, index: usize, text: String, started: Instant) -> Reply {
        let source = self.backends[index].name().to_string();
        let elapsed = started.elapsed();
        debug!(backend = %source, elapsed_ms = elapsed.as_millis() as u64, "Reply ready");
        Reply {
            source,
            text,
            elapsed,
        }
    }
}
