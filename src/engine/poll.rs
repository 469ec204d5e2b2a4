use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::{ActionResponse, ActionState, BatchId};

use super::interface::Event;
use super::remote::TestService;

/// Tracks the live poll chain of every batch the engine still watches.
#[derive(Default)]
pub struct PollRegistry {
    chains: HashMap<BatchId, CancellationToken>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chain for `batch`, cancelling every other live chain.
    pub fn register(&mut self, batch: BatchId) -> CancellationToken {
        for (old, token) in self.chains.drain() {
            if !token.is_cancelled() {
                tracing::debug!("poll: superseding batch {old} with {batch}");
                token.cancel();
            }
        }
        let token = CancellationToken::new();
        self.chains.insert(batch, token.clone());
        token
    }

    /// Cancel the chain of `batch`. Returns `false` when it already ended.
    pub fn cancel(&mut self, batch: BatchId) -> bool {
        match self.chains.remove(&batch) {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Batches whose chain is still running.
    pub fn active(&self) -> Vec<BatchId> {
        let mut batches: Vec<BatchId> = self
            .chains
            .iter()
            .filter(|(_, t)| !t.is_cancelled())
            .map(|(b, _)| *b)
            .collect();
        batches.sort();
        batches
    }

    pub fn cancel_all(&mut self) {
        for (_, token) in self.chains.drain() {
            token.cancel();
        }
    }
}

/// Poll `batch` every `interval` until the server reports it done, a poll
/// fails, or `token` is cancelled.
///
/// The next poll is only scheduled once the previous response arrived. The
/// token is cancelled on exit so the registry sees the chain as ended.
pub async fn poll_chain<S: TestService>(
    service: Arc<S>,
    batch: BatchId,
    interval: Duration,
    token: CancellationToken,
    reply_tx: Sender<Event>,
) {
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!("poll: batch {batch} cancelled");
                let _ = reply_tx.send(Event::PollCancelled { batch });
                return;
            }
            () = tokio::time::sleep(interval) => {}
        }

        let response = tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!("poll: batch {batch} cancelled mid-request");
                let _ = reply_tx.send(Event::PollCancelled { batch });
                return;
            }
            response = service.poll_status(batch) => response,
        };

        match response {
            Ok(ActionResponse {
                state: ActionState::Success,
                return_value: None,
                ..
            }) => {
                tracing::warn!("poll: batch {batch} returned no status");
                let _ = reply_tx.send(Event::PollFailed {
                    batch,
                    state: ActionState::Incomplete,
                    message: "poll response carried no status".to_owned(),
                });
                break;
            }
            Ok(ActionResponse {
                state: ActionState::Success,
                return_value: Some(status),
                ..
            }) => {
                if status.tests_running {
                    tracing::debug!(
                        "poll: batch {batch} running, {} updates",
                        status.tests_with_props_map.len()
                    );
                    let _ = reply_tx.send(Event::StatusUpdated { batch, status });
                } else {
                    tracing::info!("poll: batch {batch} finished");
                    let _ = reply_tx.send(Event::BatchFinished { batch, status });
                    break;
                }
            }
            Ok(resp) => {
                tracing::warn!("poll: batch {batch} returned {}", resp.state);
                let _ = reply_tx.send(Event::PollFailed {
                    batch,
                    state: resp.state,
                    message: resp.error.unwrap_or_default(),
                });
                break;
            }
            Err(e) => {
                tracing::error!("poll: batch {batch} transport error: {e}");
                let _ = reply_tx.send(Event::PollFailed {
                    batch,
                    state: ActionState::Error,
                    message: e.to_string(),
                });
                break;
            }
        }
    }
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_supersedes_previous_chain() {
        let mut registry = PollRegistry::new();
        let first = registry.register(BatchId(1));
        let second = registry.register(BatchId(2));
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.active(), vec![BatchId(2)]);
    }

    #[test]
    fn cancel_reports_whether_chain_was_live() {
        let mut registry = PollRegistry::new();
        let token = registry.register(BatchId(3));
        assert!(registry.cancel(BatchId(3)));
        assert!(token.is_cancelled());
        assert!(!registry.cancel(BatchId(3)));
        assert!(registry.active().is_empty());
    }
}
