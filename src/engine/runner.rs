use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::{ActionState, BatchId};

use super::interface::{Engine, EngineHandle, Event, Request};
use super::poll::{PollRegistry, poll_chain};
use super::remote::TestService;

/// Drives a `TestService`: loads tests, submits batches and polls them.
pub struct RunnerEngine<S> {
    service: Arc<S>,
    poll_interval: Duration,
}

impl<S: TestService> RunnerEngine<S> {
    pub fn new(service: S, poll_interval: Duration) -> Self {
        Self {
            service: Arc::new(service),
            poll_interval,
        }
    }
}

impl<S: TestService> Engine for RunnerEngine<S> {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let handle = EngineHandle::new(tx);
        let spawned = std::thread::Builder::new()
            .name("test-engine".to_owned())
            .spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(self.run_loop(rx)),
                Err(e) => tracing::error!("engine: failed to start tokio runtime: {e}"),
            });
        if let Err(e) = spawned {
            tracing::error!("engine: failed to spawn engine thread: {e}");
        }
        handle
    }
}

impl<S: TestService> RunnerEngine<S> {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        let mut registry = PollRegistry::new();
        while let Some(req) = rx.recv().await {
            match req {
                Request::Shutdown => break,
                req => self.handle_request(req, &mut registry).await,
            }
        }
        tracing::debug!("engine: shutting down");
        registry.cancel_all();
    }

    async fn handle_request(&self, req: Request, registry: &mut PollRegistry) {
        match req {
            Request::FetchTests { reply_tx } => match self.service.list_tests().await {
                Ok(tests) => {
                    tracing::debug!("engine: sending TestsFetched count={}", tests.len());
                    let _ = reply_tx.send(Event::TestsFetched { tests });
                }
                Err(e) => {
                    tracing::error!("engine: FetchTests error: {e}");
                    let _ = reply_tx.send(Event::FetchError {
                        context: "FetchTests".to_owned(),
                        message: e.to_string(),
                    });
                }
            },

            Request::SubmitBatch {
                batch,
                tests,
                reply_tx,
            } => self.submit(batch, &tests, reply_tx, registry).await,

            Request::CancelBatch { batch } => {
                if registry.cancel(batch) {
                    tracing::info!("engine: cancelled polling of batch {batch}");
                }
            }

            Request::Shutdown => {}
        }
    }

    async fn submit(
        &self,
        batch: BatchId,
        tests: &[String],
        reply_tx: Sender<Event>,
        registry: &mut PollRegistry,
    ) {
        if tests.is_empty() {
            tracing::warn!("engine: refusing to submit empty batch {batch}");
            let _ = reply_tx.send(Event::BatchRejected {
                batch,
                state: ActionState::Error,
                message: "empty test set".to_owned(),
            });
            return;
        }
        tracing::info!("engine: submitting batch {batch} with {} tests", tests.len());
        let (state, message) = match self.service.submit_test_set(batch, tests).await {
            Ok(resp) => (resp.state, resp.error.unwrap_or_default()),
            Err(e) => {
                tracing::error!("engine: SubmitBatch {batch} transport error: {e}");
                (ActionState::Error, e.to_string())
            }
        };

        if state != ActionState::Success {
            let _ = reply_tx.send(Event::BatchRejected {
                batch,
                state,
                message,
            });
            return;
        }

        let _ = reply_tx.send(Event::BatchAccepted { batch });
        let token = registry.register(batch);
        tokio::spawn(poll_chain(
            Arc::clone(&self.service),
            batch,
            self.poll_interval,
            token,
            reply_tx,
        ));
    }
}
