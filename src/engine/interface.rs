use std::sync::mpsc::Sender;

use crate::types::{ActionState, BatchId, PollStatus, TestDescriptor};

/// Handle to the backend engine held by the UI layer.
///
/// Cheaply cloneable. When the last handle is dropped the sender channel
/// closes, signalling the engine to shut down.
#[derive(Clone)]
pub struct EngineHandle {
    tx: tokio::sync::mpsc::UnboundedSender<Request>,
}

impl EngineHandle {
    pub(super) fn new(tx: tokio::sync::mpsc::UnboundedSender<Request>) -> Self {
        Self { tx }
    }

    /// Send a request to the engine. Non-blocking, returns immediately.
    pub fn send(&self, req: Request) {
        // Ignore errors: if the receiver is gone the engine has already shut down.
        let _ = self.tx.send(req);
    }
}

/// Anything that can be started on its own thread and driven through an
/// `EngineHandle`.
pub trait Engine: Send + 'static {
    fn start(self) -> EngineHandle;
}

/// All operations the UI layer can send to the engine.
pub enum Request {
    /// Load the list of tests from the server.
    FetchTests { reply_tx: Sender<Event> },

    /// Submit a batch. On success a poll chain for `batch` starts and every
    /// earlier chain is cancelled.
    SubmitBatch {
        batch: BatchId,
        tests: Vec<String>,
        reply_tx: Sender<Event>,
    },

    /// Stop polling `batch`. The server is not told.
    CancelBatch { batch: BatchId },

    Shutdown,
}

/// All events the engine can push back to the UI.
#[derive(Debug)]
pub enum Event {
    TestsFetched {
        tests: Vec<TestDescriptor>,
    },
    /// Loading the test list failed.
    FetchError {
        context: String,
        message: String,
    },

    // -----------------------------------------------------------------------
    // Batch lifecycle
    // -----------------------------------------------------------------------
    BatchAccepted {
        batch: BatchId,
    },
    BatchRejected {
        batch: BatchId,
        state: ActionState,
        message: String,
    },
    /// A poll while the batch is still running.
    StatusUpdated {
        batch: BatchId,
        status: PollStatus,
    },
    /// The final poll of a batch. Sent at most once per batch.
    BatchFinished {
        batch: BatchId,
        status: PollStatus,
    },
    PollFailed {
        batch: BatchId,
        state: ActionState,
        message: String,
    },
    PollCancelled {
        batch: BatchId,
    },
}

impl Event {
    /// The batch this event belongs to, if any.
    pub fn batch(&self) -> Option<BatchId> {
        match self {
            Self::TestsFetched { .. } | Self::FetchError { .. } => None,
            Self::BatchAccepted { batch }
            | Self::BatchRejected { batch, .. }
            | Self::StatusUpdated { batch, .. }
            | Self::BatchFinished { batch, .. }
            | Self::PollFailed { batch, .. }
            | Self::PollCancelled { batch } => Some(*batch),
        }
    }
}
