use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::types::{ActionResponse, ActionState, BatchId, PollStatus, TestDescriptor};

use super::remote::{RemoteError, TestService};

/// A test service that serves fixture data without any network calls.
///
/// Submit and poll responses are scripted in order. Once the poll script runs
/// out every poll reports the batch as finished with no updates. Clones share
/// state, so a test can keep one clone to inspect what the engine did.
#[derive(Clone, Default)]
pub struct StubService {
    tests: Vec<TestDescriptor>,
    list_error: Option<String>,
    submit_script: Arc<Mutex<VecDeque<Result<ActionResponse<serde_json::Value>, String>>>>,
    poll_script: Arc<Mutex<VecDeque<Result<ActionResponse<PollStatus>, String>>>>,
    submissions: Arc<Mutex<Vec<(BatchId, Vec<String>)>>>,
    polls: Arc<AtomicUsize>,
}

impl StubService {
    pub fn new(tests: Vec<TestDescriptor>) -> Self {
        Self {
            tests,
            ..Self::default()
        }
    }

    /// Make `list_tests` fail with `message`.
    pub fn failing_list(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    pub fn push_submit(&self, response: ActionResponse<serde_json::Value>) -> &Self {
        lock(&self.submit_script).push_back(Ok(response));
        self
    }

    pub fn push_submit_error(&self, message: impl Into<String>) -> &Self {
        lock(&self.submit_script).push_back(Err(message.into()));
        self
    }

    pub fn push_poll(&self, response: ActionResponse<PollStatus>) -> &Self {
        lock(&self.poll_script).push_back(Ok(response));
        self
    }

    pub fn push_poll_error(&self, message: impl Into<String>) -> &Self {
        lock(&self.poll_script).push_back(Err(message.into()));
        self
    }

    /// Every `(batch, tests)` pair submitted so far.
    pub fn submissions(&self) -> Vec<(BatchId, Vec<String>)> {
        lock(&self.submissions).clone()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl TestService for StubService {
    async fn list_tests(&self) -> Result<Vec<TestDescriptor>, RemoteError> {
        match &self.list_error {
            Some(message) => Err(RemoteError::Unavailable(message.clone())),
            None => Ok(self.tests.clone()),
        }
    }

    async fn submit_test_set(
        &self,
        batch: BatchId,
        tests: &[String],
    ) -> Result<ActionResponse<serde_json::Value>, RemoteError> {
        lock(&self.submissions).push((batch, tests.to_vec()));
        let next = lock(&self.submit_script).pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(RemoteError::Unavailable(message)),
            None => Ok(ActionResponse::success(serde_json::Value::Null)),
        }
    }

    async fn poll_status(&self, _batch: BatchId) -> Result<ActionResponse<PollStatus>, RemoteError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.poll_script).pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(RemoteError::Unavailable(message)),
            None => Ok(ActionResponse {
                state: ActionState::Success,
                return_value: Some(PollStatus::default()),
                error: None,
            }),
        }
    }
}
