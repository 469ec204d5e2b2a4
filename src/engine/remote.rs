use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::types::{ActionResponse, BatchId, PollStatus, TestDescriptor};

/// Errors talking to the test server. Action-level failures are not errors
/// here; they come back as an `ActionResponse` with a non-success state.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to initialize http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("test server unavailable: {0}")]
    Unavailable(String),
}

/// The remote test service as seen by the engine.
pub trait TestService: Send + Sync + 'static {
    /// Every test the server knows about.
    fn list_tests(&self) -> impl Future<Output = Result<Vec<TestDescriptor>, RemoteError>> + Send;

    /// Enqueue `tests` as `batch`.
    fn submit_test_set(
        &self,
        batch: BatchId,
        tests: &[String],
    ) -> impl Future<Output = Result<ActionResponse<serde_json::Value>, RemoteError>> + Send;

    /// Status of every test the server is tracking for `batch`.
    fn poll_status(
        &self,
        batch: BatchId,
    ) -> impl Future<Output = Result<ActionResponse<PollStatus>, RemoteError>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    batch: BatchId,
    test_set: &'a [String],
}

/// `TestService` over the test server's JSON API.
#[derive(Clone)]
pub struct HttpTestService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTestService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("test-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        url: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, RemoteError> {
        let http_err = |source| RemoteError::Http {
            url: url.to_owned(),
            source,
        };
        let response = response.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
                body: body.chars().take(240).collect(),
            });
        }
        response.json::<T>().await.map_err(http_err)
    }
}

impl TestService for HttpTestService {
    async fn list_tests(&self) -> Result<Vec<TestDescriptor>, RemoteError> {
        let url = self.endpoint("tests");
        tracing::debug!("remote: GET {url}");
        let response = self.http.get(&url).send().await;
        Self::read_json(&url, response).await
    }

    async fn submit_test_set(
        &self,
        batch: BatchId,
        tests: &[String],
    ) -> Result<ActionResponse<serde_json::Value>, RemoteError> {
        let url = self.endpoint("runs");
        tracing::debug!("remote: POST {url} batch={batch} tests={}", tests.len());
        let body = SubmitBody {
            batch,
            test_set: tests,
        };
        let response = self.http.post(&url).json(&body).send().await;
        Self::read_json(&url, response).await
    }

    async fn poll_status(&self, batch: BatchId) -> Result<ActionResponse<PollStatus>, RemoteError> {
        let url = self.endpoint("runs/status");
        tracing::debug!("remote: GET {url} batch={batch}");
        let response = self
            .http
            .get(&url)
            .query(&[("batch", batch.0)])
            .send()
            .await;
        Self::read_json(&url, response).await
    }
}
