use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Batch identity
// ---------------------------------------------------------------------------

/// Identifies one submitted set of tests. Allocated by the dashboard session,
/// strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Action envelope
// ---------------------------------------------------------------------------

/// Completion state of a remote action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionState {
    Success,
    Incomplete,
    Error,
    Aborted,
}

impl ActionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Incomplete => "INCOMPLETE",
            Self::Error => "ERROR",
            Self::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The server's reply to a remote action: a state plus an optional payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse<T> {
    pub state: ActionState,
    #[serde(default)]
    pub return_value: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn success(value: T) -> Self {
        Self {
            state: ActionState::Success,
            return_value: Some(value),
            error: None,
        }
    }

    pub fn failed(state: ActionState, error: impl Into<String>) -> Self {
        Self {
            state,
            return_value: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Poll payload
// ---------------------------------------------------------------------------

/// Per-test result carried by a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStatusUpdate {
    pub status: String,
    #[serde(default)]
    pub exception: Option<String>,
}

impl TestStatusUpdate {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            exception: None,
        }
    }

    pub fn failed(exception: impl Into<String>) -> Self {
        Self {
            status: "FAILED".to_owned(),
            exception: Some(exception.into()),
        }
    }
}

/// Return value of the status poll action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatus {
    #[serde(default, alias = "testsWithStatusById")]
    pub tests_with_props_map: HashMap<String, TestStatusUpdate>,
    #[serde(default)]
    pub tests_running: bool,
}
