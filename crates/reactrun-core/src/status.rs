//! Job status, execution state, and raw outcome types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Operation name recorded on every raw outcome.
pub const REACT_OPERATION: &str = "react";

/// Final status of an agent invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// The agent returned a final message.
    Succeeded,
    /// Session setup, tool loading, or the agent itself failed.
    Failed,
}

/// Execution state of one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Inputs received, nothing emitted yet.
    #[default]
    Created,
    /// `task_started` emitted, start time captured.
    Started,
    /// Tool session acquired.
    ToolSessionOpen,
    /// Agent invocation in flight.
    AgentRunning,
    /// Agent returned; raw text available.
    ResultReady,
    /// A stage failed; a failure record stands in for the result.
    Failed,
    /// Completion events emitted.
    Completed,
}

impl JobState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Created, Started)
                | (Started, ToolSessionOpen)
                | (Started, Failed)
                | (ToolSessionOpen, AgentRunning)
                | (ToolSessionOpen, Failed)
                | (AgentRunning, ResultReady)
                | (AgentRunning, Failed)
                | (ResultReady, Completed)
                | (Failed, Completed)
        )
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(self, next: JobState) -> Result<JobState, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", next),
            })
        }
    }
}

/// Raw outcome of the agent stage, before extraction and inlining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Always `react`.
    pub operation: String,
    /// Whether the agent produced a final message.
    pub status: JobStatus,
    /// Final message text on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error description on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutcome {
    /// Create a succeeded outcome carrying the final text.
    pub fn succeeded(text: impl Into<String>) -> Self {
        Self {
            operation: REACT_OPERATION.to_string(),
            status: JobStatus::Succeeded,
            result: Some(text.into()),
            error: None,
        }
    }

    /// Create a failed outcome.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            operation: REACT_OPERATION.to_string(),
            status: JobStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if the agent succeeded.
    pub fn is_succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    /// The record as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
