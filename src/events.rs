//! Stream lifecycle types
//!
//! A relay call moves through [`RelayState`] and ends with a
//! [`StreamOutcome`]. Channel consumers receive [`StreamDelta`] items.

use serde::Serialize;

/// Per-call state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayState {
    Idle,
    /// Request sent, waiting for response headers
    Sending,
    /// Response accepted, frames arriving
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl RelayState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RelayState::Completed | RelayState::Failed | RelayState::Cancelled
        )
    }

    /// Move to `next`, refusing to leave a terminal state
    pub(crate) fn advance(&mut self, next: RelayState) {
        if self.is_terminal() {
            tracing::warn!(target: "llm", from = ?self, to = ?next, "Ignoring transition out of terminal state");
            return;
        }
        tracing::debug!(target: "llm", from = ?self, to = ?next, "Relay state transition");
        *self = next;
    }
}

/// How a relay call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamOutcome {
    /// Stream ended normally; `chunks` text deltas were delivered
    Completed { chunks: usize },
    /// Transport failure, already reported through the error callback
    Failed,
    /// Cancelled by the caller
    Cancelled,
}

/// Items delivered to channel consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamDelta {
    /// Text content delta
    Text(String),
    /// Stream finished
    Done,
    /// Stream failed
    Error(String),
}
