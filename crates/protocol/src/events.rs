//! Event-channel protocol.
//!
//! This module defines the messages the core sends to its consumers (the CLI
//! event printer and the history store) while a prompt moves through its
//! lifecycle.
//!
//! Communication is asynchronous and channel-based: the controller pushes
//! events into a `tokio::sync::mpsc` channel and never waits for consumers
//! to act on them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::prompt_models::{PromptId, PromptRecord, PromptState};
use crate::result_models::ExecutionResult;

/// Events sent from the core to the UI layer.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "promptStatusUpdate",
///   "payload": {
///     "prompt_id": "p-42",
///     "state": "PROCESSING",
///     "progress": 15
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum PromptEvent {
    /// A prompt was accepted by the backend.
    ///
    /// Carries the optimistic history record so list views can show the new
    /// row before the next refresh.
    PromptCreated { record: PromptRecord },

    /// The active prompt's state or progress changed.
    ///
    /// Poll watches re-emit the current state on every non-terminal tick, so
    /// consumers also see this as a liveness signal. `prompt_id` is absent
    /// while the create request is still in flight.
    PromptStatusUpdate {
        prompt_id: Option<PromptId>,
        state: PromptState,
        progress: u8,
    },

    /// Results were fetched for the active prompt.
    PromptCompleted {
        prompt_id: PromptId,
        result: ExecutionResult,
    },

    /// The active prompt failed.
    ///
    /// Always preceded by a `PromptStatusUpdate` carrying the `Failed`
    /// state; this event adds the human-readable reason.
    PromptError {
        prompt_id: Option<PromptId>,
        message: String,
    },

    /// The controller was reset to idle.
    ControllerReset,
}
