//! Prompt lifecycle state machine implementation.
//!
//! This module provides functions for mutating the shared [`Lifecycle`] and
//! emitting the matching events. Every mutating function takes the generation
//! the caller was started under and applies nothing if the lifecycle has
//! since been reset or re-used for another prompt, so stale background tasks
//! can neither change state nor emit events.

use ik_protocol::events::PromptEvent;
use ik_protocol::prompt_models::{progress, PromptId, PromptRecord, PromptState};
use ik_protocol::result_models::ExecutionResult;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;

/// Mutable state of the active prompt.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    /// Current client-side state.
    pub state: PromptState,

    /// Backend id of the active prompt, once known.
    pub prompt_id: Option<PromptId>,

    /// Human-readable reason when `state` is `Failed`.
    pub error: Option<String>,

    /// Fetched results when `state` is `Completed`.
    pub result: Option<ExecutionResult>,

    /// Progress hint in percent.
    pub progress: u8,

    /// Ownership counter. Bumped whenever the lifecycle is reset or re-used
    /// for a new prompt; background tasks carry the value they were spawned
    /// with and become inert once it no longer matches.
    pub generation: u64,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: PromptState::Idle,
            prompt_id: None,
            error: None,
            result: None,
            progress: progress::IDLE,
            generation: 0,
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Claim the lifecycle for a new prompt and enter `Creating`.
///
/// Supersedes whatever was active: all previously spawned tasks see a stale
/// generation afterwards. Returns the new generation.
pub async fn begin_prompt(lifecycle: &Mutex<Lifecycle>, events_tx: &Sender<PromptEvent>) -> u64 {
    let mut guard = lifecycle.lock().await;
    guard.generation += 1;
    guard.state = PromptState::Creating;
    guard.prompt_id = None;
    guard.error = None;
    guard.result = None;
    guard.progress = progress::CREATING;
    let _ = events_tx
        .send(PromptEvent::PromptStatusUpdate {
            prompt_id: None,
            state: guard.state,
            progress: guard.progress,
        })
        .await;
    guard.generation
}

/// Return the lifecycle to `Idle`, dropping id, error and results.
///
/// Returns the new generation so callers (re-selection) can continue under
/// it. The event is sent while the lock is held, which keeps emissions
/// ordered with respect to later generation checks.
pub async fn reset_prompt(lifecycle: &Mutex<Lifecycle>, events_tx: &Sender<PromptEvent>) -> u64 {
    let mut guard = lifecycle.lock().await;
    guard.generation += 1;
    guard.state = PromptState::Idle;
    guard.prompt_id = None;
    guard.error = None;
    guard.result = None;
    guard.progress = progress::IDLE;
    let _ = events_tx.send(PromptEvent::ControllerReset).await;
    guard.generation
}

/// Record the backend id after a successful create and enter `Processing`.
///
/// Emits `PromptCreated` with the optimistic history record, then the status
/// update. Returns false (and changes nothing) if the lifecycle moved on
/// while the create call was in flight.
pub async fn attach_prompt_id(
    lifecycle: &Mutex<Lifecycle>,
    events_tx: &Sender<PromptEvent>,
    expected: u64,
    id: PromptId,
    record: PromptRecord,
) -> bool {
    let mut guard = lifecycle.lock().await;
    if guard.generation != expected {
        return false;
    }
    guard.prompt_id = Some(id.clone());
    guard.state = PromptState::Processing;
    guard.progress = progress::PROCESSING;
    let _ = events_tx.send(PromptEvent::PromptCreated { record }).await;
    let _ = events_tx
        .send(PromptEvent::PromptStatusUpdate {
            prompt_id: Some(id),
            state: guard.state,
            progress: guard.progress,
        })
        .await;
    true
}

/// Point the lifecycle at an existing prompt from history.
///
/// Sets the id without emitting; the follow-up transition carries it.
pub async fn attach_selected_id(
    lifecycle: &Mutex<Lifecycle>,
    expected: u64,
    id: PromptId,
) -> bool {
    let mut guard = lifecycle.lock().await;
    if guard.generation != expected {
        return false;
    }
    guard.prompt_id = Some(id);
    true
}

/// Move to `state` with the given progress and emit a status update.
///
/// Also used as the poll heartbeat: re-entering the current state re-emits
/// it, which consumers treat as a liveness signal.
pub async fn transition_prompt(
    lifecycle: &Mutex<Lifecycle>,
    events_tx: &Sender<PromptEvent>,
    expected: u64,
    state: PromptState,
    progress: u8,
) -> bool {
    let mut guard = lifecycle.lock().await;
    if guard.generation != expected {
        return false;
    }
    guard.state = state;
    guard.progress = progress;
    let _ = events_tx
        .send(PromptEvent::PromptStatusUpdate {
            prompt_id: guard.prompt_id.clone(),
            state,
            progress,
        })
        .await;
    true
}

/// Update only the progress hint, keeping the current state.
///
/// The hint never moves backwards: re-fetching results on an already
/// completed prompt keeps reporting 100.
pub async fn set_progress(
    lifecycle: &Mutex<Lifecycle>,
    events_tx: &Sender<PromptEvent>,
    expected: u64,
    progress: u8,
) -> bool {
    let mut guard = lifecycle.lock().await;
    if guard.generation != expected {
        return false;
    }
    guard.progress = guard.progress.max(progress);
    let progress = guard.progress;
    let _ = events_tx
        .send(PromptEvent::PromptStatusUpdate {
            prompt_id: guard.prompt_id.clone(),
            state: guard.state,
            progress,
        })
        .await;
    true
}

/// Mark the prompt as completed with its results and emit events.
pub async fn complete_prompt(
    lifecycle: &Mutex<Lifecycle>,
    events_tx: &Sender<PromptEvent>,
    expected: u64,
    result: ExecutionResult,
) -> bool {
    let mut guard = lifecycle.lock().await;
    if guard.generation != expected {
        return false;
    }
    let Some(id) = guard.prompt_id.clone() else {
        // Nothing to complete without an id; leave the lifecycle alone.
        return false;
    };
    guard.state = PromptState::Completed;
    guard.progress = progress::COMPLETED;
    guard.result = Some(result.clone());
    let _ = events_tx
        .send(PromptEvent::PromptStatusUpdate {
            prompt_id: Some(id.clone()),
            state: guard.state,
            progress: guard.progress,
        })
        .await;
    let _ = events_tx
        .send(PromptEvent::PromptCompleted {
            prompt_id: id,
            result,
        })
        .await;
    true
}

/// Mark the prompt as failed and emit error events.
///
/// Failure zeroes the progress indicator.
pub async fn fail_prompt(
    lifecycle: &Mutex<Lifecycle>,
    events_tx: &Sender<PromptEvent>,
    expected: u64,
    error: String,
) -> bool {
    let mut guard = lifecycle.lock().await;
    if guard.generation != expected {
        return false;
    }
    guard.state = PromptState::Failed;
    guard.progress = progress::FAILED;
    guard.error = Some(error.clone());
    let _ = events_tx
        .send(PromptEvent::PromptStatusUpdate {
            prompt_id: guard.prompt_id.clone(),
            state: guard.state,
            progress: guard.progress,
        })
        .await;
    let _ = events_tx
        .send(PromptEvent::PromptError {
            prompt_id: guard.prompt_id.clone(),
            message: error,
        })
        .await;
    true
}
