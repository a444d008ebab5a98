//! Prompt execution controller.
//!
//! The PromptController owns the lifecycle of the active prompt: it submits
//! prompts, watches them through the backend's generation and execution
//! stages with the polling engine, fetches results, and emits events for
//! every observable change.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tracing::debug;

use ik_protocol::api_models::{CreatePromptRequest, ExecuteRequest, PromptDetails};
use ik_protocol::events::PromptEvent;
use ik_protocol::prompt_models::{
    progress, BackendStatus, DatasetId, ExecutionPhase, PromptId, PromptRecord, PromptSettings,
    PromptState,
};
use ik_protocol::result_models::ExecutionResult;

use crate::api::{ApiError, PromptApi};
use crate::poll::{PollBudget, PollError, PollingEngine};

pub mod lifecycle;

pub use lifecycle::Lifecycle;

/// Errors returned by controller operations.
///
/// Lifecycle failures (poll timeouts, backend-reported failures inside a
/// watch) are not errors here; they surface as the `Failed` state and a
/// `PromptError` event.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("prompt text must not be empty")]
    EmptyPrompt,

    #[error("select at least one dataset")]
    NoDatasets,

    #[error("prompt is not ready for execution (current state: {state:?})")]
    NotReady { state: PromptState },

    #[error("no prompt is selected")]
    NoActivePrompt,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Orchestrates one prompt at a time against the backend.
///
/// Cheap to clone; clones share the same lifecycle, polling engine and event
/// channel. Background watches hold a clone, so the controller stays usable
/// while they run.
#[derive(Clone)]
pub struct PromptController {
    api: Arc<dyn PromptApi>,
    poller: Arc<PollingEngine>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    events_tx: Sender<PromptEvent>,
}

impl PromptController {
    /// Create a controller.
    ///
    /// # Arguments
    ///
    /// * `api` - Backend client (HTTP in production, scripted in tests)
    /// * `budget` - Poll pacing shared by the generation and execution watches
    /// * `events_tx` - Channel for lifecycle events
    pub fn new(api: Arc<dyn PromptApi>, budget: PollBudget, events_tx: Sender<PromptEvent>) -> Self {
        Self {
            api,
            poller: Arc::new(PollingEngine::new(budget)),
            lifecycle: Arc::new(Mutex::new(Lifecycle::new())),
            events_tx,
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> PromptState {
        self.lifecycle.lock().await.state
    }

    /// Copy of the full lifecycle for display or assertions.
    pub async fn snapshot(&self) -> Lifecycle {
        self.lifecycle.lock().await.clone()
    }

    /// Whether a poll session is currently watching the backend.
    pub fn polling_active(&self) -> bool {
        self.poller.is_active()
    }

    /// Submit a prompt for code generation.
    ///
    /// Validates locally first; nothing reaches the network when validation
    /// fails. On success the controller enters `Processing`, spawns a watch
    /// that polls until generation settles, and returns the backend id.
    ///
    /// Any previously active prompt is superseded, exactly as if `reset` had
    /// been called first.
    ///
    /// # Errors
    ///
    /// - `ControllerError::EmptyPrompt` / `NoDatasets` on invalid input
    /// - `ControllerError::Api` when `POST /prompts` fails (the lifecycle is
    ///   `Failed` afterwards)
    pub async fn create_prompt(
        &self,
        prompt: &str,
        dataset_ids: Vec<DatasetId>,
        settings: PromptSettings,
    ) -> Result<PromptId, ControllerError> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(ControllerError::EmptyPrompt);
        }
        if dataset_ids.is_empty() {
            return Err(ControllerError::NoDatasets);
        }

        self.poller.stop();
        let generation = lifecycle::begin_prompt(&self.lifecycle, &self.events_tx).await;
        debug!(generation, "submitting prompt");

        let request = CreatePromptRequest {
            prompt: trimmed.to_string(),
            dataset_ids: dataset_ids.clone(),
            settings: settings.clone(),
        };
        let response = match self.api.create_prompt(&request).await {
            Ok(response) => response,
            Err(e) => {
                lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, e.user_message())
                    .await;
                return Err(e.into());
            }
        };

        let id = response.prompt_id;
        let record = PromptRecord {
            id: id.clone(),
            prompt: trimmed.to_string(),
            status: BackendStatus::Created,
            created: Utc::now(),
            dataset_ids,
            settings: Some(settings),
            has_results: false,
            has_error: false,
        };

        // A reset that landed while the create call was in flight wins: the
        // response is discarded, but the id is still handed back since the
        // prompt exists server-side.
        if lifecycle::attach_prompt_id(&self.lifecycle, &self.events_tx, generation, id.clone(), record)
            .await
        {
            self.spawn_watch(generation, id.clone(), ExecutionPhase::Generation);
        }

        Ok(id)
    }

    /// Run the generated analysis for the active prompt.
    ///
    /// Only valid in `ReadyForExecution`; any other state is rejected without
    /// touching the lifecycle.
    ///
    /// # Errors
    ///
    /// - `ControllerError::NotReady` outside `ReadyForExecution`
    /// - `ControllerError::Api` when `POST /execute` fails (the lifecycle is
    ///   `Failed` afterwards)
    pub async fn execute_prompt(&self) -> Result<(), ControllerError> {
        let (generation, id) = {
            let guard = self.lifecycle.lock().await;
            if guard.state != PromptState::ReadyForExecution {
                return Err(ControllerError::NotReady { state: guard.state });
            }
            let Some(id) = guard.prompt_id.clone() else {
                return Err(ControllerError::NoActivePrompt);
            };
            (guard.generation, id)
        };

        lifecycle::transition_prompt(
            &self.lifecycle,
            &self.events_tx,
            generation,
            PromptState::Executing,
            progress::EXECUTING,
        )
        .await;

        if let Err(e) = self.api.execute_prompt(&id, &ExecuteRequest::default()).await {
            lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, e.user_message())
                .await;
            return Err(e.into());
        }

        self.spawn_watch(generation, id, ExecutionPhase::Execution);
        Ok(())
    }

    /// Fetch results for the active prompt and enter `Completed`.
    ///
    /// The watches call this automatically when they observe `completed`;
    /// it is public so callers can re-fetch on demand.
    ///
    /// # Errors
    ///
    /// - `ControllerError::NoActivePrompt` without a selected prompt
    /// - `ControllerError::Api` when the fetch fails (the lifecycle is
    ///   `Failed` afterwards)
    pub async fn fetch_results(&self) -> Result<ExecutionResult, ControllerError> {
        let (generation, id) = {
            let guard = self.lifecycle.lock().await;
            let Some(id) = guard.prompt_id.clone() else {
                return Err(ControllerError::NoActivePrompt);
            };
            (guard.generation, id)
        };

        lifecycle::set_progress(
            &self.lifecycle,
            &self.events_tx,
            generation,
            progress::FETCHING_RESULTS,
        )
        .await;
        self.retrieve_and_complete(generation, &id).await
    }

    /// Re-select a prompt from history.
    ///
    /// Resets first, then reads the prompt's status once and synthesizes the
    /// matching lifecycle state: completed prompts get their results fetched
    /// immediately (no `Processing` or `Executing` detour, no poll session),
    /// failed ones surface the backend's message, and prompts still being
    /// generated resume a generation watch.
    pub async fn select_prompt(&self, id: PromptId) -> Result<(), ControllerError> {
        self.poller.stop();
        let generation = lifecycle::reset_prompt(&self.lifecycle, &self.events_tx).await;
        debug!(generation, %id, "selecting prompt from history");

        let details = match self.api.get_prompt(&id).await {
            Ok(details) => details,
            Err(e) => {
                lifecycle::attach_selected_id(&self.lifecycle, generation, id).await;
                lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, e.user_message())
                    .await;
                return Err(e.into());
            }
        };

        lifecycle::attach_selected_id(&self.lifecycle, generation, id.clone()).await;
        match PromptState::from_backend(details.status, ExecutionPhase::Generation) {
            PromptState::Completed => {
                self.retrieve_and_complete(generation, &id).await?;
            }
            PromptState::Failed => {
                let message = details
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "prompt failed".to_string());
                lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, message).await;
            }
            PromptState::ReadyForExecution => {
                lifecycle::transition_prompt(
                    &self.lifecycle,
                    &self.events_tx,
                    generation,
                    PromptState::ReadyForExecution,
                    progress::READY_FOR_EXECUTION,
                )
                .await;
            }
            PromptState::Processing => {
                lifecycle::transition_prompt(
                    &self.lifecycle,
                    &self.events_tx,
                    generation,
                    PromptState::Processing,
                    progress::PROCESSING,
                )
                .await;
                self.spawn_watch(generation, id, ExecutionPhase::Generation);
            }
            // The generation-phase mapping cannot produce these.
            PromptState::Idle | PromptState::Creating | PromptState::Executing => {}
        }

        Ok(())
    }

    /// Return to `Idle`, stopping any active poll session.
    ///
    /// Idempotent. After this returns, no task spawned for the previous
    /// prompt can mutate state or emit events.
    pub async fn reset(&self) {
        self.poller.stop();
        lifecycle::reset_prompt(&self.lifecycle, &self.events_tx).await;
    }

    /// Poll the backend until `phase` settles, then apply the outcome.
    fn spawn_watch(&self, generation: u64, id: PromptId, phase: ExecutionPhase) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.watch(generation, id, phase).await;
        });
    }

    async fn watch(&self, generation: u64, id: PromptId, phase: ExecutionPhase) {
        let heartbeat_state = PromptState::from_backend(BackendStatus::Processing, phase);
        let heartbeat_progress = progress::for_state(heartbeat_state);
        let phase_done = move |status: BackendStatus| match phase {
            ExecutionPhase::Generation => status.generation_done(),
            ExecutionPhase::Execution => status.execution_done(),
        };

        let probe_api = self.api.clone();
        let probe_lifecycle = self.lifecycle.clone();
        let probe_tx = self.events_tx.clone();
        let probe_id = id.clone();
        let outcome = self
            .poller
            .run(
                move || {
                    let api = probe_api.clone();
                    let id = probe_id.clone();
                    let lifecycle = probe_lifecycle.clone();
                    let events_tx = probe_tx.clone();
                    async move {
                        let details = api.get_prompt(&id).await?;
                        if !phase_done(details.status) {
                            // Heartbeat: reconfirm the current state so
                            // consumers see every poll tick.
                            lifecycle::transition_prompt(
                                &lifecycle,
                                &events_tx,
                                generation,
                                heartbeat_state,
                                heartbeat_progress,
                            )
                            .await;
                        }
                        Ok::<PromptDetails, ApiError>(details)
                    }
                },
                move |details| phase_done(details.status),
            )
            .await;

        match outcome {
            Ok(poll) => match poll.value.status {
                BackendStatus::Generated => {
                    lifecycle::transition_prompt(
                        &self.lifecycle,
                        &self.events_tx,
                        generation,
                        PromptState::ReadyForExecution,
                        progress::READY_FOR_EXECUTION,
                    )
                    .await;
                }
                BackendStatus::Completed => {
                    lifecycle::set_progress(
                        &self.lifecycle,
                        &self.events_tx,
                        generation,
                        progress::RESULTS_PENDING,
                    )
                    .await;
                    let _ = self.retrieve_and_complete(generation, &id).await;
                }
                BackendStatus::Failed => {
                    let message = poll
                        .value
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| "prompt processing failed".to_string());
                    lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, message)
                        .await;
                }
                // The done predicates never let these through.
                BackendStatus::Created | BackendStatus::Processing => {}
            },
            Err(PollError::Timeout { attempts }) => {
                let message = format!("status polling timed out after {attempts} checks");
                lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, message).await;
            }
            Err(PollError::Probe(e)) => {
                lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, e.user_message())
                    .await;
            }
            Err(PollError::Superseded) => {
                debug!(generation, "watch superseded");
            }
        }
    }

    async fn retrieve_and_complete(
        &self,
        generation: u64,
        id: &PromptId,
    ) -> Result<ExecutionResult, ControllerError> {
        match self.api.get_results(id).await {
            Ok(result) => {
                lifecycle::complete_prompt(
                    &self.lifecycle,
                    &self.events_tx,
                    generation,
                    result.clone(),
                )
                .await;
                Ok(result)
            }
            Err(e) => {
                lifecycle::fail_prompt(&self.lifecycle, &self.events_tx, generation, e.user_message())
                    .await;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockPromptApi;
    use tokio::sync::mpsc;

    fn controller_with(api: MockPromptApi) -> (PromptController, Arc<MockPromptApi>, mpsc::Receiver<PromptEvent>) {
        let api = Arc::new(api);
        let (tx, rx) = mpsc::channel(100);
        let controller = PromptController::new(api.clone(), PollBudget::default(), tx);
        (controller, api, rx)
    }

    #[tokio::test]
    async fn test_create_prompt_validates_before_any_network_call() {
        let (controller, api, _rx) = controller_with(MockPromptApi::new());

        let result = controller
            .create_prompt("   ", vec![DatasetId::from("ds-1")], PromptSettings::default())
            .await;
        assert!(matches!(result, Err(ControllerError::EmptyPrompt)));

        let result = controller
            .create_prompt("Show revenue", vec![], PromptSettings::default())
            .await;
        assert!(matches!(result, Err(ControllerError::NoDatasets)));

        assert_eq!(api.create_calls(), 0);
        assert_eq!(controller.state().await, PromptState::Idle);
    }

    #[tokio::test]
    async fn test_execute_prompt_rejected_outside_ready_state() {
        let (controller, api, _rx) = controller_with(MockPromptApi::new());

        let result = controller.execute_prompt().await;
        assert!(matches!(
            result,
            Err(ControllerError::NotReady {
                state: PromptState::Idle
            })
        ));
        assert_eq!(api.execute_calls(), 0);
        // The rejection left the lifecycle untouched.
        assert_eq!(controller.state().await, PromptState::Idle);
    }

    #[tokio::test]
    async fn test_fetch_results_requires_a_selected_prompt() {
        let (controller, api, _rx) = controller_with(MockPromptApi::new());

        let result = controller.fetch_results().await;
        assert!(matches!(result, Err(ControllerError::NoActivePrompt)));
        assert_eq!(api.results_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_moves_to_failed_with_backend_message() {
        let (controller, _api, mut rx) =
            controller_with(MockPromptApi::new().with_create_error("quota exceeded"));

        let result = controller
            .create_prompt(
                "Show revenue",
                vec![DatasetId::from("ds-1")],
                PromptSettings::default(),
            )
            .await;
        assert!(matches!(result, Err(ControllerError::Api(_))));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.state, PromptState::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("quota exceeded"));
        assert_eq!(snapshot.progress, 0);

        // Creating, then Failed, then the error detail.
        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let PromptEvent::PromptStatusUpdate { state, .. } = event {
                states.push(state);
            }
        }
        assert_eq!(states, vec![PromptState::Creating, PromptState::Failed]);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (controller, _api, mut rx) = controller_with(MockPromptApi::new());

        controller.reset().await;
        controller.reset().await;

        assert_eq!(controller.state().await, PromptState::Idle);
        assert!(!controller.polling_active());

        assert!(matches!(rx.try_recv(), Ok(PromptEvent::ControllerReset)));
        assert!(matches!(rx.try_recv(), Ok(PromptEvent::ControllerReset)));
    }
}
