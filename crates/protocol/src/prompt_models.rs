//! Prompt lifecycle models.
//!
//! This module defines the structures for tracking a prompt from submission
//! through code generation, execution and results retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque prompt identifier assigned by the backend.
///
/// The client never mints these; they arrive in the create response and are
/// echoed back in every subsequent request for the same prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, TS)]
#[serde(transparent)]
pub struct PromptId(pub String);

impl PromptId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PromptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PromptId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque dataset reference selected by the user at submission time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, TS)]
#[serde(transparent)]
pub struct DatasetId(pub String);

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Status vocabulary used by the backend on the wire.
///
/// A prompt moves through `created -> processing -> generated` while the
/// backend writes dashboard code, and through `processing -> completed` once
/// execution has been requested. `failed` can appear at any point.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// The prompt row exists but work has not started yet.
    Created,

    /// The backend is working (either generating code or executing it,
    /// depending on which stage the prompt is in).
    Processing,

    /// Code generation finished; the prompt is waiting for an execute call.
    Generated,

    /// Execution finished and results are available.
    Completed,

    /// The backend gave up on this prompt.
    Failed,
}

impl BackendStatus {
    /// Whether the code-generation stage has nothing further to report.
    pub fn generation_done(self) -> bool {
        matches!(self, Self::Generated | Self::Completed | Self::Failed)
    }

    /// Whether the execution stage has nothing further to report.
    pub fn execution_done(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Which backend stage a status observation belongs to.
///
/// The wire status `processing` is ambiguous on its own: it means "generating
/// code" before an execute call and "running the analysis" after one. The
/// controller tags every observation with the stage it is watching so that
/// [`PromptState::from_backend`] can translate without guessing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionPhase {
    /// Watching the prompt between creation and `generated`.
    Generation,

    /// Watching the prompt between an execute call and `completed`.
    Execution,
}

/// Client-side lifecycle state of the active prompt.
///
/// The state progresses through these states during normal execution:
/// Idle -> Creating -> Processing -> ReadyForExecution -> Executing -> Completed
///
/// Failed is reachable from every non-terminal state; reset returns to Idle
/// from anywhere.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptState {
    /// No prompt is active.
    Idle,

    /// The create request is in flight.
    Creating,

    /// The backend is generating dashboard code.
    Processing,

    /// Code generation finished; waiting for the user to trigger execution.
    ReadyForExecution,

    /// The backend is executing the analysis.
    Executing,

    /// Results have been fetched and are ready to render.
    Completed,

    /// Something went wrong; see the recorded error message.
    Failed,
}

impl PromptState {
    /// Translates a backend status into the client state.
    ///
    /// This is the only place where backend vocabulary is interpreted; all
    /// callers (poll watches, re-selection, the store) go through it so the
    /// two vocabularies cannot drift apart. The mapping is total over
    /// status x phase.
    pub fn from_backend(status: BackendStatus, phase: ExecutionPhase) -> Self {
        match (status, phase) {
            (BackendStatus::Created | BackendStatus::Processing, ExecutionPhase::Generation) => {
                Self::Processing
            }
            (BackendStatus::Created | BackendStatus::Processing, ExecutionPhase::Execution) => {
                Self::Executing
            }
            (BackendStatus::Generated, _) => Self::ReadyForExecution,
            (BackendStatus::Completed, _) => Self::Completed,
            (BackendStatus::Failed, _) => Self::Failed,
        }
    }

    /// Projects the client state back onto the wire vocabulary for history
    /// rows. `Idle` and `Creating` have no backend counterpart yet.
    pub fn backend_summary(self) -> Option<BackendStatus> {
        match self {
            Self::Idle | Self::Creating => None,
            Self::Processing | Self::Executing => Some(BackendStatus::Processing),
            Self::ReadyForExecution => Some(BackendStatus::Generated),
            Self::Completed => Some(BackendStatus::Completed),
            Self::Failed => Some(BackendStatus::Failed),
        }
    }

    /// Whether the lifecycle has finished (successfully or not).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Progress percentages reported alongside state changes.
///
/// These are coarse UI hints, not measurements. Within one lifecycle run the
/// reported value never decreases until a failure resets it to zero.
pub mod progress {
    use super::PromptState;

    pub const IDLE: u8 = 0;
    pub const CREATING: u8 = 5;
    pub const PROCESSING: u8 = 15;
    pub const READY_FOR_EXECUTION: u8 = 40;
    pub const EXECUTING: u8 = 60;
    /// Reported when the backend has finished but results were not requested
    /// yet.
    pub const RESULTS_PENDING: u8 = 80;
    /// Reported while the results request is in flight.
    pub const FETCHING_RESULTS: u8 = 85;
    pub const COMPLETED: u8 = 100;
    pub const FAILED: u8 = 0;

    /// Baseline percentage for a state, used when entering it.
    pub fn for_state(state: PromptState) -> u8 {
        match state {
            PromptState::Idle => IDLE,
            PromptState::Creating => CREATING,
            PromptState::Processing => PROCESSING,
            PromptState::ReadyForExecution => READY_FOR_EXECUTION,
            PromptState::Executing => EXECUTING,
            PromptState::Completed => COMPLETED,
            PromptState::Failed => FAILED,
        }
    }
}

/// Preferred chart style for generated dashboards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationStyle {
    /// Let the backend pick per visualization.
    #[default]
    Auto,
    Bar,
    Line,
    Pie,
    Table,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_fiscal_year_start() -> String {
    "January".to_string()
}

/// Analysis preferences captured when a prompt is created.
///
/// Each [`PromptRecord`] carries the snapshot that was current at submission
/// time; editing the defaults afterwards must not change what an already
/// submitted prompt was asked to do.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct PromptSettings {
    /// Chart style hint passed to the code generator.
    #[serde(default)]
    pub visualization_type: VisualizationStyle,

    /// Ask the backend to produce textual insights alongside charts.
    #[serde(default = "default_true")]
    pub include_insights: bool,

    /// Output language code (en, es, fr, de, it).
    #[serde(default = "default_language")]
    pub language: String,

    /// Currency used when formatting monetary values (USD, EUR, GBP, JPY,
    /// CAD, AUD).
    #[serde(default = "default_currency")]
    pub display_currency: String,

    /// First month of the fiscal year, as an English month name.
    #[serde(default = "default_fiscal_year_start")]
    pub fiscal_year_start: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            visualization_type: VisualizationStyle::Auto,
            include_insights: true,
            language: default_language(),
            display_currency: default_currency(),
            fiscal_year_start: default_fiscal_year_start(),
        }
    }
}

/// One row of the prompt history.
///
/// Rows are created optimistically when a prompt is submitted and kept in
/// sync with the controller while the prompt runs; `refresh` replaces them
/// with whatever the backend lists.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    /// Backend identifier for this prompt.
    pub id: PromptId,

    /// The prompt text as submitted.
    pub prompt: String,

    /// Summary status shown in list views.
    pub status: BackendStatus,

    /// When the prompt was created.
    pub created: DateTime<Utc>,

    /// Datasets the analysis was asked to run against.
    #[serde(default)]
    pub dataset_ids: Vec<DatasetId>,

    /// Settings snapshot from submission time. List responses may omit it.
    #[serde(default)]
    pub settings: Option<PromptSettings>,

    /// Whether results can be fetched for this prompt.
    #[serde(default)]
    pub has_results: bool,

    /// Whether the prompt ended in failure.
    #[serde(default)]
    pub has_error: bool,
}
