//! REST API request and response bodies.
//!
//! This module defines the wire shapes for the five backend endpoints:
//!
//! - `POST /prompts`: submit a prompt for code generation
//! - `GET /prompts/{id}`: poll prompt status
//! - `POST /prompts/{id}/execute`: run the generated analysis
//! - `GET /prompts/{id}/results`: fetch results once completed
//! - `GET /prompts?limit=&page=`: list prompt history
//!
//! All bodies use camelCase field names to match the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::prompt_models::{BackendStatus, DatasetId, PromptId, PromptRecord, PromptSettings};

/// Body of `POST /prompts`.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    /// Natural-language analysis request. Never empty; the controller
    /// validates before sending.
    pub prompt: String,

    /// Datasets to run the analysis against. At least one.
    pub dataset_ids: Vec<DatasetId>,

    /// Settings snapshot for this prompt.
    pub settings: PromptSettings,
}

/// Response of `POST /prompts`.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptResponse {
    pub prompt_id: PromptId,
}

/// Response of `GET /prompts/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
pub struct PromptDetails {
    pub status: BackendStatus,

    /// The submitted prompt text, echoed back.
    #[serde(default)]
    pub prompt: String,

    /// Present when `status` is `failed`.
    #[serde(default)]
    pub error: Option<BackendError>,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
}

/// Error detail the backend attaches to failed prompts and error responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct BackendError {
    pub message: String,

    /// Machine-readable code, when the backend provides one.
    #[serde(default)]
    pub code: Option<String>,
}

/// Standard error body for non-2xx responses: `{ "error": { "message": ... } }`.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: BackendError,
}

/// Per-execution options. The backend accepts an empty object today; the
/// struct exists so the wire shape stays `{ "executionOptions": {} }`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {}

/// Body of `POST /prompts/{id}/execute`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub execution_options: ExecutionOptions,
}

/// Response of `GET /prompts?limit=&page=`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct PromptListPage {
    #[serde(default)]
    pub prompts: Vec<PromptRecord>,
}
