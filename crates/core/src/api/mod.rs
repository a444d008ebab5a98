//! Backend REST client seam.
//!
//! The controller talks to the analytics backend exclusively through the
//! [`PromptApi`] trait so that tests and offline tooling can substitute a
//! scripted implementation for the real HTTP client.

use async_trait::async_trait;
use thiserror::Error;

use ik_protocol::api_models::{
    CreatePromptRequest, CreatePromptResponse, ExecuteRequest, PromptDetails, PromptListPage,
};
use ik_protocol::prompt_models::PromptId;
use ik_protocol::result_models::ExecutionResult;

pub mod http;
pub mod mock;

pub use http::HttpPromptApi;
pub use mock::MockPromptApi;

/// Errors surfaced by backend calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: connect, timeout, or response decoding.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
}

impl ApiError {
    /// Message suitable for showing to the user.
    ///
    /// Prefers whatever the backend said over transport internals.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, .. } => message.clone(),
            Self::Http(e) => format!("could not reach the analytics backend: {e}"),
        }
    }
}

/// The five operations the orchestration layer needs from the backend.
#[async_trait]
pub trait PromptApi: Send + Sync {
    /// `POST /prompts`: submit a prompt for code generation.
    async fn create_prompt(
        &self,
        request: &CreatePromptRequest,
    ) -> Result<CreatePromptResponse, ApiError>;

    /// `GET /prompts/{id}`: read the current status of a prompt.
    async fn get_prompt(&self, id: &PromptId) -> Result<PromptDetails, ApiError>;

    /// `POST /prompts/{id}/execute`: run the generated analysis.
    async fn execute_prompt(
        &self,
        id: &PromptId,
        options: &ExecuteRequest,
    ) -> Result<(), ApiError>;

    /// `GET /prompts/{id}/results`: fetch results once completed.
    async fn get_results(&self, id: &PromptId) -> Result<ExecutionResult, ApiError>;

    /// `GET /prompts?limit=&page=`: list prompt history, newest first.
    async fn list_prompts(&self, limit: u32, page: u32) -> Result<PromptListPage, ApiError>;
}
