//! Mock backend implementation for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use ik_protocol::api_models::{
    BackendError, CreatePromptRequest, CreatePromptResponse, ExecuteRequest, PromptDetails,
    PromptListPage,
};
use ik_protocol::prompt_models::{BackendStatus, PromptId};
use ik_protocol::result_models::ExecutionResult;

use super::{ApiError, PromptApi};

fn backend_error(message: &str) -> ApiError {
    ApiError::Backend {
        status: 500,
        message: message.to_string(),
    }
}

/// Scripted in-memory backend.
///
/// `get_prompt` serves statuses from a queue, repeating the last one once the
/// queue drains (a backend that stays `processing` forever is scripted as a
/// single `processing` entry). Every method counts its calls so tests can
/// assert how often the controller actually hit the network.
pub struct MockPromptApi {
    created_id: PromptId,
    statuses: Mutex<VecDeque<BackendStatus>>,
    last_status: Mutex<BackendStatus>,
    failure_message: Option<String>,
    create_error: Option<String>,
    status_error: Option<String>,
    execute_error: Option<String>,
    results_error: Option<String>,
    result: ExecutionResult,
    list_page: PromptListPage,
    create_calls: AtomicU32,
    status_calls: AtomicU32,
    execute_calls: AtomicU32,
    results_calls: AtomicU32,
    list_calls: AtomicU32,
}

impl MockPromptApi {
    pub fn new() -> Self {
        Self {
            created_id: PromptId::from("prompt-mock-1"),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(BackendStatus::Processing),
            failure_message: None,
            create_error: None,
            status_error: None,
            execute_error: None,
            results_error: None,
            result: ExecutionResult::default(),
            list_page: PromptListPage::default(),
            create_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            execute_calls: AtomicU32::new(0),
            results_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
        }
    }

    /// Id returned by `create_prompt`.
    pub fn with_created_id(mut self, id: impl Into<String>) -> Self {
        self.created_id = PromptId(id.into());
        self
    }

    /// Script the status sequence served by `get_prompt`.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = BackendStatus>) -> Self {
        {
            let mut queue = self.statuses.lock().expect("status queue poisoned");
            queue.clear();
            queue.extend(statuses);
        }
        self
    }

    /// Error message attached to `failed` statuses.
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn with_create_error(mut self, message: impl Into<String>) -> Self {
        self.create_error = Some(message.into());
        self
    }

    pub fn with_status_error(mut self, message: impl Into<String>) -> Self {
        self.status_error = Some(message.into());
        self
    }

    pub fn with_execute_error(mut self, message: impl Into<String>) -> Self {
        self.execute_error = Some(message.into());
        self
    }

    pub fn with_results_error(mut self, message: impl Into<String>) -> Self {
        self.results_error = Some(message.into());
        self
    }

    /// Payload returned by `get_results`.
    pub fn with_result(mut self, result: ExecutionResult) -> Self {
        self.result = result;
        self
    }

    pub fn with_list_page(mut self, page: PromptListPage) -> Self {
        self.list_page = page;
        self
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> u32 {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn results_calls(&self) -> u32 {
        self.results_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> BackendStatus {
        let mut queue = self.statuses.lock().expect("status queue poisoned");
        match queue.pop_front() {
            Some(status) => {
                *self.last_status.lock().expect("last status poisoned") = status;
                status
            }
            None => *self.last_status.lock().expect("last status poisoned"),
        }
    }
}

impl Default for MockPromptApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptApi for MockPromptApi {
    async fn create_prompt(
        &self,
        _request: &CreatePromptRequest,
    ) -> Result<CreatePromptResponse, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.create_error {
            return Err(backend_error(message));
        }

        Ok(CreatePromptResponse {
            prompt_id: self.created_id.clone(),
        })
    }

    async fn get_prompt(&self, _id: &PromptId) -> Result<PromptDetails, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.status_error {
            return Err(backend_error(message));
        }
        let status = self.next_status();
        let error = (status == BackendStatus::Failed).then(|| BackendError {
            message: self
                .failure_message
                .clone()
                .unwrap_or_else(|| "analysis failed".to_string()),
            code: None,
        });

        Ok(PromptDetails {
            status,
            prompt: "mock prompt".to_string(),
            error,
            created: Utc::now(),
        })
    }

    async fn execute_prompt(
        &self,
        _id: &PromptId,
        _options: &ExecuteRequest,
    ) -> Result<(), ApiError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.execute_error {
            return Err(backend_error(message));
        }

        Ok(())
    }

    async fn get_results(&self, _id: &PromptId) -> Result<ExecutionResult, ApiError> {
        self.results_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.results_error {
            return Err(backend_error(message));
        }

        Ok(self.result.clone())
    }

    async fn list_prompts(&self, _limit: u32, _page: u32) -> Result<PromptListPage, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        Ok(self.list_page.clone())
    }
}
