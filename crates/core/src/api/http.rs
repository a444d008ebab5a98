//! HTTP implementation of the backend client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use ik_protocol::api_models::{
    CreatePromptRequest, CreatePromptResponse, ErrorResponse, ExecuteRequest, PromptDetails,
    PromptListPage,
};
use ik_protocol::prompt_models::PromptId;
use ik_protocol::result_models::ExecutionResult;

use super::{ApiError, PromptApi};
use crate::config::models::ApiConfig;

/// reqwest-backed [`PromptApi`] for a running analytics backend.
pub struct HttpPromptApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpPromptApi {
    /// Create a client for the given base URL (for example
    /// `http://localhost:3001/api/v1`). A trailing slash is tolerated.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            auth_token: None,
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Build a client from the `[api]` configuration section.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut api = Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        api.auth_token = config.auth_token.clone();
        Ok(api)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success response into an error, preferring the backend's
    /// own `{ "error": { "message": ... } }` body when it parses.
    async fn error_from_response(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or_else(|_| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                }
            });

        ApiError::Backend { status, message }
    }

    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }
}

#[async_trait]
impl PromptApi for HttpPromptApi {
    async fn create_prompt(
        &self,
        request: &CreatePromptRequest,
    ) -> Result<CreatePromptResponse, ApiError> {
        let response = self
            .authorized(self.client.post(self.url("/prompts")))
            .json(request)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        Ok(response.json().await?)
    }

    async fn get_prompt(&self, id: &PromptId) -> Result<PromptDetails, ApiError> {
        let response = self
            .authorized(self.client.get(self.url(&format!("/prompts/{id}"))))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        Ok(response.json().await?)
    }

    async fn execute_prompt(&self, id: &PromptId, options: &ExecuteRequest) -> Result<(), ApiError> {
        let response = self
            .authorized(
                self.client
                    .post(self.url(&format!("/prompts/{id}/execute"))),
            )
            .json(options)
            .send()
            .await?;
        Self::ensure_success(response).await?;

        Ok(())
    }

    async fn get_results(&self, id: &PromptId) -> Result<ExecutionResult, ApiError> {
        let response = self
            .authorized(
                self.client
                    .get(self.url(&format!("/prompts/{id}/results"))),
            )
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        Ok(response.json().await?)
    }

    async fn list_prompts(&self, limit: u32, page: u32) -> Result<PromptListPage, ApiError> {
        let response = self
            .authorized(self.client.get(self.url("/prompts")))
            .query(&[("limit", limit), ("page", page)])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        Ok(response.json().await?)
    }
}
