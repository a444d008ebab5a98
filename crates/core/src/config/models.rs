//! Configuration models.
//!
//! Everything lives in a single `config.toml` with one table per concern.
//! Every table and every field is optional; defaults target a local
//! development backend.

use std::time::Duration;

use serde::Deserialize;

use ik_protocol::prompt_models::PromptSettings;

use crate::poll::PollBudget;
use crate::sandbox::SandboxLimits;

/// Application configuration loaded from `.insight-kit/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// `[api]`: backend endpoint and credentials.
    #[serde(default)]
    pub api: ApiConfig,

    /// `[polling]`: pacing for status watches.
    #[serde(default)]
    pub polling: PollingConfig,

    /// `[sandbox]`: resource ceilings for generated code.
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// `[defaults]`: prompt settings applied when the caller provides none.
    /// Keys use the wire casing (`visualizationType`, `displayCurrency`,
    /// `fiscalYearStart`), since the snapshot is sent to the backend as-is.
    #[serde(default)]
    pub defaults: PromptSettings,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token attached to every request when present.
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Status polling pace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl PollingConfig {
    pub fn budget(&self) -> PollBudget {
        PollBudget {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Sandbox resource ceilings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_sandbox_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_memory_limit_bytes")]
    pub memory_limit_bytes: usize,
}

impl SandboxConfig {
    pub fn limits(&self) -> SandboxLimits {
        SandboxLimits {
            timeout: Duration::from_millis(self.timeout_ms),
            memory_limit: self.memory_limit_bytes,
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_sandbox_timeout_ms(),
            memory_limit_bytes: default_memory_limit_bytes(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3001/api/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    30
}

fn default_sandbox_timeout_ms() -> u64 {
    10_000
}

fn default_memory_limit_bytes() -> usize {
    1024 * 1024
}
