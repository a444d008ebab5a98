//! Configuration loading and management.
//!
//! Settings come from the `.insight-kit/config.toml` file in the project
//! root, with environment overrides for credentials.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::{ApiConfig, AppConfig, PollingConfig, SandboxConfig};
