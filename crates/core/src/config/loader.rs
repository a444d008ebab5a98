//! Configuration file loader for the `.insight-kit/` directory.

use std::path::Path;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::AppConfig;

/// Environment variable that overrides `[api] auth_token`.
pub const TOKEN_ENV_VAR: &str = "INSIGHT_API_TOKEN";

/// Loads configuration from `<root>/.insight-kit/config.toml`.
///
/// A missing directory or file yields the built-in defaults rather than an
/// error, so a freshly cloned project works against a local backend without
/// any setup.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or is not
/// valid TOML.
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let config_path = root.join(".insight-kit").join("config.toml");

    let mut config = if config_path.exists() {
        let content =
            std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
                path: config_path.clone(),
                source,
            })?;

        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path,
            source,
        })?
    } else {
        AppConfig::default()
    };

    override_token(&mut config, std::env::var(TOKEN_ENV_VAR).ok());
    Ok(config)
}

/// Applies the environment token override; blank values are ignored.
fn override_token(config: &mut AppConfig, token: Option<String>) {
    if let Some(token) = token {
        if !token.trim().is_empty() {
            config.api.auth_token = Some(token);
        }
    }
}
