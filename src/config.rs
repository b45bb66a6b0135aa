//! Configuration for the utility layer.
//!
//! Responsibility:
//! - Hold the JWT signing secret and the error-message template table.
//! - Load from environment (`SIM_JWT_SECRET`, optional `SIM_ERROR_*`
//!   overrides); fail startup on missing/invalid values.
//!
//! Callers pass a `Config` (usually behind `Arc` via `AppState`) into the
//! functions that need it instead of importing a shared global.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Error-message templates use `%s` placeholders, filled in by
/// [`crate::format::printf`].
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub errors: HashMap<String, String>,
}

fn default_error_templates() -> HashMap<String, String> {
    [
        ("missing_parameter", "Missing %s parameter"),
        ("invalid_parameter", "Invalid %s parameter"),
        ("missing_response_header", "Missing %s response header"),
        ("bad_audience", "Bad audience value"),
        ("invalid_token", "Invalid token: %s"),
        ("sim_invalid_token", "Invalid token"),
        ("invalid_request", "Invalid request: %s"),
        ("file_not_found", "File %s not found"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Config {
    /// Build a config with the default error templates. Intended for tests
    /// and for embedding into a larger application that supplies the secret
    /// itself.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            errors: default_error_templates(),
        }
    }

    /// Load from the environment (`.env` honored via dotenvy).
    ///
    /// - `SIM_JWT_SECRET` (required, non-empty)
    /// - `SIM_ERROR_<NAME>` overrides the template registered under the
    ///   lowercased `<NAME>`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_secret =
            std::env::var("SIM_JWT_SECRET").map_err(|_| ConfigError::Missing("SIM_JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("SIM_JWT_SECRET"));
        }

        let mut errors = default_error_templates();
        for (key, value) in std::env::vars() {
            if let Some(name) = key.strip_prefix("SIM_ERROR_") {
                errors.insert(name.to_ascii_lowercase(), value);
            }
        }

        Ok(Self { jwt_secret, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_secret_carries_default_templates() {
        let config = Config::with_secret("s3cret");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(
            config.errors.get("missing_parameter").map(String::as_str),
            Some("Missing %s parameter")
        );
    }
}
