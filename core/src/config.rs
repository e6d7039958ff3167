//! Base path configuration.
//!
//! The base path is read once, when a `ProjectClient` is constructed, and is
//! never mutated afterwards. Anything that can hand out a `&str` origin can
//! act as the provider.

use thiserror::Error;

/// Environment variable consulted by `ApiConfig::from_env`.
pub const BASE_PATH_ENV: &str = "TASKBOARD_API_BASE_PATH";

pub const DEFAULT_BASE_PATH: &str = "http://127.0.0.1:8000";

/// Supplies the API origin/prefix, e.g. `https://example.com/`.
pub trait BasePathProvider {
    fn base_path(&self) -> &str;
}

impl BasePathProvider for str {
    fn base_path(&self) -> &str {
        self
    }
}

impl BasePathProvider for String {
    fn base_path(&self) -> &str {
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base path {0:?}: expected an http:// or https:// origin")]
    InvalidBasePath(String),
}

/// Process-wide API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_path: String,
}

impl ApiConfig {
    pub fn new(base_path: impl Into<String>) -> Result<Self, ConfigError> {
        let base_path = base_path.into();
        let trimmed = base_path.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBasePath(base_path));
        }
        Ok(Self {
            base_path: trimmed.to_string(),
        })
    }

    /// Load from `TASKBOARD_API_BASE_PATH`, falling back to the local default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(BASE_PATH_ENV) {
            Some(value) if !value.trim().is_empty() => Self::new(value),
            _ => Self::new(DEFAULT_BASE_PATH),
        }
    }
}

impl BasePathProvider for ApiConfig {
    fn base_path(&self) -> &str {
        &self.base_path
    }
}
