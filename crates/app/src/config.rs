//! Settings read from the environment at startup.
//!
//! A `.env` file in the working directory is honoured outside tests.

use lms_core::model::Role;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for the environment variable {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `SQLite` URL; `None` keeps everything in memory for this run.
    pub db_url: Option<String>,
    /// Role the session starts as.
    pub role: Role,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: None,
            role: Role::Admin,
            log_filter: "info".into(),
        }
    }
}

impl Config {
    /// Loads `LMS_DB_URL`, `LMS_ROLE`, and `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `LMS_ROLE` is not a known role.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `LMS_ROLE` is not a known role.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let role = match get("LMS_ROLE") {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| ConfigError::InvalidValue("LMS_ROLE", e.to_string()))?,
            None => defaults.role,
        };

        Ok(Self {
            db_url: get("LMS_DB_URL"),
            role,
            log_filter: get("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }
}
