//! Client configuration.

use crate::error::ConfigError;
use crate::types::NewTask;

pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";
pub const DEFAULT_USER_ID: u64 = 5;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root of the todo API; `/todos` is appended by the client.
    pub base_url: String,

    /// Owner attached to every created task.
    pub user_id: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID,
        }
    }
}

impl ClientConfig {
    /// Read `TODO_API_URL` and `TODO_USER_ID`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("TODO_API_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::EmptyBaseUrl);
            }
            config.base_url = url.to_string();
        }

        if let Some(raw) = lookup("TODO_USER_ID") {
            config.user_id = raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidUserId {
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(config)
    }

    /// A `NewTask` owned by the configured user, with no local decoration.
    pub fn new_task(&self, todo: impl Into<String>) -> NewTask {
        NewTask {
            todo: todo.into(),
            user_id: self.user_id,
            ..Default::default()
        }
    }
}
