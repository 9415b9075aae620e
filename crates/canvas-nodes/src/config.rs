//! Configuration for executors and their collaborator clients

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default deadline for one collaborator call
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 60_000;
/// Default base URL of the HTTP collaborator service
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Settings shared by every executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    /// Deadline for each classification/generation call; elapsing fails the run
    pub collaborator_timeout_ms: u64,
}

impl ExecutorConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_ms: DEFAULT_COLLABORATOR_TIMEOUT_MS,
        }
    }
}

/// Where the HTTP-backed collaborators live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpServiceConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}
