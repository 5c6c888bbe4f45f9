//! Decision service connection settings.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the HTTP advisor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Base URL of the decision service; `/chat` is appended when missing.
    pub url: String,
    /// Per-request timeout in seconds, enforced by the HTTP client.
    pub request_timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl AdvisorConfig {
    /// The full chat endpoint.
    #[must_use]
    pub fn chat_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if base.ends_with("/chat") {
            base.to_string()
        } else {
            format!("{base}/chat")
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
