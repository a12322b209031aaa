//! Configuration for the sponsorship and identity backend.

use std::time::Duration;

/// Connection settings for the backend that fronts the gas sponsor.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// Path of the build/sponsor endpoint.
    pub sponsor_path: String,
    /// Path of the finalize/execute endpoint.
    pub execute_path: String,
    /// Path of the zkLogin salt endpoint.
    pub salt_path: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// Creates a configuration with the default route layout.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            sponsor_path: "/api/sponsor".to_string(),
            execute_path: "/api/sponsor/execute".to_string(),
            salt_path: "/api/zklogin/salt".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration for a local development server.
    pub fn localhost() -> Self {
        Self::new("http://localhost:3000")
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides the endpoint paths.
    pub fn with_paths(mut self, sponsor: &str, execute: &str, salt: &str) -> Self {
        self.sponsor_path = sponsor.to_string();
        self.execute_path = execute.to_string();
        self.salt_path = salt.to_string();
        self
    }

    pub fn sponsor_url(&self) -> String {
        format!("{}{}", self.base_url, self.sponsor_path)
    }

    pub fn execute_url(&self) -> String {
        format!("{}{}", self.base_url, self.execute_path)
    }

    pub fn salt_url(&self) -> String {
        format!("{}{}", self.base_url, self.salt_path)
    }
}
