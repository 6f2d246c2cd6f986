// Shared transport configuration for building reqwest::Client instances.
//
// Bridge and weather clients share timeout and user-agent settings
// through this module, avoiding duplicated builder logic.

use std::time::Duration;

/// Default per-request timeout for both API surfaces.
///
/// Bridges are slow embedded devices; the weather service is rate-limited
/// but fast. Fifteen seconds covers both, and a timeout is treated as an
/// ordinary transport failure by the poll supervisor (no special retry).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("wxbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(crate::error::Error::Transport)
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
