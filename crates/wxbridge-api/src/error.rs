use thiserror::Error;

/// Top-level error type for the `wxbridge-api` crate.
///
/// Covers every failure mode across both API surfaces: the bridge's
/// template protocol and the weather service's JSON endpoints.
/// `wxbridge-core` maps these into domain-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Template protocol ───────────────────────────────────────────
    /// The bridge's delimited response violated the wire format
    /// (bad timestamp arity, wrong field count, empty field).
    #[error("Malformed bridge response: {reason}")]
    MalformedResponse { reason: String },

    // ── Weather service ─────────────────────────────────────────────
    /// Non-success HTTP status from the weather service.
    #[error("Weather service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the
    /// next scheduled tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the failure is a protocol violation rather than
    /// a network problem.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}
