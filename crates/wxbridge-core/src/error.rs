// ── Core error types ──
//
// Domain-facing errors from wxbridge-core. Consumers never see raw
// reqwest failures; the `From<wxbridge_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;
use uuid::Uuid;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Network ─────────────────────────────────────────────────────
    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    // ── Protocol ────────────────────────────────────────────────────
    #[error("Malformed bridge response: {reason}")]
    MalformedResponse { reason: String },

    /// A poll response referenced a sensor the registry does not know.
    /// Non-fatal for the poll; surfaced once per distinct name so a
    /// stale capability manifest is diagnosable.
    #[error("Response references unknown sensor {0:?}")]
    UnknownSensor(String),

    // ── Domain ──────────────────────────────────────────────────────
    /// The bridge's location resolved to a country we have no forecast
    /// model for. The bridge keeps no model rather than a partial one.
    #[error("No forecast model for country {0:?}")]
    UnknownModel(String),

    /// Attempt to select a unit a sensor does not support.
    #[error("Sensor {sensor:?} does not support unit {unit:?}")]
    MissingUnit { sensor: String, unit: String },

    #[error("Bridge {0} is not registered")]
    BridgeNotRegistered(Uuid),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wxbridge_api::Error> for CoreError {
    fn from(err: wxbridge_api::Error) -> Self {
        match err {
            wxbridge_api::Error::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            wxbridge_api::Error::MalformedResponse { reason } => {
                Self::MalformedResponse { reason }
            }
            wxbridge_api::Error::Service { status, message } => Self::Service { status, message },
            wxbridge_api::Error::Deserialization { message, .. } => Self::MalformedResponse {
                reason: format!("undecodable service response: {message}"),
            },
            wxbridge_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid URL: {e}"),
            },
            wxbridge_api::Error::Transport(ref e) if e.is_timeout() => {
                Self::Timeout { timeout_secs: 0 }
            }
            wxbridge_api::Error::Transport(e) => Self::Transport {
                message: e.to_string(),
            },
        }
    }
}

impl CoreError {
    /// Transient errors are retried implicitly by the next scheduled
    /// tick; nothing else retries them.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Service { status: 500.., .. }
        )
    }
}
