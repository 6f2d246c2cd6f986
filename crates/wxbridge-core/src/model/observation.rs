// ── Timestamped observations ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wxbridge_api::template::NO_DATA;

/// A single timestamped measurement.
///
/// Three instances live on every sensor: current, daily-max, daily-min.
/// Mutation is always a full replace via [`Observation::replace`] —
/// never a partial field write — so a reader holding a clone can never
/// see a value paired with the wrong timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub value: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Observation {
    /// Replace both fields atomically (from this type's point of view).
    pub fn replace(&mut self, value: impl Into<String>, timestamp: DateTime<Utc>) {
        *self = Self {
            value: Some(value.into()),
            timestamp: Some(timestamp),
        };
    }

    /// `false` when the observation is empty or carries the device's
    /// "no data" sentinel.
    pub fn is_available(&self) -> bool {
        self.value.as_deref().is_some_and(|v| v != NO_DATA)
    }

    /// Parse the value as a float, if available.
    pub fn as_f64(&self) -> Option<f64> {
        self.value
            .as_deref()
            .filter(|v| *v != NO_DATA)
            .and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_both_fields() {
        let mut obs = Observation::default();
        assert!(!obs.is_available());

        obs.replace("21.4", Utc::now());
        assert!(obs.is_available());
        assert_eq!(obs.as_f64(), Some(21.4));
    }

    #[test]
    fn sentinel_is_unavailable() {
        let mut obs = Observation::default();
        obs.replace(NO_DATA, Utc::now());
        assert!(!obs.is_available());
        assert_eq!(obs.as_f64(), None);
    }
}
