// ── Hazard alerts ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wxbridge_api::AlertRecord;

/// Message type of an alert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertMessageType {
    Alert,
    Update,
    Cancel,
    Unknown,
}

impl AlertMessageType {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("Alert") => Self::Alert,
            Some("Update") => Self::Update,
            Some("Cancel") => Self::Cancel,
            _ => Self::Unknown,
        }
    }
}

/// Severity of an alert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Unknown,
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl AlertSeverity {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("Extreme") => Self::Extreme,
            Some("Severe") => Self::Severe,
            Some("Moderate") => Self::Moderate,
            Some("Minor") => Self::Minor,
            _ => Self::Unknown,
        }
    }
}

/// Identity of a hazard: two alerts with equal keys are the same hazard
/// regardless of any other field drift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub identifier: String,
    pub alert_type: String,
}

/// A locally tracked hazard alert.
///
/// Created on first sighting in a fetch batch; replaced wholesale (with
/// `acknowledged` reset) when re-fetched with different content; removed
/// only when a fetch explicitly returns an empty batch. See
/// [`crate::alerts::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub identifier: String,
    pub alert_type: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub effective_until: Option<DateTime<Utc>>,
    pub onset: Option<DateTime<Utc>>,
    pub ends: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub message_type: AlertMessageType,
    pub severity: AlertSeverity,
    pub category: Option<String>,
    pub certainty: Option<String>,
    pub urgency: Option<String>,
    pub event: Option<String>,
    pub headline: Option<String>,
    pub sender: Option<String>,
    pub area_description: Option<String>,
    pub detail: Option<String>,
    pub instruction: Option<String>,
    pub reference_identifiers: Vec<String>,
    /// Whether the user has seen this alert. Settable exactly once
    /// meaningfully; reset to `false` when the alert's content changes.
    pub acknowledged: bool,
}

impl Alert {
    pub fn key(&self) -> AlertKey {
        AlertKey {
            identifier: self.identifier.clone(),
            alert_type: self.alert_type.clone(),
        }
    }

    /// Same hazard: `(identifier, type)` equality.
    pub fn same_hazard(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.alert_type == other.alert_type
    }

    /// Full content comparison, ignoring the local `acknowledged` flag.
    pub fn content_matches(&self, other: &Self) -> bool {
        let strip = |a: &Self| {
            let mut a = a.clone();
            a.acknowledged = false;
            a
        };
        strip(self) == strip(other)
    }

    /// Mark the alert as seen. Idempotent; returns `true` only on the
    /// first meaningful call.
    pub fn acknowledge(&mut self) -> bool {
        !std::mem::replace(&mut self.acknowledged, true)
    }
}

impl From<AlertRecord> for Alert {
    fn from(rec: AlertRecord) -> Self {
        Self {
            identifier: rec.identifier,
            alert_type: rec.alert_type,
            sent_at: rec.sent,
            effective_until: rec.effective,
            onset: rec.onset,
            ends: rec.ends,
            expires: rec.expires,
            status: rec.status,
            message_type: AlertMessageType::parse(rec.message_type.as_deref()),
            severity: AlertSeverity::parse(rec.severity.as_deref()),
            category: rec.category,
            certainty: rec.certainty,
            urgency: rec.urgency,
            event: rec.event,
            headline: rec.headline,
            sender: rec.sender_name,
            area_description: rec.area_desc,
            detail: rec.description,
            instruction: rec.instruction,
            reference_identifiers: rec.references.into_iter().map(|r| r.identifier).collect(),
            acknowledged: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn alert(id: &str, headline: &str) -> Alert {
        Alert {
            identifier: id.to_owned(),
            alert_type: "wx:Alert".to_owned(),
            sent_at: None,
            effective_until: None,
            onset: None,
            ends: None,
            expires: None,
            status: Some("Actual".to_owned()),
            message_type: AlertMessageType::Alert,
            severity: AlertSeverity::Severe,
            category: None,
            certainty: None,
            urgency: None,
            event: Some("Red Flag Warning".to_owned()),
            headline: Some(headline.to_owned()),
            sender: None,
            area_description: None,
            detail: None,
            instruction: None,
            reference_identifiers: Vec::new(),
            acknowledged: false,
        }
    }

    #[test]
    fn same_hazard_ignores_content_drift() {
        let a = alert("A1", "headline one");
        let b = alert("A1", "headline two");
        assert!(a.same_hazard(&b));
        assert!(!a.content_matches(&b));
    }

    #[test]
    fn content_matches_ignores_acknowledged() {
        let a = alert("A1", "headline");
        let mut b = alert("A1", "headline");
        b.acknowledge();
        assert!(a.content_matches(&b));
    }

    #[test]
    fn acknowledge_is_idempotent() {
        let mut a = alert("A1", "headline");
        assert!(a.acknowledge());
        assert!(!a.acknowledge());
        assert!(a.acknowledged);
    }

    #[test]
    fn severity_orders_by_weight() {
        assert!(AlertSeverity::Extreme > AlertSeverity::Severe);
        assert!(AlertSeverity::Minor > AlertSeverity::Unknown);
    }
}
