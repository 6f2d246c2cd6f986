//! Reconciliation between locally held alerts and a freshly fetched
//! batch.
//!
//! The rules are deliberately asymmetric: a failed fetch (`None`)
//! changes nothing, an explicit empty batch clears everything, and a
//! non-empty batch only ever adds or replaces — alerts missing from it
//! are retained so a provider that momentarily drops an entry does not
//! flap a hazard in and out of view.

use tracing::debug;

use crate::model::{Alert, AlertKey};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Whether the alert list changed at all.
    pub changed: bool,
    /// Keys of alerts that are new or whose content changed, in batch
    /// order. These need the user's attention again.
    pub newly_unacknowledged: Vec<AlertKey>,
}

/// Merge a fetched batch into the locally held alert list.
pub fn reconcile(existing: &mut Vec<Alert>, fetched: Option<Vec<Alert>>) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    let Some(batch) = fetched else {
        // Fetch failed upstream. Keep what we have.
        return outcome;
    };

    if batch.is_empty() {
        if !existing.is_empty() {
            debug!(cleared = existing.len(), "provider reports no active alerts");
            existing.clear();
            outcome.changed = true;
        }
        return outcome;
    }

    for fresh in batch {
        match existing.iter().position(|held| held.same_hazard(&fresh)) {
            Some(idx) => {
                if existing[idx].content_matches(&fresh) {
                    continue;
                }
                // Content drifted: the old record (and its acknowledged
                // flag) no longer applies.
                outcome.newly_unacknowledged.push(fresh.key());
                existing.remove(idx);
                existing.push(fresh);
                outcome.changed = true;
            }
            None => {
                outcome.newly_unacknowledged.push(fresh.key());
                existing.push(fresh);
                outcome.changed = true;
            }
        }
    }

    outcome
}
