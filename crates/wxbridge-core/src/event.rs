//! Events broadcast by the poll supervisor.

use std::sync::Arc;

use uuid::Uuid;

use crate::model::{AlertKey, Bridge, ForecastModel};

/// Something observable happened to a registered bridge.
///
/// Snapshots are `Arc`-shared immutable copies published at poll-cycle
/// boundaries; late or slow receivers never see a half-applied cycle.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// An observation or system poll cycle applied new readings.
    ObservationUpdated {
        bridge_id: Uuid,
        snapshot: Arc<Bridge>,
    },
    /// The active alert list changed after reconciliation.
    AlertsChanged {
        bridge_id: Uuid,
        snapshot: Arc<Bridge>,
        /// Alerts needing the user's attention (new or changed content).
        newly_unacknowledged: Vec<AlertKey>,
    },
    /// A forecast refresh finished, successfully or not.
    ForecastUpdated {
        bridge_id: Uuid,
        result: Result<Arc<ForecastModel>, String>,
    },
}

impl BridgeEvent {
    pub fn bridge_id(&self) -> Uuid {
        match self {
            Self::ObservationUpdated { bridge_id, .. }
            | Self::AlertsChanged { bridge_id, .. }
            | Self::ForecastUpdated { bridge_id, .. } => *bridge_id,
        }
    }
}
