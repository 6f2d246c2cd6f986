// ── Poll supervisor ──
//
// Full lifecycle management for registered bridges. Spawns the
// per-bridge poll timers, owns the canonical bridge state, applies poll
// results, and publishes snapshots and events for consumers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wxbridge_api::transport::TransportConfig;
use wxbridge_api::{BridgeClient, PollResponse, RawReading, WeatherClient};

use crate::alerts;
use crate::error::CoreError;
use crate::event::BridgeEvent;
use crate::forecast::build_forecast_model;
use crate::model::{Alert, AlertKey, Bridge};

const EVENT_CHANNEL_SIZE: usize = 256;
const ERROR_CHANNEL_SIZE: usize = 64;

// ── Poll errors ──────────────────────────────────────────────────

/// Which recurring activity a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Observation,
    Alert,
    Forecast,
}

/// A per-tick failure, reported out-of-band. The cadence is unaffected:
/// the next scheduled tick retries implicitly, there is no backoff.
#[derive(Debug, Clone)]
pub struct PollError {
    pub bridge_id: Uuid,
    pub kind: PollKind,
    pub error: Arc<CoreError>,
}

// ── Bridge handle ────────────────────────────────────────────────

struct BridgeState {
    bridge: Bridge,
    /// Unknown sensor names already reported, so a stale capability
    /// manifest surfaces once per name instead of once per tick.
    warned_unknown: HashSet<String>,
}

/// Shared state for one registered bridge.
///
/// The canonical [`Bridge`] lives behind the mutex and is only mutated
/// by the poll tasks; consumers read `Arc<Bridge>` snapshots published
/// on the watch channel at poll-cycle boundaries.
pub struct BridgeHandle {
    id: Uuid,
    state: Mutex<BridgeState>,
    snapshot_tx: watch::Sender<Arc<Bridge>>,
    observation_in_flight: AtomicBool,
    alert_in_flight: AtomicBool,
}

impl BridgeHandle {
    fn new(bridge: Bridge) -> Self {
        let id = bridge.unique_id;
        let (snapshot_tx, _) = watch::channel(Arc::new(bridge.clone()));
        Self {
            id,
            state: Mutex::new(BridgeState {
                bridge,
                warned_unknown: HashSet::new(),
            }),
            snapshot_tx,
            observation_in_flight: AtomicBool::new(false),
            alert_in_flight: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to consistent snapshots of this bridge.
    pub fn watch(&self) -> watch::Receiver<Arc<Bridge>> {
        self.snapshot_tx.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Bridge> {
        self.snapshot_tx.borrow().clone()
    }

    /// Publish the current canonical state as a new snapshot.
    fn publish(&self, state: &BridgeState) -> Arc<Bridge> {
        let snapshot = Arc::new(state.bridge.clone());
        self.snapshot_tx.send_replace(Arc::clone(&snapshot));
        snapshot
    }
}

/// RAII in-flight marker. Released on drop, which also covers the poll
/// future being dropped by cancellation mid-request — a cancelled poll
/// never leaves the flag stuck.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn try_begin(flag: &AtomicBool) -> Option<InFlightGuard<'_>> {
    if flag
        .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
        .is_ok()
    {
        Some(InFlightGuard(flag))
    } else {
        None
    }
}

// ── Supervisor ───────────────────────────────────────────────────

struct Registration {
    handle: Arc<BridgeHandle>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Central facade managing all registered bridges.
///
/// Cheaply cloneable via `Arc`. Each registered bridge gets one
/// observation poll task and one alert poll task, both firing
/// immediately and then at the bridge's configured cadence, plus a
/// one-shot forecast model build.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    bridge_transport: TransportConfig,
    weather: WeatherClient,
    event_tx: broadcast::Sender<BridgeEvent>,
    error_tx: broadcast::Sender<PollError>,
    cancel: CancellationToken,
    bridges: Mutex<HashMap<Uuid, Registration>>,
}

impl Supervisor {
    pub fn new(bridge_transport: TransportConfig, weather: WeatherClient) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (error_tx, _) = broadcast::channel(ERROR_CHANNEL_SIZE);
        Self {
            inner: Arc::new(SupervisorInner {
                bridge_transport,
                weather,
                event_tx,
                error_tx,
                cancel: CancellationToken::new(),
                bridges: Mutex::new(HashMap::new()),
            }),
        }
    }

    // ── Registration lifecycle ───────────────────────────────────

    /// Register a bridge and start polling it.
    ///
    /// Re-registering an id already present fully cancels and joins the
    /// previous timers first — exactly one observation timer and one
    /// alert timer exist per bridge at any time. Ticks are consumed but
    /// skipped while `reachability` reads `false`.
    pub async fn register(
        &self,
        bridge: Bridge,
        reachability: watch::Receiver<bool>,
    ) -> Result<Arc<BridgeHandle>, CoreError> {
        let id = bridge.unique_id;
        let client = BridgeClient::new(&bridge.ip_address, &self.inner.bridge_transport)?;

        let mut bridges = self.inner.bridges.lock().await;
        if let Some(previous) = bridges.remove(&id) {
            info!(bridge_id = %id, "re-registering: cancelling previous timers");
            previous.cancel.cancel();
            for task in previous.tasks {
                let _ = task.await;
            }
        }

        let handle = Arc::new(BridgeHandle::new(bridge));
        let cancel = self.inner.cancel.child_token();
        let mut tasks = Vec::with_capacity(3);

        tasks.push(tokio::spawn(observation_poll_task(
            self.clone(),
            Arc::clone(&handle),
            client,
            cancel.clone(),
            reachability.clone(),
        )));
        tasks.push(tokio::spawn(alert_poll_task(
            self.clone(),
            Arc::clone(&handle),
            cancel.clone(),
            reachability,
        )));
        tasks.push(tokio::spawn(forecast_refresh_task(
            self.clone(),
            Arc::clone(&handle),
            cancel.clone(),
        )));

        bridges.insert(
            id,
            Registration {
                handle: Arc::clone(&handle),
                cancel,
                tasks,
            },
        );
        info!(bridge_id = %id, "bridge registered");
        Ok(handle)
    }

    /// Stop polling a bridge and drop its state.
    pub async fn deregister(&self, id: Uuid) -> Result<(), CoreError> {
        let registration = self
            .inner
            .bridges
            .lock()
            .await
            .remove(&id)
            .ok_or(CoreError::BridgeNotRegistered(id))?;

        registration.cancel.cancel();
        for task in registration.tasks {
            let _ = task.await;
        }
        info!(bridge_id = %id, "bridge deregistered");
        Ok(())
    }

    /// Cancel every poll task and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut bridges = self.inner.bridges.lock().await;
        for (_, registration) in bridges.drain() {
            for task in registration.tasks {
                let _ = task.await;
            }
        }
        debug!("supervisor shut down");
    }

    // ── Operations ───────────────────────────────────────────────

    /// Rebuild the forecast model for a bridge, independent of timers.
    pub async fn refresh_forecast(&self, id: Uuid) -> Result<(), CoreError> {
        let (handle, cancel) = {
            let bridges = self.inner.bridges.lock().await;
            let registration = bridges.get(&id).ok_or(CoreError::BridgeNotRegistered(id))?;
            (
                Arc::clone(&registration.handle),
                registration.cancel.clone(),
            )
        };
        tokio::spawn(forecast_refresh_task(self.clone(), handle, cancel));
        Ok(())
    }

    /// Mark an alert as seen. Returns `true` if the flag actually
    /// flipped (first acknowledgement).
    pub async fn acknowledge_alert(&self, id: Uuid, key: &AlertKey) -> Result<bool, CoreError> {
        let handle = self.handle(id).await?;
        let mut state = handle.state.lock().await;

        let Some(alert) = state
            .bridge
            .active_alerts
            .iter_mut()
            .find(|a| a.key() == *key)
        else {
            return Ok(false);
        };

        let flipped = alert.acknowledge();
        if flipped {
            handle.publish(&state);
        }
        Ok(flipped)
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to bridge events.
    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Subscribe to per-tick poll failures.
    pub fn errors(&self) -> broadcast::Receiver<PollError> {
        self.inner.error_tx.subscribe()
    }

    /// Subscribe to snapshots of one bridge.
    pub async fn watch_bridge(&self, id: Uuid) -> Result<watch::Receiver<Arc<Bridge>>, CoreError> {
        Ok(self.handle(id).await?.watch())
    }

    /// The latest snapshot of one bridge.
    pub async fn snapshot(&self, id: Uuid) -> Result<Arc<Bridge>, CoreError> {
        Ok(self.handle(id).await?.snapshot())
    }

    /// Ids of all registered bridges.
    pub async fn bridge_ids(&self) -> Vec<Uuid> {
        self.inner.bridges.lock().await.keys().copied().collect()
    }

    async fn handle(&self, id: Uuid) -> Result<Arc<BridgeHandle>, CoreError> {
        self.inner
            .bridges
            .lock()
            .await
            .get(&id)
            .map(|r| Arc::clone(&r.handle))
            .ok_or(CoreError::BridgeNotRegistered(id))
    }

    fn report(&self, bridge_id: Uuid, kind: PollKind, error: CoreError) {
        warn!(bridge_id = %bridge_id, ?kind, error = %error, "poll failed");
        let _ = self.inner.error_tx.send(PollError {
            bridge_id,
            kind,
            error: Arc::new(error),
        });
    }
}

// ── Poll tasks ───────────────────────────────────────────────────

async fn observation_poll_task(
    supervisor: Supervisor,
    handle: Arc<BridgeHandle>,
    client: BridgeClient,
    cancel: CancellationToken,
    reachability: watch::Receiver<bool>,
) {
    let period = handle.state.lock().await.bridge.observation_interval;
    let mut interval = tokio::time::interval(period);
    // Drop ticks that pile up behind a slow poll instead of bursting.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !*reachability.borrow() {
                    debug!(bridge_id = %handle.id, "bridge unreachable, skipping observation tick");
                    continue;
                }
                let Some(_guard) = try_begin(&handle.observation_in_flight) else {
                    warn!(bridge_id = %handle.id, "observation poll still in flight, dropping tick");
                    continue;
                };
                // Cancellation mid-poll drops the cycle future: the
                // response, even if already received, is never applied.
                match cancel.run_until_cancelled(observation_cycle(&supervisor, &handle, &client)).await {
                    Some(Err(e)) => supervisor.report(handle.id, PollKind::Observation, e),
                    Some(Ok(())) => {}
                    None => break,
                }
            }
        }
    }
}

/// One observation poll cycle: collect templates under the lock, release
/// it for the network round-trips, then re-lock to apply and publish.
async fn observation_cycle(
    supervisor: &Supervisor,
    handle: &BridgeHandle,
    client: &BridgeClient,
) -> Result<(), CoreError> {
    let (observation_templates, system_templates) = {
        let state = handle.state.lock().await;
        (
            state.bridge.observation_templates(),
            state.bridge.system_templates(),
        )
    };

    let observations = client.poll_observations(&observation_templates, false).await?;
    let system = if system_templates.is_empty() {
        None
    } else {
        Some(client.poll_system(&system_templates).await?)
    };

    let (snapshot, unknown) = {
        let mut state = handle.state.lock().await;
        let mut unknown = apply_poll(&mut state, &observations);
        if let Some(system) = &system {
            unknown.extend(apply_poll(&mut state, system));
        }
        (handle.publish(&state), unknown)
    };

    // Unknown names are non-fatal per field; each distinct name is
    // reported once per registration, then silently skipped.
    for name in unknown {
        supervisor.report(handle.id, PollKind::Observation, CoreError::UnknownSensor(name));
    }

    let _ = supervisor.inner.event_tx.send(BridgeEvent::ObservationUpdated {
        bridge_id: handle.id,
        snapshot,
    });
    Ok(())
}

/// Apply decoded readings to the registry, returning unknown sensor
/// names seen for the first time. Known sensors get a full replace of
/// value, range, and battery state.
fn apply_poll(state: &mut BridgeState, response: &PollResponse) -> Vec<String> {
    let timestamp = response.timestamp;
    let mut newly_unknown = Vec::new();
    for reading in &response.readings {
        let name = reading.name();
        if state.bridge.find_sensor(name).is_none() {
            if state.warned_unknown.insert(name.to_owned()) {
                newly_unknown.push(name.to_owned());
            }
            continue;
        }
        // Presence checked above; re-borrow mutably to apply.
        let Some(sensor) = state.bridge.find_sensor_mut(name) else {
            continue;
        };
        match reading {
            RawReading::Weather {
                value,
                max,
                min,
                battery,
                ..
            } => {
                sensor.current_observation.replace(value.clone(), timestamp);
                sensor.max_observation.replace(max.clone(), timestamp);
                sensor.min_observation.replace(min.clone(), timestamp);
                sensor.battery_status = *battery;
            }
            RawReading::System { value, .. } => {
                sensor.current_observation.replace(value.clone(), timestamp);
            }
        }
    }
    newly_unknown
}

async fn alert_poll_task(
    supervisor: Supervisor,
    handle: Arc<BridgeHandle>,
    cancel: CancellationToken,
    reachability: watch::Receiver<bool>,
) {
    let period = handle.state.lock().await.bridge.alert_interval;
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !*reachability.borrow() {
                    debug!(bridge_id = %handle.id, "bridge unreachable, skipping alert tick");
                    continue;
                }
                let Some(_guard) = try_begin(&handle.alert_in_flight) else {
                    warn!(bridge_id = %handle.id, "alert poll still in flight, dropping tick");
                    continue;
                };
                if cancel.run_until_cancelled(alert_cycle(&supervisor, &handle)).await.is_none() {
                    break;
                }
            }
        }
    }
}

/// One alert poll cycle. A failed fetch reconciles as `None` (state
/// untouched) rather than an empty batch — only the provider explicitly
/// reporting "no active hazards" clears alerts.
async fn alert_cycle(supervisor: &Supervisor, handle: &BridgeHandle) {
    let (lat, lon) = handle.state.lock().await.bridge.coordinates();

    let fetched: Option<Vec<Alert>> =
        match supervisor.inner.weather.get_active_alerts(lat, lon).await {
            Ok(records) => Some(records.into_iter().map(Alert::from).collect()),
            Err(e) => {
                supervisor.report(handle.id, PollKind::Alert, e.into());
                None
            }
        };

    let mut state = handle.state.lock().await;
    let outcome = alerts::reconcile(&mut state.bridge.active_alerts, fetched);
    if !outcome.changed {
        return;
    }

    let snapshot = handle.publish(&state);
    drop(state);

    let _ = supervisor.inner.event_tx.send(BridgeEvent::AlertsChanged {
        bridge_id: handle.id,
        snapshot,
        newly_unacknowledged: outcome.newly_unacknowledged,
    });
}

/// One-shot forecast model build, cancellable alongside the poll tasks.
async fn forecast_refresh_task(
    supervisor: Supervisor,
    handle: Arc<BridgeHandle>,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        () = forecast_cycle(&supervisor, &handle) => {}
    }
}

async fn forecast_cycle(supervisor: &Supervisor, handle: &BridgeHandle) {
    let (lat, lon) = handle.state.lock().await.bridge.coordinates();

    let result = match build_forecast_model(&supervisor.inner.weather, lat, lon).await {
        Ok(model) => {
            let model = Arc::new(model);
            let mut state = handle.state.lock().await;
            state.bridge.forecast_model = Some((*model).clone());
            handle.publish(&state);
            Ok(model)
        }
        Err(e) => {
            let message = e.to_string();
            supervisor.report(handle.id, PollKind::Forecast, e);
            Err(message)
        }
    };

    let _ = supervisor.inner.event_tx.send(BridgeEvent::ForecastUpdated {
        bridge_id: handle.id,
        result,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);

        let guard = try_begin(&flag);
        assert!(guard.is_some());
        assert!(try_begin(&flag).is_none());

        drop(guard);
        assert!(try_begin(&flag).is_some());
    }
}
