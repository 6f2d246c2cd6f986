//! Domain layer between `wxbridge-api` and UI consumers.
//!
//! This crate owns the business logic and domain model for the wxbridge
//! workspace:
//!
//! - **[`Supervisor`]** — central facade managing registered bridges.
//!   [`register()`](Supervisor::register) spawns one observation poll task
//!   and one alert poll task per bridge (immediate first poll, then fixed
//!   cadence), plus a one-shot forecast model build. Re-registering a
//!   bridge fully cancels the previous pair of timers first.
//!
//! - **Domain model** ([`model`]) — [`Bridge`] with its categorized
//!   sensor registry, [`Sensor`]/[`Unit`]/[`Observation`] measurement
//!   types, [`Alert`] with acknowledge-once semantics, and the atomically
//!   assembled [`ForecastModel`].
//!
//! - **[`alerts::reconcile`]** — diff/merge of freshly fetched hazard
//!   alert batches into the locally tracked set. A failed fetch (`None`)
//!   leaves state untouched; an empty batch clears it.
//!
//! - **[`forecast::build_forecast_model`]** — the sequential
//!   geocode → point → zone pipeline, short-circuiting on first error.
//!
//! - **[`BridgeEvent`]** — broadcast surface for the (external) UI layer:
//!   observation updates, alert changes, forecast results.
//!
//! Consumers never mutate a bridge directly: all mutation happens on the
//! poll tasks that own it, and reads go through `watch`-published
//! [`std::sync::Arc`]`<Bridge>` snapshots taken at poll-cycle boundaries.

pub mod alerts;
pub mod error;
pub mod event;
pub mod forecast;
pub mod model;
pub mod supervisor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use event::BridgeEvent;
pub use supervisor::{BridgeHandle, PollError, PollKind, Supervisor};

pub use model::{
    Alert,
    AlertKey,
    AlertMessageType,
    AlertSeverity,
    BatteryStatus,
    Bridge,
    CategoryDescriptor,
    CountryModel,
    ForecastModel,
    Observation,
    Sensor,
    SensorCategory,
    Unit,
};
