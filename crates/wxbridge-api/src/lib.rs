//! Transport and protocol layer for wxbridge.
//!
//! Two independent network surfaces live here:
//!
//! - **[`BridgeClient`]** — polls an embedded weather-station gateway over
//!   its compact template protocol (HTTP GET, delimited plain text). The
//!   codec lives in [`template`]: request templates are encoded from sensor
//!   descriptors and responses are decoded into [`template::RawReading`]s.
//! - **[`WeatherClient`]** — talks to the national weather service:
//!   reverse geocoding, point metadata (forecast endpoints, zone and radar
//!   identifiers), zone boundary polygons, and active hazard alerts.
//!
//! Neither client knows about domain types; `wxbridge-core` converts the
//! raw readings and records returned here into its canonical model.

pub mod bridge;
pub mod error;
pub mod template;
pub mod transport;
pub mod weather;

pub use bridge::BridgeClient;
pub use error::Error;
pub use template::{BatteryHealth, PollResponse, RawReading, SensorTemplate, TemplateKind};
pub use transport::TransportConfig;
pub use weather::WeatherClient;
pub use weather::models::{AlertRecord, GeocodeResult, PointInfo, ZoneInfo};
