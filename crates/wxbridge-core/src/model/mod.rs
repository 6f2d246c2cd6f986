// ── Domain model ──
//
// Canonical types for bridges, sensors, measurements, hazard alerts,
// and forecast models. Converted from `wxbridge-api` wire types; owned
// and mutated exclusively by the poll supervisor.

pub mod alert;
pub mod bridge;
pub mod forecast;
pub mod observation;
pub mod sensor;
pub mod unit;

pub use alert::{Alert, AlertKey, AlertMessageType, AlertSeverity};
pub use bridge::Bridge;
pub use forecast::{CountryModel, ForecastModel, GridLocation};
pub use observation::Observation;
pub use sensor::{CategoryDescriptor, Sensor, SensorCategory};
pub use unit::Unit;

/// Battery health for a sensor, decoded by the protocol codec.
pub use wxbridge_api::template::BatteryHealth as BatteryStatus;
