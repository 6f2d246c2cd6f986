// ── Bridge registry entry ──

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::alert::Alert;
use super::forecast::ForecastModel;
use super::sensor::{Sensor, SensorCategory};

/// System parameter names carrying the device's GPS fix.
pub const LATITUDE_SENSOR: &str = "latitude";
pub const LONGITUDE_SENSOR: &str = "longitude";

/// One weather-station gateway and everything tracked for it.
///
/// The canonical instance is owned by the poll supervisor; everyone else
/// sees `Arc<Bridge>` snapshots published at poll-cycle boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    pub unique_id: Uuid,
    pub display_name: String,
    pub ip_address: String,
    pub observation_interval: Duration,
    pub alert_interval: Duration,
    /// Sensors grouped by category, iteration-ordered for display.
    pub sensors_by_category: BTreeMap<SensorCategory, Vec<Sensor>>,
    /// ISO country code from configuration, refined by reverse geocoding.
    pub country_code: String,
    pub forecast_model: Option<ForecastModel>,
    pub active_alerts: Vec<Alert>,
    /// Coordinates to use until the device reports a GPS fix.
    pub fallback_coordinates: (f64, f64),
}

impl Bridge {
    pub fn new(
        unique_id: Uuid,
        display_name: impl Into<String>,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            unique_id,
            display_name: display_name.into(),
            ip_address: ip_address.into(),
            observation_interval: Duration::from_secs(60),
            alert_interval: Duration::from_secs(300),
            sensors_by_category: BTreeMap::new(),
            country_code: String::new(),
            forecast_model: None,
            active_alerts: Vec::new(),
            fallback_coordinates: (0.0, 0.0),
        }
    }

    pub fn add_sensor(&mut self, sensor: Sensor) {
        self.sensors_by_category
            .entry(sensor.category)
            .or_default()
            .push(sensor);
    }

    /// Linear scan by name across every category. Sensor counts are tiny
    /// (tens at most), so no index is kept.
    pub fn find_sensor(&self, name: &str) -> Option<&Sensor> {
        self.sensors_by_category
            .values()
            .flatten()
            .find(|s| s.name == name)
    }

    pub fn find_sensor_mut(&mut self, name: &str) -> Option<&mut Sensor> {
        self.sensors_by_category
            .values_mut()
            .flatten()
            .find(|s| s.name == name)
    }

    pub fn total_sensor_count(&self) -> usize {
        self.sensors_by_category.values().map(Vec::len).sum()
    }

    /// All sensors, category order.
    pub fn sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors_by_category.values().flatten()
    }

    /// `(latitude, longitude)` from the device's GPS system parameters.
    ///
    /// Falls back to the configured coordinates (with a warning) while
    /// the device has not reported a fix or reports the no-data
    /// sentinel.
    pub fn coordinates(&self) -> (f64, f64) {
        let lat = self
            .find_sensor(LATITUDE_SENSOR)
            .and_then(|s| s.current_observation.as_f64());
        let lon = self
            .find_sensor(LONGITUDE_SENSOR)
            .and_then(|s| s.current_observation.as_f64());
        if let (Some(lat), Some(lon)) = (lat, lon) {
            (lat, lon)
        } else {
            warn!(
                bridge = %self.display_name,
                "no GPS fix from device, using configured coordinates"
            );
            self.fallback_coordinates
        }
    }

    /// Templates for every sensor flagged for observation.
    pub fn observation_templates(&self) -> Vec<wxbridge_api::SensorTemplate> {
        self.sensors()
            .filter(|s| !s.is_system())
            .map(Sensor::to_template)
            .collect()
    }

    /// Templates for the system parameters.
    pub fn system_templates(&self) -> Vec<wxbridge_api::SensorTemplate> {
        self.sensors()
            .filter(|s| s.is_system())
            .map(Sensor::to_template)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::Unit;

    fn bridge_with_gps(lat: &str, lon: &str) -> Bridge {
        let mut bridge = Bridge::new(Uuid::new_v4(), "garden", "192.168.1.50");
        bridge.fallback_coordinates = (35.19, -111.65);
        for (name, value) in [(LATITUDE_SENSOR, lat), (LONGITUDE_SENSOR, lon)] {
            let mut sensor = Sensor::new(name, SensorCategory::System, "sysbat");
            sensor.add_unit(Unit::new("degrees", name, "°"));
            sensor.current_observation.replace(value, Utc::now());
            bridge.add_sensor(sensor);
        }
        bridge
    }

    #[test]
    fn coordinates_prefer_device_fix() {
        let bridge = bridge_with_gps("35.2001", "-111.6512");
        assert_eq!(bridge.coordinates(), (35.2001, -111.6512));
    }

    #[test]
    fn coordinates_fall_back_on_sentinel() {
        let bridge = bridge_with_gps("--", "-111.6512");
        assert_eq!(bridge.coordinates(), (35.19, -111.65));
    }

    #[test]
    fn find_sensor_scans_all_categories() {
        let mut bridge = bridge_with_gps("35.2", "-111.6");
        let mut rain = Sensor::new("rain0total", SensorCategory::Rain, "rain0lowbat");
        rain.add_unit(Unit::new("millimeters", "rain0total-act", "mm"));
        bridge.add_sensor(rain);

        assert!(bridge.find_sensor("rain0total").is_some());
        assert!(bridge.find_sensor("missing").is_none());
        assert_eq!(bridge.total_sensor_count(), 3);
    }

    #[test]
    fn templates_split_by_kind() {
        let mut bridge = bridge_with_gps("35.2", "-111.6");
        let mut rain = Sensor::new("rain0total", SensorCategory::Rain, "rain0lowbat");
        rain.add_unit(Unit::new("millimeters", "rain0total-act", "mm"));
        bridge.add_sensor(rain);

        assert_eq!(bridge.observation_templates().len(), 1);
        assert_eq!(bridge.system_templates().len(), 2);
    }
}
