// ── Sensors and categories ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use wxbridge_api::template::SensorTemplate;

use super::BatteryStatus;
use super::observation::Observation;
use super::unit::Unit;
use crate::error::CoreError;

/// Sensor category. Display/behavior differences between categories are
/// captured once in [`SensorCategory::descriptor`] instead of switches
/// scattered across consumers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum SensorCategory {
    Energy,
    Humidity,
    Temperature,
    Pressure,
    Rain,
    Solar,
    Wind,
    System,
    Unknown,
}

/// Display and behavior traits of a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryDescriptor {
    pub label: &'static str,
    /// Weather sensors use the 4-field template; system parameters the
    /// 2-field one, and they never carry units or min/max tracking.
    pub is_weather: bool,
    /// Whether sensors of this category sit outdoors by default.
    pub outdoor_default: bool,
}

impl SensorCategory {
    /// The single lookup table replacing per-consumer category switches.
    pub fn descriptor(self) -> &'static CategoryDescriptor {
        const ENERGY: CategoryDescriptor = CategoryDescriptor {
            label: "Energy",
            is_weather: true,
            outdoor_default: false,
        };
        const HUMIDITY: CategoryDescriptor = CategoryDescriptor {
            label: "Humidity",
            is_weather: true,
            outdoor_default: true,
        };
        const TEMPERATURE: CategoryDescriptor = CategoryDescriptor {
            label: "Temperature",
            is_weather: true,
            outdoor_default: true,
        };
        const PRESSURE: CategoryDescriptor = CategoryDescriptor {
            label: "Pressure",
            is_weather: true,
            outdoor_default: false,
        };
        const RAIN: CategoryDescriptor = CategoryDescriptor {
            label: "Rain",
            is_weather: true,
            outdoor_default: true,
        };
        const SOLAR: CategoryDescriptor = CategoryDescriptor {
            label: "Solar",
            is_weather: true,
            outdoor_default: true,
        };
        const WIND: CategoryDescriptor = CategoryDescriptor {
            label: "Wind",
            is_weather: true,
            outdoor_default: true,
        };
        const SYSTEM: CategoryDescriptor = CategoryDescriptor {
            label: "System",
            is_weather: false,
            outdoor_default: false,
        };
        const UNKNOWN: CategoryDescriptor = CategoryDescriptor {
            label: "Unknown",
            is_weather: false,
            outdoor_default: false,
        };

        match self {
            Self::Energy => &ENERGY,
            Self::Humidity => &HUMIDITY,
            Self::Temperature => &TEMPERATURE,
            Self::Pressure => &PRESSURE,
            Self::Rain => &RAIN,
            Self::Solar => &SOLAR,
            Self::Wind => &WIND,
            Self::System => &SYSTEM,
            Self::Unknown => &UNKNOWN,
        }
    }
}

/// A single measurable quantity on a bridge, or a system parameter.
///
/// The name doubles as the unique identifier within a device. Sensors
/// are created from the device's capability manifest and mutated in
/// place by poll results; consumers only ever observe the canonical
/// instance through bridge snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub category: SensorCategory,
    /// Informational text shown alongside the sensor.
    pub info: String,
    pub is_outdoor: bool,
    /// Device parameter code for the battery rail backing this sensor.
    pub battery_parameter_code: String,
    pub battery_status: BatteryStatus,
    /// Supported units, ordered as the capability manifest lists them.
    /// Non-empty for all weather categories; exactly one is current.
    pub supported_units: Vec<Unit>,
    pub current_observation: Observation,
    pub max_observation: Observation,
    pub min_observation: Observation,
    /// Whether the user selected this sensor for polling.
    pub is_observing: bool,
}

impl Sensor {
    pub fn new(
        name: impl Into<String>,
        category: SensorCategory,
        battery_parameter_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            info: String::new(),
            is_outdoor: category.descriptor().outdoor_default,
            battery_parameter_code: battery_parameter_code.into(),
            battery_status: BatteryStatus::Unknown,
            supported_units: Vec::new(),
            current_observation: Observation::default(),
            max_observation: Observation::default(),
            min_observation: Observation::default(),
            is_observing: false,
        }
    }

    /// Add a supported unit. The first unit added becomes current (and
    /// default) so the single-current invariant holds from the start.
    pub fn add_unit(&mut self, mut unit: Unit) {
        if self.supported_units.is_empty() {
            unit.is_current = true;
            unit.is_default = true;
        } else {
            unit.is_current = false;
        }
        self.supported_units.push(unit);
    }

    /// The currently selected unit, if any.
    pub fn current_unit(&self) -> Option<&Unit> {
        self.supported_units.iter().find(|u| u.is_current)
    }

    /// Select a different unit by name.
    ///
    /// Membership is checked before anything is cleared, so on failure
    /// the previous selection is untouched and exactly one unit remains
    /// current either way.
    pub fn set_current_unit(&mut self, unit_name: &str) -> Result<(), CoreError> {
        if !self.supported_units.iter().any(|u| u.name == unit_name) {
            return Err(CoreError::MissingUnit {
                sensor: self.name.clone(),
                unit: unit_name.to_owned(),
            });
        }
        for unit in &mut self.supported_units {
            unit.is_current = unit.name == unit_name;
        }
        Ok(())
    }

    /// `false` exactly when the current value is the device's "no data"
    /// sentinel (or no value has been observed yet).
    pub fn is_available(&self) -> bool {
        self.current_observation.is_available()
    }

    pub fn is_system(&self) -> bool {
        !self.category.descriptor().is_weather
    }

    /// Template descriptor for the codec. A weather sensor with no
    /// current unit yields `parameter_code: None` and contributes
    /// nothing to the encoded template.
    pub fn to_template(&self) -> SensorTemplate {
        let current = self.current_unit();
        SensorTemplate {
            name: self.name.clone(),
            parameter_code: current.map(|u| u.parameter_code.clone()),
            max_parameter_code: current.and_then(|u| u.max_parameter_code.clone()),
            min_parameter_code: current.and_then(|u| u.min_parameter_code.clone()),
            battery_parameter_code: self.battery_parameter_code.clone(),
            is_observing: self.is_observing,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_sensor() -> Sensor {
        let mut sensor = Sensor::new("th0temp", SensorCategory::Temperature, "th0lowbat");
        sensor.add_unit(
            Unit::new("celsius", "th0temp-act", "°C")
                .with_range_codes("th0temp-max", "th0temp-min"),
        );
        sensor.add_unit(
            Unit::new("fahrenheit", "th0temp-act.1", "°F")
                .with_range_codes("th0temp-max.1", "th0temp-min.1"),
        );
        sensor
    }

    fn current_count(sensor: &Sensor) -> usize {
        sensor.supported_units.iter().filter(|u| u.is_current).count()
    }

    #[test]
    fn first_unit_becomes_current_and_default() {
        let sensor = temp_sensor();
        assert_eq!(current_count(&sensor), 1);
        assert_eq!(sensor.current_unit().unwrap().name, "celsius");
        assert!(sensor.current_unit().unwrap().is_default);
    }

    #[test]
    fn set_current_unit_moves_selection() {
        let mut sensor = temp_sensor();
        sensor.set_current_unit("fahrenheit").unwrap();
        assert_eq!(current_count(&sensor), 1);
        assert_eq!(sensor.current_unit().unwrap().name, "fahrenheit");
    }

    #[test]
    fn set_current_unit_failure_preserves_invariant() {
        let mut sensor = temp_sensor();
        let err = sensor.set_current_unit("kelvin").unwrap_err();
        assert!(matches!(err, CoreError::MissingUnit { .. }));
        // Old selection untouched, still exactly one current.
        assert_eq!(current_count(&sensor), 1);
        assert_eq!(sensor.current_unit().unwrap().name, "celsius");
    }

    #[test]
    fn template_reflects_current_unit() {
        let mut sensor = temp_sensor();
        sensor.set_current_unit("fahrenheit").unwrap();
        let tmpl = sensor.to_template();
        assert_eq!(tmpl.parameter_code.as_deref(), Some("th0temp-act.1"));
        assert_eq!(tmpl.max_parameter_code.as_deref(), Some("th0temp-max.1"));
    }

    #[test]
    fn system_category_is_not_weather() {
        assert!(!SensorCategory::System.descriptor().is_weather);
        assert!(SensorCategory::Rain.descriptor().is_weather);
    }
}
