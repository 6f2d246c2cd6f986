// ── Measurement units ──

use serde::{Deserialize, Serialize};

/// One measurement unit a sensor can report in.
///
/// The parameter codes are the device-side identifiers the template
/// protocol uses to request current, daily-max, and daily-min values in
/// this unit. At most one unit per sensor is current at a time; the
/// invariant is maintained by [`Sensor::set_current_unit`]
/// (`crate::model::Sensor::set_current_unit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Human-readable unit name, unique within a sensor ("celsius").
    pub name: String,
    /// Device parameter code for the current value ("th0temp-act.1:--").
    pub parameter_code: String,
    /// Device parameter code for the daily maximum, if the device tracks one.
    pub max_parameter_code: Option<String>,
    /// Device parameter code for the daily minimum, if the device tracks one.
    pub min_parameter_code: Option<String>,
    /// Display suffix ("°C", "hPa", "mm/h").
    pub display: String,
    /// Whether this is the factory-default unit for the sensor.
    pub is_default: bool,
    /// Whether this unit is currently selected for polling.
    pub is_current: bool,
}

impl Unit {
    /// Convenience constructor for a non-current, non-default unit.
    pub fn new(
        name: impl Into<String>,
        parameter_code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_code: parameter_code.into(),
            max_parameter_code: None,
            min_parameter_code: None,
            display: display.into(),
            is_default: false,
            is_current: false,
        }
    }

    pub fn with_range_codes(
        mut self,
        max_code: impl Into<String>,
        min_code: impl Into<String>,
    ) -> Self {
        self.max_parameter_code = Some(max_code.into());
        self.min_parameter_code = Some(min_code.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn as_current(mut self) -> Self {
        self.is_current = true;
        self
    }
}
