//! Shared configuration for the wxbridge tools.
//!
//! TOML profiles loaded through figment (defaults, file, environment),
//! plus translation from bridge profiles to `wxbridge_core` domain
//! types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use wxbridge_core::{Bridge, Sensor, SensorCategory, Unit};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// Configured bridges.
    #[serde(default)]
    pub bridges: Vec<BridgeProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_observation_interval")]
    pub observation_interval_secs: u64,

    #[serde(default = "default_alert_interval")]
    pub alert_interval_secs: u64,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Country assumed until reverse geocoding refines it.
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            observation_interval_secs: default_observation_interval(),
            alert_interval_secs: default_alert_interval(),
            timeout_secs: default_timeout(),
            country: default_country(),
        }
    }
}

fn default_observation_interval() -> u64 {
    60
}
fn default_alert_interval() -> u64 {
    300
}
fn default_timeout() -> u64 {
    15
}
fn default_country() -> String {
    "US".into()
}

/// One configured bridge.
#[derive(Debug, Deserialize, Serialize)]
pub struct BridgeProfile {
    pub name: String,

    /// Bridge IP address or host:port.
    pub ip: String,

    /// Stable identifier; generated when absent (re-registration then
    /// treats the bridge as new).
    pub id: Option<Uuid>,

    /// Coordinates used until the device reports a GPS fix.
    pub latitude: f64,
    pub longitude: f64,

    pub observation_interval_secs: Option<u64>,
    pub alert_interval_secs: Option<u64>,

    #[serde(default)]
    pub sensors: Vec<SensorProfile>,
}

/// One sensor on a bridge.
#[derive(Debug, Deserialize, Serialize)]
pub struct SensorProfile {
    pub name: String,

    /// Category: temperature, humidity, pressure, rain, solar, wind,
    /// energy, system.
    pub category: String,

    #[serde(default)]
    pub info: String,

    /// Overrides the category's default placement.
    pub outdoor: Option<bool>,

    /// Device parameter code for the battery rail.
    pub battery_code: String,

    /// Whether this sensor is polled.
    #[serde(default)]
    pub observed: bool,

    /// Name of the unit to observe in; the first configured unit when
    /// absent.
    pub unit: Option<String>,

    #[serde(default)]
    pub units: Vec<UnitProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UnitProfile {
    pub name: String,
    pub code: String,
    pub max_code: Option<String>,
    pub min_code: Option<String>,
    #[serde(default)]
    pub display: String,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "wxbridge", "wxbridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wxbridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a Config from an explicit file path (still layered with
/// defaults and `WXBRIDGE_*` environment overrides).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WXBRIDGE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Translation to domain types ─────────────────────────────────────

/// Per-request HTTP timeout from the defaults section.
pub fn timeout(defaults: &Defaults) -> Duration {
    Duration::from_secs(defaults.timeout_secs)
}

/// Build a domain [`Bridge`] from a configured profile.
pub fn bridge_from_profile(
    profile: &BridgeProfile,
    defaults: &Defaults,
) -> Result<Bridge, ConfigError> {
    let observation_secs = profile
        .observation_interval_secs
        .unwrap_or(defaults.observation_interval_secs);
    let alert_secs = profile
        .alert_interval_secs
        .unwrap_or(defaults.alert_interval_secs);
    for (field, secs) in [
        ("observation_interval_secs", observation_secs),
        ("alert_interval_secs", alert_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::Validation {
                field: field.into(),
                reason: "interval must be at least one second".into(),
            });
        }
    }

    let mut bridge = Bridge::new(
        profile.id.unwrap_or_else(Uuid::new_v4),
        profile.name.clone(),
        profile.ip.clone(),
    );
    bridge.observation_interval = Duration::from_secs(observation_secs);
    bridge.alert_interval = Duration::from_secs(alert_secs);
    bridge.country_code = defaults.country.clone();
    bridge.fallback_coordinates = (profile.latitude, profile.longitude);

    for sensor_profile in &profile.sensors {
        bridge.add_sensor(sensor_from_profile(sensor_profile)?);
    }
    Ok(bridge)
}

fn sensor_from_profile(profile: &SensorProfile) -> Result<Sensor, ConfigError> {
    let category = parse_category(&profile.category)?;
    let mut sensor = Sensor::new(&profile.name, category, &profile.battery_code);
    sensor.info.clone_from(&profile.info);
    if let Some(outdoor) = profile.outdoor {
        sensor.is_outdoor = outdoor;
    }
    sensor.is_observing = profile.observed;

    for unit_profile in &profile.units {
        let mut unit = Unit::new(&unit_profile.name, &unit_profile.code, &unit_profile.display);
        if let (Some(max), Some(min)) = (&unit_profile.max_code, &unit_profile.min_code) {
            unit = unit.with_range_codes(max, min);
        }
        sensor.add_unit(unit);
    }

    if let Some(ref unit_name) = profile.unit {
        sensor
            .set_current_unit(unit_name)
            .map_err(|_| ConfigError::Validation {
                field: format!("sensors.{}.unit", profile.name),
                reason: format!("sensor does not support unit {unit_name:?}"),
            })?;
    }
    Ok(sensor)
}

fn parse_category(raw: &str) -> Result<SensorCategory, ConfigError> {
    let category = match raw.to_ascii_lowercase().as_str() {
        "energy" => SensorCategory::Energy,
        "humidity" => SensorCategory::Humidity,
        "temperature" => SensorCategory::Temperature,
        "pressure" => SensorCategory::Pressure,
        "rain" => SensorCategory::Rain,
        "solar" => SensorCategory::Solar,
        "wind" => SensorCategory::Wind,
        "system" => SensorCategory::System,
        other => {
            return Err(ConfigError::Validation {
                field: "category".into(),
                reason: format!("unknown sensor category {other:?}"),
            });
        }
    };
    Ok(category)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    const SAMPLE: &str = r#"
[defaults]
observation_interval_secs = 30
country = "US"

[[bridges]]
name = "garden"
ip = "192.168.1.50"
id = "6f2c5b7e-3f24-4d52-9f0e-8b6f3c1d2a4b"
latitude = 35.19
longitude = -111.65
alert_interval_secs = 120

[[bridges.sensors]]
name = "th0temp"
category = "temperature"
battery_code = "th0lowbat"
observed = true
unit = "fahrenheit"

[[bridges.sensors.units]]
name = "celsius"
code = "th0temp-act"
max_code = "th0temp-max"
min_code = "th0temp-min"
display = "°C"

[[bridges.sensors.units]]
name = "fahrenheit"
code = "th0temp-act.1"
max_code = "th0temp-max.1"
min_code = "th0temp-min.1"
display = "°F"
"#;

    fn write_sample() -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_layered_config() {
        let file = write_sample();
        let config = load_config_from(file.path()).unwrap();

        assert_eq!(config.defaults.observation_interval_secs, 30);
        // Untouched defaults survive the merge.
        assert_eq!(config.defaults.alert_interval_secs, 300);
        assert_eq!(config.bridges.len(), 1);
        assert_eq!(config.bridges[0].name, "garden");
    }

    #[test]
    fn profile_translates_to_domain_bridge() {
        let file = write_sample();
        let config = load_config_from(file.path()).unwrap();
        let bridge = bridge_from_profile(&config.bridges[0], &config.defaults).unwrap();

        assert_eq!(bridge.display_name, "garden");
        assert_eq!(bridge.observation_interval, Duration::from_secs(30));
        assert_eq!(bridge.alert_interval, Duration::from_secs(120));
        assert_eq!(bridge.fallback_coordinates, (35.19, -111.65));

        let sensor = bridge.find_sensor("th0temp").unwrap();
        assert!(sensor.is_observing);
        assert_eq!(sensor.current_unit().unwrap().name, "fahrenheit");
    }

    #[test]
    fn unknown_category_is_a_validation_error() {
        let profile = SensorProfile {
            name: "x".into(),
            category: "gravity".into(),
            info: String::new(),
            outdoor: None,
            battery_code: "b".into(),
            observed: false,
            unit: None,
            units: Vec::new(),
        };
        let err = sensor_from_profile(&profile).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn unsupported_unit_choice_is_a_validation_error() {
        let file = write_sample();
        let mut config = load_config_from(file.path()).unwrap();
        config.bridges[0].sensors[0].unit = Some("kelvin".into());

        let err = bridge_from_profile(&config.bridges[0], &config.defaults).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
