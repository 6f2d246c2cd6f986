// ── Forecast models ──

use serde::{Deserialize, Serialize};

/// Country-specific forecast data.
///
/// Only the United States has a supported provider today; the enum
/// leaves room for other national services without touching the common
/// fields on [`ForecastModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CountryModel {
    UnitedStates {
        forecast_zone_id: String,
        county_zone_id: String,
        radar_station_id: String,
        /// County boundary as `(latitude, longitude)` pairs.
        county_polygon: Vec<(f64, f64)>,
        /// Forecast grid identity: office id plus grid x/y.
        grid: GridLocation,
    },
}

/// Forecast office grid cell covering the bridge's location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLocation {
    pub office_id: String,
    pub x: u32,
    pub y: u32,
}

/// Assembled forecast context for a bridge location.
///
/// Built in one pass by the forecast orchestrator; either every field is
/// populated from a fully successful pipeline or no model exists at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub closest_city: String,
    pub forecast_url: String,
    pub forecast_hourly_url: String,
    /// Forecast zone boundary as `(latitude, longitude)` pairs.
    pub boundary_polygon: Vec<(f64, f64)>,
    pub country: CountryModel,
}

impl ForecastModel {
    /// Zone id used for alert attribution, when the country model has one.
    pub fn county_zone_id(&self) -> Option<&str> {
        match &self.country {
            CountryModel::UnitedStates { county_zone_id, .. } => Some(county_zone_id),
        }
    }
}
