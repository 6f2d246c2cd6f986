//! Forecast model assembly.
//!
//! Chains the weather service lookups for a coordinate into a complete
//! [`ForecastModel`]. The chain is strictly sequential and
//! short-circuits: the first failing step's error propagates and nothing
//! partial is ever returned.

use tracing::{debug, info};

use wxbridge_api::WeatherClient;

use crate::error::CoreError;
use crate::model::{CountryModel, ForecastModel, GridLocation};

/// Countries with a supported forecast provider.
pub const SUPPORTED_COUNTRIES: &[&str] = &["US"];

/// Build the forecast model for a coordinate.
///
/// Steps: reverse geocode, country support check, point metadata, zone
/// polygons, assembly. An unsupported country yields
/// [`CoreError::UnknownModel`] before any provider traffic.
pub async fn build_forecast_model(
    weather: &WeatherClient,
    lat: f64,
    lon: f64,
) -> Result<ForecastModel, CoreError> {
    let geo = weather.reverse_geocode(lat, lon).await?;
    debug!(country = %geo.country_code, "reverse geocode resolved");

    if !SUPPORTED_COUNTRIES.contains(&geo.country_code.as_str()) {
        return Err(CoreError::UnknownModel(geo.country_code));
    }

    let point = weather.get_point(lat, lon).await?;
    let forecast_zone = weather.get_forecast_zone(&point.forecast_zone_id).await?;
    let county_zone = weather.get_county_zone(&point.county_zone_id).await?;

    let closest_city = point
        .closest_city
        .or(geo.city)
        .unwrap_or_else(|| "Unknown".to_owned());

    info!(
        city = %closest_city,
        forecast_zone = %forecast_zone.id,
        county_zone = %county_zone.id,
        "forecast model assembled"
    );

    Ok(ForecastModel {
        closest_city,
        forecast_url: point.forecast_url,
        forecast_hourly_url: point.forecast_hourly_url,
        boundary_polygon: forecast_zone.polygon,
        country: CountryModel::UnitedStates {
            forecast_zone_id: forecast_zone.id,
            county_zone_id: county_zone.id,
            radar_station_id: point.radar_station_id.unwrap_or_default(),
            county_polygon: county_zone.polygon,
            grid: GridLocation {
                office_id: point.grid_id,
                x: point.grid_x,
                y: point.grid_y,
            },
        },
    })
}
