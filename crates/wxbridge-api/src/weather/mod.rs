// Weather service client
//
// Four independent lookups feed the forecast orchestrator in
// `wxbridge-core`: reverse geocode, point metadata, zone polygons, and
// active alerts. Each is an inherent method on `WeatherClient`; the
// orchestrator chains them and short-circuits on the first error.

pub mod models;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use models::{
    AlertCollection, AlertRecord, GeocodeResponse, GeocodeResult, PointInfo, PointResponse,
    ZoneInfo, ZoneResponse,
};

/// Default weather service base URL (forecast, zone, alert endpoints).
pub const DEFAULT_API_BASE: &str = "https://api.weather.gov/";

/// Default reverse-geocode service base URL (keyless lookup).
pub const DEFAULT_GEOCODE_BASE: &str = "https://api.bigdatacloud.net/data/";

/// Typed client for the national weather service and the geocoder.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_base: Url,
    geocode_base: Url,
    timeout_secs: u64,
}

impl WeatherClient {
    /// Create a client against the default public endpoints.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_bases(
            transport,
            Url::parse(DEFAULT_API_BASE)?,
            Url::parse(DEFAULT_GEOCODE_BASE)?,
        )
    }

    /// Create a client with explicit base URLs (tests point these at a
    /// mock server).
    pub fn with_bases(
        transport: &TransportConfig,
        api_base: Url,
        geocode_base: Url,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            api_base,
            geocode_base,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Reverse-geocode a coordinate to a country code and nearest city.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<GeocodeResult, Error> {
        let mut url = self.geocode_base.join("reverse-geocode-client")?;
        url.set_query(Some(&format!(
            "latitude={lat}&longitude={lon}&localityLanguage=en"
        )));
        let raw: GeocodeResponse = self.get_json(url).await?;
        Ok(GeocodeResult {
            country_code: raw.country_code.to_uppercase(),
            city: raw.city.filter(|c| !c.is_empty()),
        })
    }

    /// Fetch forecast endpoints and zone identifiers for a coordinate.
    pub async fn get_point(&self, lat: f64, lon: f64) -> Result<PointInfo, Error> {
        let url = self.api_base.join(&format!("points/{lat:.4},{lon:.4}"))?;
        let raw: PointResponse = self.get_json(url).await?;
        let p = raw.properties;

        Ok(PointInfo {
            closest_city: p
                .relative_location
                .and_then(|loc| match (loc.properties.city, loc.properties.state) {
                    (Some(city), Some(state)) => Some(format!("{city}, {state}")),
                    (city, _) => city,
                }),
            forecast_url: p.forecast,
            forecast_hourly_url: p.forecast_hourly,
            forecast_zone_id: zone_id_from_url(&p.forecast_zone),
            county_zone_id: zone_id_from_url(&p.county),
            radar_station_id: p.radar_station,
            grid_id: p.grid_id,
            grid_x: p.grid_x,
            grid_y: p.grid_y,
        })
    }

    /// Fetch a forecast zone with its boundary polygon.
    pub async fn get_forecast_zone(&self, zone_id: &str) -> Result<ZoneInfo, Error> {
        self.get_zone("forecast", zone_id).await
    }

    /// Fetch a county zone with its boundary polygon.
    pub async fn get_county_zone(&self, zone_id: &str) -> Result<ZoneInfo, Error> {
        self.get_zone("county", zone_id).await
    }

    async fn get_zone(&self, zone_type: &str, zone_id: &str) -> Result<ZoneInfo, Error> {
        let url = self.api_base.join(&format!("zones/{zone_type}/{zone_id}"))?;
        let raw: ZoneResponse = self.get_json(url).await?;
        Ok(ZoneInfo {
            id: raw.properties.id,
            name: raw.properties.name,
            polygon: raw
                .geometry
                .map(|g| g.outer_ring())
                .unwrap_or_default(),
        })
    }

    /// Fetch active hazard alerts for a coordinate.
    ///
    /// An empty list is a meaningful "no active hazards" answer — callers
    /// must distinguish it from a transport failure, which surfaces as
    /// `Err` and must not clear locally tracked alerts.
    pub async fn get_active_alerts(&self, lat: f64, lon: f64) -> Result<Vec<AlertRecord>, Error> {
        let mut url = self.api_base.join("alerts/active")?;
        url.set_query(Some(&format!("point={lat:.4},{lon:.4}")));
        let raw: AlertCollection = self.get_json(url).await?;
        Ok(raw.features.into_iter().map(|f| f.properties).collect())
    }

    // ── Request helper ───────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Service {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Zone identifiers arrive as full resource URLs; the identifier is the
/// trailing path segment.
fn zone_id_from_url(url: &str) -> String {
    url.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(url)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::zone_id_from_url;

    #[test]
    fn zone_id_extraction() {
        assert_eq!(
            zone_id_from_url("https://api.weather.gov/zones/forecast/AZZ540"),
            "AZZ540"
        );
        assert_eq!(zone_id_from_url("AZC013"), "AZC013");
        assert_eq!(zone_id_from_url("https://host/zones/county/AZC013/"), "AZC013");
    }
}
