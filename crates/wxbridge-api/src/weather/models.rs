// Wire models for the weather service endpoints.
//
// The raw `*Response` structs mirror the service's JSON exactly; the
// flattened types at the bottom are what `WeatherClient` hands to
// callers. `wxbridge-core` converts those into its domain model.

use chrono::{DateTime, Utc};
use serde::Deserialize;

// ── Reverse geocoding ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeocodeResponse {
    pub country_code: String,
    pub city: Option<String>,
}

// ── Point metadata ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PointResponse {
    pub properties: PointProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PointProperties {
    pub grid_id: String,
    pub grid_x: u32,
    pub grid_y: u32,
    pub forecast: String,
    pub forecast_hourly: String,
    /// Forecast zone as a full resource URL; the trailing path segment
    /// is the zone identifier.
    pub forecast_zone: String,
    pub county: String,
    pub radar_station: Option<String>,
    pub relative_location: Option<RelativeLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RelativeLocation {
    pub properties: RelativeLocationProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RelativeLocationProperties {
    pub city: Option<String>,
    pub state: Option<String>,
}

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ZoneResponse {
    pub properties: ZoneProperties,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ZoneProperties {
    pub id: String,
    pub name: Option<String>,
}

/// GeoJSON geometry, restricted to the polygon kinds zones use.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl Geometry {
    /// Flatten to the outer ring, `(latitude, longitude)` order.
    /// GeoJSON stores `[lon, lat]`; consumers want the conventional order.
    pub(crate) fn outer_ring(&self) -> Vec<(f64, f64)> {
        let ring = match self {
            Self::Polygon { coordinates } => coordinates.first(),
            Self::MultiPolygon { coordinates } => coordinates.first().and_then(|p| p.first()),
        };
        ring.map(|r| r.iter().map(|[lon, lat]| (*lat, *lon)).collect())
            .unwrap_or_default()
    }
}

// ── Active alerts ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AlertCollection {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AlertFeature {
    pub properties: AlertRecord,
}

/// One active hazard alert as reported by the weather service.
///
/// Identity is `(identifier, alert_type)` — the reconciliation engine in
/// `wxbridge-core` treats two records as the same hazard when both match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    #[serde(rename = "id")]
    pub identifier: String,
    #[serde(rename = "@type", default)]
    pub alert_type: String,
    pub sent: Option<DateTime<Utc>>,
    pub effective: Option<DateTime<Utc>>,
    pub onset: Option<DateTime<Utc>>,
    pub ends: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub message_type: Option<String>,
    pub severity: Option<String>,
    pub category: Option<String>,
    pub certainty: Option<String>,
    pub urgency: Option<String>,
    pub event: Option<String>,
    pub headline: Option<String>,
    pub sender_name: Option<String>,
    pub area_desc: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    #[serde(default)]
    pub references: Vec<AlertReference>,
}

/// Reference to a prior alert this one updates or cancels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertReference {
    #[serde(rename = "@id")]
    pub identifier: String,
}

// ── Flattened client return types ────────────────────────────────────

/// Result of a reverse geocode lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeResult {
    /// ISO 3166-1 alpha-2 country code, uppercased.
    pub country_code: String,
    pub city: Option<String>,
}

/// Point metadata: forecast endpoints plus zone and radar identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointInfo {
    pub closest_city: Option<String>,
    pub forecast_url: String,
    pub forecast_hourly_url: String,
    pub forecast_zone_id: String,
    pub county_zone_id: String,
    pub radar_station_id: Option<String>,
    pub grid_id: String,
    pub grid_x: u32,
    pub grid_y: u32,
}

/// A zone with its boundary polygon, `(latitude, longitude)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneInfo {
    pub id: String,
    pub name: Option<String>,
    pub polygon: Vec<(f64, f64)>,
}
