#![allow(clippy::unwrap_used)]
// Integration tests for `WeatherClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wxbridge_api::{Error, TransportConfig, WeatherClient};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup(server: &MockServer) -> WeatherClient {
    let base = Url::parse(&server.uri()).unwrap();
    WeatherClient::with_bases(&TransportConfig::default(), base.clone(), base).unwrap()
}

// ── Geocoding ───────────────────────────────────────────────────────

#[tokio::test]
async fn reverse_geocode_uppercases_country_code() {
    let server = MockServer::start().await;
    let client = setup(&server);

    Mock::given(method("GET"))
        .and(path("/reverse-geocode-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "countryCode": "us",
            "city": "Flagstaff"
        })))
        .mount(&server)
        .await;

    let result = client.reverse_geocode(35.19, -111.65).await.unwrap();
    assert_eq!(result.country_code, "US");
    assert_eq!(result.city.as_deref(), Some("Flagstaff"));
}

// ── Point metadata ──────────────────────────────────────────────────

#[tokio::test]
async fn get_point_extracts_zone_ids_from_urls() {
    let server = MockServer::start().await;
    let client = setup(&server);

    Mock::given(method("GET"))
        .and(path("/points/35.1900,-111.6500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {
                "gridId": "FGZ",
                "gridX": 52,
                "gridY": 74,
                "forecast": "https://api.weather.gov/gridpoints/FGZ/52,74/forecast",
                "forecastHourly": "https://api.weather.gov/gridpoints/FGZ/52,74/forecast/hourly",
                "forecastZone": "https://api.weather.gov/zones/forecast/AZZ540",
                "county": "https://api.weather.gov/zones/county/AZC005",
                "radarStation": "KFSX",
                "relativeLocation": {
                    "properties": { "city": "Flagstaff", "state": "AZ" }
                }
            }
        })))
        .mount(&server)
        .await;

    let point = client.get_point(35.19, -111.65).await.unwrap();
    assert_eq!(point.forecast_zone_id, "AZZ540");
    assert_eq!(point.county_zone_id, "AZC005");
    assert_eq!(point.radar_station_id.as_deref(), Some("KFSX"));
    assert_eq!(point.closest_city.as_deref(), Some("Flagstaff, AZ"));
    assert_eq!(point.grid_id, "FGZ");
}

// ── Zones ───────────────────────────────────────────────────────────

#[tokio::test]
async fn get_zone_flattens_polygon_to_lat_lon() {
    let server = MockServer::start().await;
    let client = setup(&server);

    Mock::given(method("GET"))
        .and(path("/zones/forecast/AZZ540"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "id": "AZZ540", "name": "Western Mogollon Rim" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-111.7, 35.1], [-111.5, 35.1], [-111.5, 35.3], [-111.7, 35.1]]]
            }
        })))
        .mount(&server)
        .await;

    let zone = client.get_forecast_zone("AZZ540").await.unwrap();
    assert_eq!(zone.id, "AZZ540");
    // GeoJSON is [lon, lat]; the client returns (lat, lon).
    assert_eq!(zone.polygon[0], (35.1, -111.7));
    assert_eq!(zone.polygon.len(), 4);
}

#[tokio::test]
async fn zone_lookup_failure_is_a_service_error() {
    let server = MockServer::start().await;
    let client = setup(&server);

    Mock::given(method("GET"))
        .and(path("/zones/county/AZC005"))
        .respond_with(ResponseTemplate::new(404).set_body_string("zone not found"))
        .mount(&server)
        .await;

    let err = client.get_county_zone("AZC005").await.unwrap_err();
    assert!(matches!(err, Error::Service { status: 404, .. }));
}

// ── Alerts ──────────────────────────────────────────────────────────

#[tokio::test]
async fn active_alerts_parse_full_records() {
    let server = MockServer::start().await;
    let client = setup(&server);

    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .and(query_param_contains("point", "35.1900"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "features": [{
                "properties": {
                    "id": "urn:oid:2.49.0.1.840.0.abc123",
                    "@type": "wx:Alert",
                    "sent": "2024-06-15T10:30:00Z",
                    "effective": "2024-06-15T10:30:00Z",
                    "expires": "2024-06-15T22:00:00Z",
                    "status": "Actual",
                    "messageType": "Alert",
                    "severity": "Severe",
                    "category": "Met",
                    "certainty": "Likely",
                    "urgency": "Expected",
                    "event": "Red Flag Warning",
                    "headline": "Red Flag Warning until 10 PM",
                    "senderName": "NWS Flagstaff AZ",
                    "areaDesc": "Western Mogollon Rim",
                    "description": "Gusty winds and low humidity.",
                    "instruction": "Avoid outdoor burning.",
                    "references": [{ "@id": "urn:oid:2.49.0.1.840.0.prior" }]
                }
            }]
        })))
        .mount(&server)
        .await;

    let alerts = client.get_active_alerts(35.19, -111.65).await.unwrap();
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.identifier, "urn:oid:2.49.0.1.840.0.abc123");
    assert_eq!(alert.event.as_deref(), Some("Red Flag Warning"));
    assert_eq!(alert.severity.as_deref(), Some("Severe"));
    assert_eq!(alert.references.len(), 1);
}

#[tokio::test]
async fn empty_alert_list_is_ok_not_error() {
    let server = MockServer::start().await;
    let client = setup(&server);

    Mock::given(method("GET"))
        .and(path("/alerts/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "features": [] })))
        .mount(&server)
        .await;

    let alerts = client.get_active_alerts(35.19, -111.65).await.unwrap();
    assert!(alerts.is_empty());
}
