// Template protocol codec
//
// Bridges answer a "template": a compact request mini-language naming the
// sensor fields to return. A poll round-trip looks like
//
//   request:  Time:[hh];[mm];[ss],out_temp:th0temp-act|th0temp-max|th0temp-min|th0lowbat
//   response: Time:14;07;32,out_temp:21.4|24.1|17.9|0.0
//
// The `[hh]`-style placeholders are substituted by the device. Weather
// sensors carry four response fields (current|max|min|battery); system
// parameters (firmware version, uptime) carry a single value and use `|`
// as the separator after the sensor name.
//
// Two timestamp delimiter conventions exist in deployed firmware: the
// observation path separates `Time` from the hour with `:`, the system
// path with `|`. Decode accepts both unconditionally; see `parse_timestamp`.

use chrono::{DateTime, NaiveTime, Utc};

use crate::error::Error;

/// The token a bridge reports for a field it has no data for.
pub const NO_DATA: &str = "--";

/// Which encode convention a template was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Weather sensor poll: `Time:[hh];[mm];[ss]` head, 4-field entries.
    Observation,
    /// System parameter poll: `Time|[hh];[mm];[ss]` head, 2-field entries.
    System,
}

/// Battery health as reported in a poll response.
///
/// The wire encoding is a float-ish string: `"0.0"` means good, `"1.0"`
/// means low, anything else (including [`NO_DATA`]) is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BatteryHealth {
    Good,
    Low,
    #[default]
    Unknown,
}

impl BatteryHealth {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0.0" => Self::Good,
            "1.0" => Self::Low,
            _ => Self::Unknown,
        }
    }
}

/// What the codec needs to know about a sensor to build its template
/// contribution. `wxbridge-core` derives these from its `Sensor` type.
#[derive(Debug, Clone)]
pub struct SensorTemplate {
    pub name: String,
    /// Parameter code of the currently selected unit. `None` means no
    /// unit is selected; the sensor contributes nothing to the template.
    pub parameter_code: Option<String>,
    pub max_parameter_code: Option<String>,
    pub min_parameter_code: Option<String>,
    pub battery_parameter_code: String,
    pub is_observing: bool,
}

/// One decoded field group from a poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawReading {
    /// `name:value|max|min|battery`
    Weather {
        name: String,
        value: String,
        max: String,
        min: String,
        battery: BatteryHealth,
    },
    /// `name|value`
    System { name: String, value: String },
}

impl RawReading {
    pub fn name(&self) -> &str {
        match self {
            Self::Weather { name, .. } | Self::System { name, .. } => name,
        }
    }
}

/// A fully decoded poll response: the device timestamp plus one reading
/// per sensor the template asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse {
    pub timestamp: DateTime<Utc>,
    pub readings: Vec<RawReading>,
}

// ── Encode ───────────────────────────────────────────────────────────

/// Build the observation template for a set of sensors.
///
/// Only sensors with `is_observing == true` contribute unless
/// `all_parameters` is set. A sensor with no selected unit contributes
/// nothing — it is skipped, not an error. The trailing separator is
/// trimmed.
pub fn encode_observation_template(sensors: &[SensorTemplate], all_parameters: bool) -> String {
    let mut out = String::from("Time:[hh];[mm];[ss]");
    for sensor in sensors {
        if !sensor.is_observing && !all_parameters {
            continue;
        }
        let Some(ref current) = sensor.parameter_code else {
            continue;
        };
        let max = sensor.max_parameter_code.as_deref().unwrap_or(NO_DATA);
        let min = sensor.min_parameter_code.as_deref().unwrap_or(NO_DATA);
        out.push(',');
        out.push_str(&sensor.name);
        out.push(':');
        out.push_str(&format!(
            "[{current}]|[{max}]|[{min}]|[{batt}]",
            batt = sensor.battery_parameter_code
        ));
    }
    out
}

/// Build the system parameter template (`Time|…` head, `name|code` entries).
pub fn encode_system_template(sensors: &[SensorTemplate]) -> String {
    let mut out = String::from("Time|[hh];[mm];[ss]");
    for sensor in sensors {
        out.push(',');
        out.push_str(&sensor.name);
        out.push_str(&format!("|[{}]", sensor.battery_parameter_code));
    }
    out
}

/// Percent-encode a template for use as an HTTP query parameter value.
pub fn percent_encode_template(template: &str) -> String {
    url::form_urlencoded::byte_serialize(template.as_bytes()).collect()
}

// ── Decode ───────────────────────────────────────────────────────────

/// Decode a poll response body.
///
/// The first comma-separated field must be the device timestamp; a
/// malformed timestamp fails the whole decode (silently defaulting to
/// "now" would corrupt observation ordering). Remaining fields decode
/// independently — the caller decides what to do with readings that name
/// sensors it doesn't know.
pub fn decode_response(kind: TemplateKind, body: &str) -> Result<PollResponse, Error> {
    let mut fields = body.trim().split(',');

    let head = fields
        .next()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| Error::malformed("empty response"))?;
    let timestamp = parse_timestamp(kind, head)?;

    let mut readings = Vec::new();
    for field in fields {
        if field.is_empty() {
            continue;
        }
        readings.push(parse_reading(field)?);
    }

    Ok(PollResponse {
        timestamp,
        readings,
    })
}

/// Parse the `Time` head field into a UTC timestamp on today's date.
///
/// Both delimiter conventions (`Time:HH;MM;SS` and `Time|HH;MM;SS`) are
/// accepted regardless of which encode path produced the request — the
/// split is almost certainly an upstream firmware inconsistency, so a
/// mismatch is only worth a debug note, never a failure.
fn parse_timestamp(kind: TemplateKind, head: &str) -> Result<DateTime<Utc>, Error> {
    let rest = head
        .strip_prefix("Time")
        .ok_or_else(|| Error::malformed(format!("expected Time field, got {head:?}")))?;

    let (delim, hms) = match rest.split_at_checked(1) {
        Some((":", hms)) => (TemplateKind::Observation, hms),
        Some(("|", hms)) => (TemplateKind::System, hms),
        _ => {
            return Err(Error::malformed(format!(
                "missing delimiter after Time in {head:?}"
            )));
        }
    };
    if delim != kind {
        tracing::debug!(?kind, field = head, "timestamp delimiter convention mismatch");
    }

    let parts: Vec<&str> = hms.split(';').collect();
    let [hh, mm, ss] = parts.as_slice() else {
        return Err(Error::malformed(format!(
            "timestamp has {} segments, expected 3: {head:?}",
            parts.len()
        )));
    };
    let parse = |s: &str, what: &str| {
        s.parse::<u32>()
            .map_err(|_| Error::malformed(format!("non-numeric {what} in timestamp {head:?}")))
    };
    let time = NaiveTime::from_hms_opt(
        parse(hh, "hour")?,
        parse(mm, "minute")?,
        parse(ss, "second")?,
    )
    .ok_or_else(|| Error::malformed(format!("out-of-range timestamp {head:?}")))?;

    // The bridge only reports a wall-clock time; anchor it to today.
    Ok(Utc::now()
        .date_naive()
        .and_time(time)
        .and_utc())
}

fn parse_reading(field: &str) -> Result<RawReading, Error> {
    // Weather readings put `:` between name and values; system readings
    // only use `|`. Check for `:` first since values never contain one.
    if let Some((name, values)) = field.split_once(':') {
        let parts: Vec<&str> = values.split('|').collect();
        let [value, max, min, battery] = parts.as_slice() else {
            return Err(Error::malformed(format!(
                "weather reading {name:?} has {} values, expected 4",
                parts.len()
            )));
        };
        if name.is_empty() {
            return Err(Error::malformed("weather reading with empty sensor name"));
        }
        return Ok(RawReading::Weather {
            name: name.to_owned(),
            value: (*value).to_owned(),
            max: (*max).to_owned(),
            min: (*min).to_owned(),
            battery: BatteryHealth::from_code(battery),
        });
    }

    match field.split_once('|') {
        Some((name, value)) if !name.is_empty() && !value.contains('|') => {
            Ok(RawReading::System {
                name: name.to_owned(),
                value: value.to_owned(),
            })
        }
        _ => Err(Error::malformed(format!("unparseable field {field:?}"))),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use pretty_assertions::assert_eq;

    fn weather_sensor(name: &str, observing: bool) -> SensorTemplate {
        SensorTemplate {
            name: name.to_owned(),
            parameter_code: Some(format!("{name}-act")),
            max_parameter_code: Some(format!("{name}-max")),
            min_parameter_code: Some(format!("{name}-min")),
            battery_parameter_code: format!("{name}-lowbat"),
            is_observing: observing,
        }
    }

    #[test]
    fn observation_template_includes_only_observing_sensors() {
        let sensors = vec![weather_sensor("th0temp", true), weather_sensor("rain0", false)];
        let tmpl = encode_observation_template(&sensors, false);
        assert_eq!(
            tmpl,
            "Time:[hh];[mm];[ss],th0temp:[th0temp-act]|[th0temp-max]|[th0temp-min]|[th0temp-lowbat]"
        );
    }

    #[test]
    fn all_parameters_overrides_observing_flag() {
        let sensors = vec![weather_sensor("th0temp", false)];
        let tmpl = encode_observation_template(&sensors, true);
        assert!(tmpl.contains("th0temp:"));
    }

    #[test]
    fn sensor_without_selected_unit_is_skipped() {
        let mut sensor = weather_sensor("wind0", true);
        sensor.parameter_code = None;
        let tmpl = encode_observation_template(&[sensor], false);
        assert_eq!(tmpl, "Time:[hh];[mm];[ss]");
    }

    #[test]
    fn system_template_uses_pipe_convention() {
        let sensors = vec![SensorTemplate {
            name: "firmware".into(),
            parameter_code: None,
            max_parameter_code: None,
            min_parameter_code: None,
            battery_parameter_code: "mbsystem-swversion".into(),
            is_observing: true,
        }];
        let tmpl = encode_system_template(&sensors);
        assert_eq!(tmpl, "Time|[hh];[mm];[ss],firmware|[mbsystem-swversion]");
    }

    #[test]
    fn template_percent_encoding_round_trips_reserved_chars() {
        let encoded = percent_encode_template("Time:[hh];[mm];[ss],a:b|c");
        assert!(!encoded.contains('['));
        assert!(!encoded.contains('|'));
        assert!(!encoded.contains(';'));
    }

    #[test]
    fn decode_recovers_encoded_fields() {
        // Round-trip: a synthetic device answer shaped by the same
        // template we encoded must decode to the original values.
        let body = "Time:14;07;32,th0temp:21.4|24.1|17.9|0.0,rh0:55|61|48|1.0";
        let resp = decode_response(TemplateKind::Observation, body).unwrap();

        assert_eq!(resp.timestamp.hour(), 14);
        assert_eq!(resp.timestamp.minute(), 7);
        assert_eq!(resp.timestamp.second(), 32);
        assert_eq!(resp.readings.len(), 2);
        assert_eq!(
            resp.readings[0],
            RawReading::Weather {
                name: "th0temp".into(),
                value: "21.4".into(),
                max: "24.1".into(),
                min: "17.9".into(),
                battery: BatteryHealth::Good,
            }
        );
        assert_eq!(
            resp.readings[1],
            RawReading::Weather {
                name: "rh0".into(),
                value: "55".into(),
                max: "61".into(),
                min: "48".into(),
                battery: BatteryHealth::Low,
            }
        );
    }

    #[test]
    fn decode_accepts_system_timestamp_delimiter() {
        let body = "Time|09;00;01,firmware|2.6";
        let resp = decode_response(TemplateKind::System, body).unwrap();
        assert_eq!(resp.timestamp.hour(), 9);
        assert_eq!(
            resp.readings[0],
            RawReading::System {
                name: "firmware".into(),
                value: "2.6".into(),
            }
        );
    }

    #[test]
    fn decode_accepts_either_delimiter_for_either_kind() {
        // Firmware inconsistency: both conventions must decode on both paths.
        assert!(decode_response(TemplateKind::Observation, "Time|10;00;00").is_ok());
        assert!(decode_response(TemplateKind::System, "Time:10;00;00").is_ok());
    }

    #[test]
    fn two_segment_timestamp_is_rejected() {
        let err = decode_response(TemplateKind::Observation, "Time:14;07,th0temp:1|2|3|0.0")
            .unwrap_err();
        assert!(err.is_malformed(), "expected MalformedResponse, got {err:?}");
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let err = decode_response(TemplateKind::Observation, "Time:xx;07;30").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn wrong_weather_arity_is_rejected() {
        let err =
            decode_response(TemplateKind::Observation, "Time:14;07;32,th0temp:1|2|3").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn sentinel_battery_code_maps_to_unknown() {
        assert_eq!(BatteryHealth::from_code("0.0"), BatteryHealth::Good);
        assert_eq!(BatteryHealth::from_code("1.0"), BatteryHealth::Low);
        assert_eq!(BatteryHealth::from_code(NO_DATA), BatteryHealth::Unknown);
        assert_eq!(BatteryHealth::from_code("2.5"), BatteryHealth::Unknown);
    }

    #[test]
    fn no_data_values_decode_verbatim() {
        let body = "Time:00;00;00,uv0:--|--|--|--";
        let resp = decode_response(TemplateKind::Observation, body).unwrap();
        let RawReading::Weather { value, battery, .. } = &resp.readings[0] else {
            panic!("expected weather reading");
        };
        assert_eq!(value, NO_DATA);
        assert_eq!(*battery, BatteryHealth::Unknown);
    }
}
