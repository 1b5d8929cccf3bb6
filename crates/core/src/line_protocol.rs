//! Line-protocol construction for the time-series store (spec.md §4.2).
//!
//! One line per message: `measurement,tag=...,tag=... field=...,field=... ts`.
//! Field keys are escaped for backslash, comma, equals, and space, matching
//! the InfluxDB line-protocol grammar the spec targets.

use std::fmt::Write as _;

use crate::ids::{DeviceId, SiteId};
use crate::metric::MetricValue;

/// Escape a tag/field key per line-protocol rules: backslash, comma, equals,
/// and space are backslash-escaped.
#[must_use]
pub fn escape_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build a heartbeat line: `heartbeat,device_id=...,site_id=... seq={seq}i {ns_ts}`.
#[must_use]
pub fn encode_heartbeat(device_id: &DeviceId, site_id: &SiteId, seq: i64, ns_ts: i64) -> String {
    format!(
        "heartbeat,device_id={},site_id={} seq={seq}i {ns_ts}",
        escape_key(device_id.as_str()),
        escape_key(site_id.as_str()),
    )
}

/// Build a telemetry line from an ordered list of `(field_name, value)`
/// pairs. Caller has already dropped strings/nulls and resolved booleans
/// ahead of integers (see [`MetricValue::from_json`]).
#[must_use]
pub fn encode_telemetry(
    device_id: &DeviceId,
    site_id: &SiteId,
    seq: i64,
    fields: &[(String, MetricValue)],
    ns_ts: i64,
) -> String {
    let mut line = format!(
        "telemetry,device_id={},site_id={} seq={seq}i",
        escape_key(device_id.as_str()),
        escape_key(site_id.as_str()),
    );
    for (key, value) in fields {
        let _ = write!(line, ",{}={}", escape_key(key), value.to_line_protocol());
    }
    let _ = write!(line, " {ns_ts}");
    line
}

/// Parse metric fields out of a raw JSON metrics map, in insertion order,
/// dropping anything [`MetricValue::from_json`] rejects.
#[must_use]
pub fn parse_metrics(raw: &serde_json::Map<String, serde_json::Value>) -> Vec<(String, MetricValue)> {
    raw.iter()
        .filter_map(|(k, v)| MetricValue::from_json(v).map(|mv| (k.clone(), mv)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape_key("a,b"), "a\\,b");
        assert_eq!(escape_key("a=b"), "a\\=b");
        assert_eq!(escape_key("a b"), "a\\ b");
        assert_eq!(escape_key("a\\b"), "a\\\\b");
    }

    #[test]
    fn heartbeat_line() {
        let line = encode_heartbeat(&DeviceId::new("d1"), &SiteId::new("s1"), 5, 1_700_000_000_000_000_000);
        assert_eq!(line, "heartbeat,device_id=d1,site_id=s1 seq=5i 1700000000000000000");
    }

    #[test]
    fn happy_path_telemetry_line() {
        // Scenario 1 from spec.md §8.
        let metrics = json!({
            "battery_pct": 87.5,
            "temp_c": 24.2,
            "rssi_dbm": -95,
            "snr_db": 8.5,
            "uplink_ok": true
        });
        let fields = parse_metrics(metrics.as_object().unwrap());
        let line = encode_telemetry(
            &DeviceId::new("d1"),
            &SiteId::new("s1"),
            5,
            &fields,
            1_700_000_000_000_000_000,
        );
        assert!(line.starts_with("telemetry,device_id=d1,site_id=s1 seq=5i,"));
        assert!(line.contains("battery_pct=87.5"));
        assert!(line.contains("temp_c=24.2"));
        assert!(line.contains("rssi_dbm=-95i"));
        assert!(line.contains("snr_db=8.5"));
        assert!(line.contains("uplink_ok=true"));
        assert!(line.ends_with(" 1700000000000000000"));
    }

    #[test]
    fn flexible_metrics_drops_strings() {
        // Scenario 2 from spec.md §8.
        let metrics = json!({
            "pressure_psi": 42.7,
            "flow_rate": 120,
            "valve_open": true,
            "location": "A"
        });
        let fields = parse_metrics(metrics.as_object().unwrap());
        assert_eq!(fields.len(), 3);
        let line = encode_telemetry(&DeviceId::new("d1"), &SiteId::new("s1"), 0, &fields, 0);
        assert!(line.contains("pressure_psi=42.7"));
        assert!(line.contains("flow_rate=120i"));
        assert!(line.contains("valve_open=true"));
        assert!(!line.contains("location"));
    }

    #[test]
    fn parse_metrics_drops_nulls_and_nested() {
        let metrics = json!({
            "ok": true,
            "weird": null,
            "nested": {"a": 1},
            "list": [1, 2]
        });
        let fields = parse_metrics(metrics.as_object().unwrap());
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "ok");
    }
}
