use serde::{Deserialize, Serialize};

/// Message type discriminant (spec.md §4.3 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgType {
    Telemetry,
    Heartbeat,
}

/// A device message after JSON parsing, before any auth/policy check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub tenant_id: String,
    pub device_id: String,
    pub site_id: String,
    pub msg_type: MsgType,
    #[serde(default)]
    pub seq: i64,
    #[serde(default)]
    pub metrics: serde_json::Value,
    pub provision_token: Option<String>,
}

/// Parse a raw JSON payload into an [`InboundMessage`].
///
/// # Errors
/// Returns `()` (the caller quarantines it as `MALFORMED`) if the payload is
/// not valid JSON or is missing a required field.
pub fn parse_raw(raw: &str) -> Result<InboundMessage, ()> {
    serde_json::from_str(raw).map_err(|_| ())
}

/// Best-effort extraction of `(tenant_id, device_id)` from a payload that
/// failed to parse as a full [`InboundMessage`], so a `MALFORMED`
/// quarantine record can still carry tenant attribution when the JSON is
/// otherwise shaped correctly but missing/invalid fields.
#[must_use]
pub fn salvage_identity(raw: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return (None, None);
    };
    let tenant_id = value.get("tenant_id").and_then(|v| v.as_str()).map(str::to_owned);
    let device_id = value.get("device_id").and_then(|v| v.as_str()).map(str::to_owned);
    (tenant_id, device_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_telemetry() {
        let raw = r#"{"tenant_id":"t1","device_id":"d1","site_id":"s1","msg_type":"telemetry","seq":5,"metrics":{"temp_c":24.2},"provision_token":"abc"}"#;
        let msg = parse_raw(raw).unwrap();
        assert_eq!(msg.tenant_id, "t1");
        assert_eq!(msg.msg_type, MsgType::Telemetry);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_raw("not json").is_err());
    }

    #[test]
    fn rejects_missing_required_field() {
        let raw = r#"{"device_id":"d1","site_id":"s1","msg_type":"telemetry"}"#;
        assert!(parse_raw(raw).is_err());
    }

    #[test]
    fn rejects_unknown_msg_type() {
        let raw = r#"{"tenant_id":"t1","device_id":"d1","site_id":"s1","msg_type":"ping"}"#;
        assert!(parse_raw(raw).is_err());
    }

    #[test]
    fn salvage_recovers_identity_from_otherwise_malformed_json() {
        let raw = r#"{"tenant_id":"t1","device_id":"d1","msg_type":"unknown-type"}"#;
        let (tenant, device) = salvage_identity(raw);
        assert_eq!(tenant.as_deref(), Some("t1"));
        assert_eq!(device.as_deref(), Some("d1"));
    }

    #[test]
    fn salvage_returns_none_for_non_json() {
        assert_eq!(salvage_identity("not json"), (None, None));
    }
}
