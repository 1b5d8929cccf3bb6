/// HTTP header name carrying the correlation ID on outbound webhook requests.
pub const CORRELATION_HEADER: &str = "X-OpsPulse-Correlation-Id";

/// JSON field name carrying the correlation ID in outbound MQTT payloads.
pub const CORRELATION_FIELD: &str = "correlation_id";

/// Mints a fresh correlation ID for one delivery attempt.
///
/// Time-ordered so correlation IDs sort the same way the attempts that
/// produced them occurred, matching the `AlertId`/`JobId` convention used
/// elsewhere in this workspace.
pub fn new_correlation_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_unique() {
        assert_ne!(new_correlation_id(), new_correlation_id());
    }
}
