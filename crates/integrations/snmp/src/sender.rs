use async_trait::async_trait;
use opspulse_core::{DeliveryJob, Integration, IntegrationKind};
use opspulse_provider::{ensure_allowed_host, ProviderError, Sender};
use tokio::net::UdpSocket;
use tracing::{debug, info, instrument};

use crate::ber::{self, TAG_SEQUENCE};

/// `1.3.6.1.6.3.1.1.4.1.0` — `snmpTrapOID.0`, mandatory second varbind of
/// every SNMPv2c trap.
const SNMP_TRAP_OID: &[u32] = &[1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0];
/// `1.3.6.1.2.1.1.3.0` — `sysUpTime.0`, mandatory first varbind.
const SYS_UP_TIME_OID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 3, 0];
/// Private-enterprise trap OID identifying an OpsConductor-Pulse alert.
const ALERT_TRAP_OID: &[u32] = &[1, 3, 6, 1, 4, 1, 64512, 1, 1];
/// Sibling arc carrying the alert payload as an opaque octet string.
const ALERT_DETAIL_OID: &[u32] = &[1, 3, 6, 1, 4, 1, 64512, 1, 2];

const PDU_TRAPV2: u8 = 0xa7; // context-specific, constructed, tag 7

pub struct SnmpSender;

impl SnmpSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SnmpSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sender for SnmpSender {
    #[instrument(skip(self, job, integration), fields(job_id = %job.job_id, tenant = %job.tenant_id))]
    async fn send(
        &self,
        job: &DeliveryJob,
        integration: &Integration,
        correlation_id: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let (host, port, community, v3_auth) = match &integration.kind {
            IntegrationKind::Snmp { host, port, community, v3_auth } => (host, *port, community, v3_auth),
            other => {
                return Err(ProviderError::Configuration(format!(
                    "snmp sender received a non-snmp integration kind: {other:?}"
                )))
            }
        };

        // TODO: implement RFC 3414 USM auth/priv (HMAC-MD5/SHA + DES/AES)
        // for SNMPv3; until then v3-configured routes fail fast rather than
        // silently falling back to an unauthenticated v2c trap.
        if v3_auth.is_some() {
            return Err(ProviderError::Configuration(
                "SNMPv3 USM authentication is not yet supported".into(),
            ));
        }

        ensure_allowed_host(host, false).await?;

        let community = community.clone().unwrap_or_else(|| "public".to_owned());
        let request_id = request_id_from_job(job);
        let detail = serde_json::to_vec(&job.payload)
            .map_err(|e| ProviderError::Serialization(e.to_string()))?;

        let message = build_trapv2(&community, request_id, &detail, correlation_id);

        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| ProviderError::Connection(format!("failed to bind UDP socket: {e}")))?;
        debug!(host, port, "sending SNMPv2c trap");
        socket
            .send_to(&message, (host.as_str(), port))
            .await
            .map_err(|e| ProviderError::Connection(format!("failed to send SNMP trap: {e}")))?;
        info!(host, port, "SNMP trap sent");

        Ok(serde_json::json!({"host": host, "port": port, "request_id": request_id}))
    }
}

fn request_id_from_job(job: &DeliveryJob) -> i64 {
    i64::from(job.attempt) + job.job_id.as_str().len() as i64
}

fn build_trapv2(community: &str, request_id: i64, detail: &[u8], correlation_id: &str) -> Vec<u8> {
    let varbinds = ber::sequence(
        TAG_SEQUENCE,
        &[
            ber::sequence(TAG_SEQUENCE, &[ber::oid(SYS_UP_TIME_OID), ber::timeticks(0)]),
            ber::sequence(TAG_SEQUENCE, &[ber::oid(SNMP_TRAP_OID), ber::oid(ALERT_TRAP_OID)]),
            ber::sequence(TAG_SEQUENCE, &[ber::oid(ALERT_DETAIL_OID), ber::octet_string(detail)]),
            ber::sequence(
                TAG_SEQUENCE,
                &[ber::oid(ALERT_DETAIL_OID), ber::octet_string(correlation_id.as_bytes())],
            ),
        ],
    );

    let pdu = ber::sequence(
        PDU_TRAPV2,
        &[ber::integer(request_id), ber::integer(0), ber::integer(0), varbinds],
    );

    ber::sequence(
        TAG_SEQUENCE,
        &[ber::integer(1), ber::octet_string(community.as_bytes()), pdu],
    )
}
