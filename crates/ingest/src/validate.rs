use opspulse_cache::AuthCache;
use opspulse_core::{
    hash_provision_token, DeviceId, MetricValue, QuarantineReason, SiteId, TenantId,
};
use opspulse_state::{DeviceRegistryStore, StateError};

use crate::message::{InboundMessage, MsgType};
use crate::ratelimit::RateLimiter;

/// A message that passed the full validation chain, ready to be encoded and
/// written (spec.md §4.3 step 7).
#[derive(Debug, Clone)]
pub enum ValidatedMessage {
    Heartbeat {
        tenant_id: TenantId,
        device_id: DeviceId,
        site_id: SiteId,
        seq: i64,
    },
    Telemetry {
        tenant_id: TenantId,
        device_id: DeviceId,
        site_id: SiteId,
        seq: i64,
        fields: Vec<(String, MetricValue)>,
    },
}

impl ValidatedMessage {
    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        match self {
            Self::Heartbeat { tenant_id, .. } | Self::Telemetry { tenant_id, .. } => tenant_id,
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::Heartbeat { device_id, .. } | Self::Telemetry { device_id, .. } => device_id,
        }
    }
}

/// A validation-chain failure that is not an input error: the registry
/// lookup itself failed (spec.md §7 "transient dependency errors").
#[derive(Debug)]
pub enum ValidateFailure {
    Quarantine(QuarantineReason),
    Backend(StateError),
}

impl From<QuarantineReason> for ValidateFailure {
    fn from(reason: QuarantineReason) -> Self {
        Self::Quarantine(reason)
    }
}

/// Run steps 2-4 of spec.md §4.3's per-message algorithm: device lookup,
/// status, site, and token checks. Exposed on its own so that an HTTP
/// ingress handler can answer 401/403 synchronously without also consuming
/// a rate-limit token that belongs to the async pipeline's own accounting
/// (see `opspulse-server`'s ingest handlers).
///
/// The DB pool is only entered on a cache miss — the chain never acquires a
/// connection on the (overwhelmingly common) cache-hit path.
pub async fn precheck_auth(
    msg: &InboundMessage,
    cache: &AuthCache,
    registry: &dyn DeviceRegistryStore,
) -> Result<(), ValidateFailure> {
    let tenant_id = TenantId::new(msg.tenant_id.clone());
    let device_id = DeviceId::new(msg.device_id.clone());

    let entry = match cache.get(&tenant_id, &device_id) {
        Some(entry) => entry,
        None => match registry
            .get(&tenant_id, &device_id)
            .await
            .map_err(ValidateFailure::Backend)?
        {
            Some(entry) => {
                cache.put(&tenant_id, &device_id, entry.clone());
                entry
            }
            None => return Err(QuarantineReason::UnregisteredDevice.into()),
        },
    };

    if !entry.is_active() {
        return Err(QuarantineReason::DeviceRevoked.into());
    }

    if msg.site_id != entry.site_id.as_str() {
        return Err(QuarantineReason::SiteMismatch.into());
    }

    let presented_hash = msg
        .provision_token
        .as_deref()
        .map(|token| hash_provision_token(&device_id, token));
    if presented_hash.as_deref() != Some(entry.provision_token_hash.as_str()) {
        return Err(QuarantineReason::InvalidToken.into());
    }

    Ok(())
}

/// Run steps 2-6 of spec.md §4.3's per-message algorithm: auth, status,
/// site, token, and rate-limit checks. Step 1 (parsing) has already
/// happened by the time a caller has an [`InboundMessage`]; step 7 (line
/// construction) is the caller's job once this returns `Ok`.
pub async fn validate_message(
    msg: &InboundMessage,
    cache: &AuthCache,
    registry: &dyn DeviceRegistryStore,
    limiter: &RateLimiter,
) -> Result<ValidatedMessage, ValidateFailure> {
    precheck_auth(msg, cache, registry).await?;

    let tenant_id = TenantId::new(msg.tenant_id.clone());
    let device_id = DeviceId::new(msg.device_id.clone());

    if !limiter.try_acquire(&tenant_id, &device_id) {
        return Err(QuarantineReason::RateLimited.into());
    }

    let site_id = SiteId::new(msg.site_id.clone());
    Ok(match msg.msg_type {
        MsgType::Heartbeat => ValidatedMessage::Heartbeat {
            tenant_id,
            device_id,
            site_id,
            seq: msg.seq,
        },
        MsgType::Telemetry => {
            let fields = msg
                .metrics
                .as_object()
                .map(opspulse_core::parse_metrics)
                .unwrap_or_default();
            ValidatedMessage::Telemetry {
                tenant_id,
                device_id,
                site_id,
                seq: msg.seq,
                fields,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opspulse_cache::AuthCacheConfig;
    use opspulse_core::{DeviceRegistryEntry, DeviceStatus};
    use opspulse_state::DeviceRegistryStore as _;
    use opspulse_state_memory::MemoryBackend;

    fn msg(overrides: impl FnOnce(&mut InboundMessage)) -> InboundMessage {
        let mut m = InboundMessage {
            tenant_id: "t1".into(),
            device_id: "d1".into(),
            site_id: "s1".into(),
            msg_type: MsgType::Heartbeat,
            seq: 1,
            metrics: serde_json::Value::Null,
            provision_token: Some("secret".into()),
        };
        overrides(&mut m);
        m
    }

    async fn seeded_registry() -> MemoryBackend {
        let backend = MemoryBackend::default();
        backend
            .upsert(DeviceRegistryEntry {
                tenant_id: TenantId::new("t1"),
                device_id: DeviceId::new("d1"),
                site_id: SiteId::new("s1"),
                status: DeviceStatus::Active,
                provision_token_hash: hash_provision_token(&DeviceId::new("d1"), "secret"),
                subscription_id: None,
            })
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn happy_path_populates_cache_on_miss() {
        let registry = seeded_registry().await;
        let cache = AuthCache::new(AuthCacheConfig::default());
        let limiter = RateLimiter::new(100.0, 100.0);

        let result = validate_message(&msg(|_| {}), &cache, &registry, &limiter).await;
        assert!(matches!(result, Ok(ValidatedMessage::Heartbeat { .. })));
        assert_eq!(cache.stats().size, 1);
    }

    #[tokio::test]
    async fn unregistered_device_is_quarantined_without_caching() {
        let registry = MemoryBackend::default();
        let cache = AuthCache::new(AuthCacheConfig::default());
        let limiter = RateLimiter::new(100.0, 100.0);

        let result = validate_message(&msg(|_| {}), &cache, &registry, &limiter).await;
        assert!(matches!(
            result,
            Err(ValidateFailure::Quarantine(QuarantineReason::UnregisteredDevice))
        ));
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn site_mismatch_is_quarantined() {
        let registry = seeded_registry().await;
        let cache = AuthCache::new(AuthCacheConfig::default());
        let limiter = RateLimiter::new(100.0, 100.0);

        let result = validate_message(&msg(|m| m.site_id = "wrong".into()), &cache, &registry, &limiter).await;
        assert!(matches!(
            result,
            Err(ValidateFailure::Quarantine(QuarantineReason::SiteMismatch))
        ));
    }

    #[tokio::test]
    async fn bad_token_is_quarantined() {
        let registry = seeded_registry().await;
        let cache = AuthCache::new(AuthCacheConfig::default());
        let limiter = RateLimiter::new(100.0, 100.0);

        let result = validate_message(
            &msg(|m| m.provision_token = Some("wrong".into())),
            &cache,
            &registry,
            &limiter,
        )
        .await;
        assert!(matches!(
            result,
            Err(ValidateFailure::Quarantine(QuarantineReason::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn revoked_device_is_quarantined() {
        let registry = seeded_registry().await;
        registry.revoke(&TenantId::new("t1"), &DeviceId::new("d1")).await.unwrap();
        let cache = AuthCache::new(AuthCacheConfig::default());
        let limiter = RateLimiter::new(100.0, 100.0);

        let result = validate_message(&msg(|_| {}), &cache, &registry, &limiter).await;
        assert!(matches!(
            result,
            Err(ValidateFailure::Quarantine(QuarantineReason::DeviceRevoked))
        ));
    }

    #[tokio::test]
    async fn exceeding_rate_limit_is_quarantined() {
        let registry = seeded_registry().await;
        let cache = AuthCache::new(AuthCacheConfig::default());
        let limiter = RateLimiter::new(1.0, 1.0);

        let first = validate_message(&msg(|_| {}), &cache, &registry, &limiter).await;
        assert!(first.is_ok());
        let second = validate_message(&msg(|_| {}), &cache, &registry, &limiter).await;
        assert!(matches!(
            second,
            Err(ValidateFailure::Quarantine(QuarantineReason::RateLimited))
        ));
    }

    #[tokio::test]
    async fn telemetry_message_parses_metrics() {
        let registry = seeded_registry().await;
        let cache = AuthCache::new(AuthCacheConfig::default());
        let limiter = RateLimiter::new(100.0, 100.0);

        let result = validate_message(
            &msg(|m| {
                m.msg_type = MsgType::Telemetry;
                m.metrics = serde_json::json!({"temp_c": 24.2, "label": "x"});
            }),
            &cache,
            &registry,
            &limiter,
        )
        .await
        .unwrap();

        match result {
            ValidatedMessage::Telemetry { fields, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].0, "temp_c");
            }
            ValidatedMessage::Heartbeat { .. } => panic!("expected telemetry"),
        }
    }
}
