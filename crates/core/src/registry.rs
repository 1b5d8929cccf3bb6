use serde::{Deserialize, Serialize};

use crate::ids::{DeviceId, SiteId, TenantId};

/// Device registry status. `REVOKED` is a soft delete — the row stays for
/// audit purposes but every ingestion path treats it as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Active,
    Revoked,
}

/// A provisioned device, keyed by `(tenant_id, device_id)` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRegistryEntry {
    pub tenant_id: TenantId,
    pub device_id: DeviceId,
    pub site_id: SiteId,
    pub status: DeviceStatus,
    /// Salted hash of the provisioning token; never the raw token.
    pub provision_token_hash: String,
    pub subscription_id: Option<String>,
}

impl DeviceRegistryEntry {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == DeviceStatus::Active
    }
}
