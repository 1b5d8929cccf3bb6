use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(TenantId, "A tenant identifier for multi-tenant isolation.");
newtype_string!(DeviceId, "A device identifier, unique within a tenant.");
newtype_string!(SiteId, "A site identifier, unique within a tenant.");
newtype_string!(RuleId, "An alert rule identifier, unique within a tenant.");
newtype_string!(AlertId, "An alert identifier, unique within a tenant.");
newtype_string!(RouteId, "A routing rule identifier, unique within a tenant.");
newtype_string!(
    IntegrationId,
    "An outbound integration identifier, unique within a tenant."
);
newtype_string!(JobId, "A delivery job identifier, globally unique.");

/// The mandatory composite key for any device-scoped operation.
///
/// Spec invariant: `tenant_id` is never absent on any device-scoped row; no
/// query may filter by `device_id` alone. Code paths that accept only a
/// `DeviceId` are programming errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceKey {
    pub tenant_id: TenantId,
    pub device_id: DeviceId,
}

impl DeviceKey {
    #[must_use]
    pub fn new(tenant_id: impl Into<TenantId>, device_id: impl Into<DeviceId>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            device_id: device_id.into(),
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_from_str() {
        let t = TenantId::from("tenant-1");
        assert_eq!(t.as_str(), "tenant-1");
        assert_eq!(&*t, "tenant-1");
    }

    #[test]
    fn newtype_serde_roundtrip() {
        let id = DeviceId::new("dev-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"dev-42\"");
        let back: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn device_key_display() {
        let key = DeviceKey::new("t1", "d1");
        assert_eq!(key.to_string(), "t1/d1");
    }
}
