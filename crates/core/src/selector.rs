use serde::{Deserialize, Serialize};

use crate::registry::DeviceRegistryEntry;

/// A device selector: matches a subset of a tenant's fleet for rule
/// evaluation and route predicates.
///
/// Parsed once from the stored selector string so matching never touches
/// `regex` compilation on the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceSelector {
    /// Matches every device in the tenant.
    All,
    /// Matches devices at a specific site.
    Site { site_id: String },
    /// Matches device IDs against a regular expression.
    #[serde(skip)]
    Pattern(regex::Regex),
}

impl DeviceSelector {
    /// Parse a selector string. `"*"` is [`Self::All`]; `"site:<id>"`
    /// selects by site; anything else is compiled as a regex.
    ///
    /// # Errors
    /// Returns the underlying `regex` error when the pattern is invalid.
    pub fn parse(raw: &str) -> Result<Self, regex::Error> {
        if raw == "*" {
            return Ok(Self::All);
        }
        if let Some(site_id) = raw.strip_prefix("site:") {
            return Ok(Self::Site {
                site_id: site_id.to_owned(),
            });
        }
        Ok(Self::Pattern(regex::Regex::new(raw)?))
    }

    #[must_use]
    pub fn matches(&self, entry: &DeviceRegistryEntry) -> bool {
        match self {
            Self::All => true,
            Self::Site { site_id } => entry.site_id.as_str() == site_id,
            Self::Pattern(re) => re.is_match(entry.device_id.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{DeviceId, SiteId, TenantId};
    use crate::registry::DeviceStatus;

    fn entry(device: &str, site: &str) -> DeviceRegistryEntry {
        DeviceRegistryEntry {
            tenant_id: TenantId::new("t1"),
            device_id: DeviceId::new(device),
            site_id: SiteId::new(site),
            status: DeviceStatus::Active,
            provision_token_hash: String::new(),
            subscription_id: None,
        }
    }

    #[test]
    fn all_matches_everything() {
        let sel = DeviceSelector::parse("*").unwrap();
        assert!(sel.matches(&entry("d1", "s1")));
    }

    #[test]
    fn site_selector() {
        let sel = DeviceSelector::parse("site:s1").unwrap();
        assert!(sel.matches(&entry("d1", "s1")));
        assert!(!sel.matches(&entry("d1", "s2")));
    }

    #[test]
    fn pattern_selector() {
        let sel = DeviceSelector::parse("^sensor-.*$").unwrap();
        assert!(sel.matches(&entry("sensor-42", "s1")));
        assert!(!sel.matches(&entry("gateway-1", "s1")));
    }
}
