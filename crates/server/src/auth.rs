use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::config::AdminApiKeyConfig;

/// An admin API key entry, keyed by the SHA-256 hex hash of the raw key so
/// the plaintext key is never retained past startup.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub name: String,
}

/// SHA-256 lookup table for `/admin/v1/*` bearer tokens, modeled on the
/// hashed API-key table in the teacher's `auth/api_key.rs`, simplified to a
/// single operator role (no JWT sessions, no per-key grants).
#[derive(Debug, Default)]
pub struct AdminApiKeys {
    by_hash: HashMap<String, AdminIdentity>,
}

pub fn hash_api_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

impl AdminApiKeys {
    #[must_use]
    pub fn build(configs: &[AdminApiKeyConfig]) -> Self {
        let by_hash = configs
            .iter()
            .map(|entry| {
                (
                    hash_api_key(&entry.key),
                    AdminIdentity {
                        name: entry.name.clone(),
                    },
                )
            })
            .collect();
        Self { by_hash }
    }

    #[must_use]
    pub fn authenticate(&self, raw_key: &str) -> Option<&AdminIdentity> {
        self.by_hash.get(&hash_api_key(raw_key))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticates_a_known_key() {
        let keys = AdminApiKeys::build(&[AdminApiKeyConfig {
            name: "operator-console".to_owned(),
            key: "s3cr3t".to_owned(),
        }]);
        let identity = keys.authenticate("s3cr3t").expect("key should match");
        assert_eq!(identity.name, "operator-console");
    }

    #[test]
    fn rejects_an_unknown_key() {
        let keys = AdminApiKeys::build(&[AdminApiKeyConfig {
            name: "operator-console".to_owned(),
            key: "s3cr3t".to_owned(),
        }]);
        assert!(keys.authenticate("wrong").is_none());
    }

    #[test]
    fn empty_table_rejects_everything() {
        let keys = AdminApiKeys::build(&[]);
        assert!(keys.is_empty());
        assert!(keys.authenticate("anything").is_none());
    }
}
