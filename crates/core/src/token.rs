//! Provision token hashing (spec.md §4.3 step 5).
//!
//! The device id is folded in as a salt so that two devices presenting the
//! same raw token (a provisioning mistake, not a supported case) never
//! collide in the registry's `provision_token_hash` column.

use sha2::{Digest, Sha256};

use crate::ids::DeviceId;

#[must_use]
pub fn hash_provision_token(device_id: &DeviceId, raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(device_id.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(raw_token.as_bytes());
    hex::encode(hasher.finalize())
}
