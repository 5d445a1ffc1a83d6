//! Secret records: the stored unit of the registry.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{Height, Principal, Salt, SecretId};

/// Maximum payload length in bytes.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// A stored secret.
///
/// The payload is already encrypted by the caller. The registry treats it,
/// and the salt, as opaque bytes. Records are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// The record's identifier.
    pub id: SecretId,

    /// The principal that created the record. Never changes.
    pub owner: Principal,

    /// Encrypted payload, 1..=MAX_PAYLOAD_LEN bytes.
    pub payload: Bytes,

    /// Salt for off-registry decryption.
    pub salt: Salt,

    /// Height at which the record was created.
    pub created_at: Height,

    /// Height at which the record expires, if any.
    pub expires_at: Option<Height>,
}

impl SecretRecord {
    /// Whether the record is expired at height `now`.
    ///
    /// A record expires once `now` reaches `expires_at`.
    pub fn is_expired(&self, now: Height) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }

    /// Whether `principal` owns this record.
    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        &self.owner == principal
    }

    /// Short BLAKE3 digest of the payload, for logs.
    pub fn payload_digest(&self) -> String {
        let hash = blake3::hash(&self.payload);
        hash.to_hex()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_at: Option<u64>) -> SecretRecord {
        SecretRecord {
            id: SecretId::new(1),
            owner: Principal::from_bytes([1; 32]),
            payload: Bytes::from_static(&[0x01, 0x02]),
            salt: Salt::from_bytes([0; 32]),
            created_at: Height::new(10),
            expires_at: expires_at.map(Height::new),
        }
    }

    #[test]
    fn test_no_expiry_never_expires() {
        assert!(!record(None).is_expired(Height::new(u64::MAX)));
    }

    #[test]
    fn test_expiry_boundary() {
        let r = record(Some(15));
        assert!(!r.is_expired(Height::new(14)));
        assert!(r.is_expired(Height::new(15))); // At expiration
        assert!(r.is_expired(Height::new(16)));
    }

    #[test]
    fn test_payload_digest_is_stable() {
        let r = record(None);
        assert_eq!(r.payload_digest(), r.clone().payload_digest());
        assert_eq!(r.payload_digest().len(), 16);
    }

    #[test]
    fn test_record_json_roundtrip() {
        let r = record(Some(20));
        let json = serde_json::to_string(&r).unwrap();
        let recovered: SecretRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, recovered);
    }

    proptest::proptest! {
        #[test]
        fn expired_exactly_from_expiry_height(expiry in 1u64.., now: u64) {
            let r = record(Some(expiry));
            proptest::prop_assert_eq!(r.is_expired(Height::new(now)), now >= expiry);
        }
    }
}
