//! Point-in-time snapshots of the registry tables.
//!
//! A snapshot captures all three tables and encodes to CBOR. It is how a
//! memory-backed host persists and restores registry state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use secret_registry_core::{AccessGrant, Principal, SecretRecord};

use crate::error::{Result, StoreError};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// All registry tables at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,

    /// Secret table, ordered by identifier.
    pub secrets: Vec<SecretRecord>,

    /// Owner counter table, ordered by owner.
    pub counters: Vec<(Principal, u64)>,

    /// Access table, ordered by (identifier, grantee).
    pub grants: Vec<AccessGrant>,
}

impl Snapshot {
    /// Encode to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self =
            ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        Ok(snapshot)
    }

    /// Write the encoded snapshot to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_cbor()?)?;
        Ok(())
    }

    /// Read a snapshot from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_cbor(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use secret_registry_core::{Height, Salt, SecretId};

    fn sample() -> Snapshot {
        let owner = Principal::from_bytes([1; 32]);
        Snapshot {
            version: SNAPSHOT_VERSION,
            secrets: vec![SecretRecord {
                id: SecretId::new(1),
                owner,
                payload: Bytes::from_static(b"ciphertext"),
                salt: Salt::from_bytes([9; 32]),
                created_at: Height::new(4),
                expires_at: Some(Height::new(8)),
            }],
            counters: vec![(owner, 1)],
            grants: vec![AccessGrant::new(
                SecretId::new(1),
                Principal::from_bytes([2; 32]),
                owner,
                Height::new(5),
            )],
        }
    }

    #[test]
    fn test_cbor_roundtrip() {
        let snapshot = sample();
        let bytes = snapshot.to_cbor().unwrap();
        assert_eq!(Snapshot::from_cbor(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut snapshot = sample();
        snapshot.version = 99;
        let bytes = snapshot.to_cbor().unwrap();
        assert!(matches!(
            Snapshot::from_cbor(&bytes),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Snapshot::from_cbor(&[0xff, 0x00, 0x13]).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.snapshot");

        let snapshot = sample();
        snapshot.save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
    }
}
