//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite but keeps everything in memory. State can be
//! captured and restored through [`Snapshot`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use secret_registry_core::{AccessGrant, GrantKey, Principal, SecretId, SecretRecord};

use crate::error::{Result, StoreError};
use crate::snapshot::{Snapshot, SNAPSHOT_VERSION};
use crate::traits::{GrantDisposal, InsertResult, RemoveResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped unless snapshotted.
/// Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Secret table.
    secrets: BTreeMap<SecretId, SecretRecord>,

    /// Owner counter table: owner -> last issued identifier.
    counters: HashMap<Principal, u64>,

    /// Access table.
    grants: BTreeMap<GrantKey, AccessGrant>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Restore a store from a snapshot.
    ///
    /// Fails with [`StoreError::Corrupt`] if an identifier, owner counter or
    /// grant appears twice, or if a counter lags behind its owner's records.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut inner = MemoryStoreInner::default();

        for (owner, counter) in snapshot.counters {
            if inner.counters.insert(owner, counter).is_some() {
                return Err(StoreError::Corrupt(format!("duplicate counter for {}", owner)));
            }
        }

        for record in snapshot.secrets {
            let counter = inner.counters.get(&record.owner).copied().unwrap_or(0);
            if record.id.get() > counter {
                return Err(StoreError::Corrupt(format!(
                    "secret {} is ahead of its owner's counter {}",
                    record.id, counter
                )));
            }
            let id = record.id;
            if inner.secrets.insert(id, record).is_some() {
                return Err(StoreError::Corrupt(format!("duplicate secret {}", id)));
            }
        }

        for grant in snapshot.grants {
            let key = grant.key();
            if inner.grants.insert(key, grant).is_some() {
                return Err(StoreError::Corrupt(format!(
                    "duplicate grant on secret {}",
                    key.secret_id
                )));
            }
        }

        tracing::debug!(
            secrets = inner.secrets.len(),
            grants = inner.grants.len(),
            "restored memory store from snapshot"
        );
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Capture all tables.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.read();

        let mut counters: Vec<(Principal, u64)> =
            inner.counters.iter().map(|(p, c)| (*p, *c)).collect();
        counters.sort_by_key(|(p, _)| *p);

        Snapshot {
            version: SNAPSHOT_VERSION,
            secrets: inner.secrets.values().cloned().collect(),
            counters,
            grants: inner.grants.values().cloned().collect(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryStoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_secret(&self, id: SecretId) -> Result<Option<SecretRecord>> {
        Ok(self.read().secrets.get(&id).cloned())
    }

    async fn insert_secret(&self, record: &SecretRecord) -> Result<InsertResult> {
        let mut inner = self.write();

        if let Some(existing) = inner.secrets.get(&record.id) {
            tracing::warn!(secret_id = %record.id, "secret slot already occupied");
            return Ok(InsertResult::AlreadyExists {
                occupant: existing.owner,
            });
        }

        inner.secrets.insert(record.id, record.clone());
        inner.counters.insert(record.owner, record.id.get());

        Ok(InsertResult::Inserted)
    }

    async fn remove_secret(&self, id: SecretId, grants: GrantDisposal) -> Result<RemoveResult> {
        let mut inner = self.write();

        if inner.secrets.remove(&id).is_none() {
            return Ok(RemoveResult::NotFound);
        }

        let purged_grants = match grants {
            GrantDisposal::Keep => 0,
            GrantDisposal::Purge => {
                let before = inner.grants.len();
                inner.grants.retain(|key, _| key.secret_id != id);
                before - inner.grants.len()
            }
        };

        Ok(RemoveResult::Removed { purged_grants })
    }

    async fn owner_counter(&self, owner: &Principal) -> Result<u64> {
        Ok(self.read().counters.get(owner).copied().unwrap_or(0))
    }

    async fn get_grant(&self, key: &GrantKey) -> Result<Option<AccessGrant>> {
        Ok(self.read().grants.get(key).cloned())
    }

    async fn put_grant(&self, grant: &AccessGrant) -> Result<()> {
        self.write().grants.insert(grant.key(), grant.clone());
        Ok(())
    }

    async fn remove_grant(&self, key: &GrantKey) -> Result<bool> {
        Ok(self.write().grants.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use secret_registry_core::{Height, Salt};

    fn make_record(owner: Principal, id: u64) -> SecretRecord {
        SecretRecord {
            id: SecretId::new(id),
            owner,
            payload: Bytes::from(format!("payload {}", id).into_bytes()),
            salt: Salt::from_bytes([0; 32]),
            created_at: Height::new(1),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let owner = Principal::from_bytes([1; 32]);
        let record = make_record(owner, 1);

        let result = store.insert_secret(&record).await.unwrap();
        assert_eq!(result, InsertResult::Inserted);

        let retrieved = store.get_secret(SecretId::new(1)).await.unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert_eq!(store.owner_counter(&owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_occupied_slot_writes_nothing() {
        let store = MemoryStore::new();
        let a = Principal::from_bytes([1; 32]);
        let b = Principal::from_bytes([2; 32]);

        store.insert_secret(&make_record(a, 1)).await.unwrap();
        let result = store.insert_secret(&make_record(b, 1)).await.unwrap();

        assert_eq!(result, InsertResult::AlreadyExists { occupant: a });
        assert_eq!(store.owner_counter(&b).await.unwrap(), 0);
        assert_eq!(store.get_secret(SecretId::new(1)).await.unwrap().unwrap().owner, a);
    }

    #[tokio::test]
    async fn test_remove_keeps_or_purges_grants() {
        let store = MemoryStore::new();
        let owner = Principal::from_bytes([1; 32]);
        let grantee = Principal::from_bytes([2; 32]);

        for id in 1..=2 {
            store.insert_secret(&make_record(owner, id)).await.unwrap();
            store
                .put_grant(&AccessGrant::new(SecretId::new(id), grantee, owner, Height::new(2)))
                .await
                .unwrap();
        }

        let kept = store.remove_secret(SecretId::new(1), GrantDisposal::Keep).await.unwrap();
        assert_eq!(kept, RemoveResult::Removed { purged_grants: 0 });
        let orphan = GrantKey::new(SecretId::new(1), grantee);
        assert!(store.get_grant(&orphan).await.unwrap().is_some());

        let purged = store.remove_secret(SecretId::new(2), GrantDisposal::Purge).await.unwrap();
        assert_eq!(purged, RemoveResult::Removed { purged_grants: 1 });
        let gone = GrantKey::new(SecretId::new(2), grantee);
        assert!(store.get_grant(&gone).await.unwrap().is_none());

        let missing = store.remove_secret(SecretId::new(2), GrantDisposal::Keep).await.unwrap();
        assert_eq!(missing, RemoveResult::NotFound);
    }

    #[tokio::test]
    async fn test_snapshot_restore() {
        let store = MemoryStore::new();
        let owner = Principal::from_bytes([1; 32]);
        let grantee = Principal::from_bytes([2; 32]);

        store.insert_secret(&make_record(owner, 1)).await.unwrap();
        store
            .put_grant(&AccessGrant::new(SecretId::new(1), grantee, owner, Height::new(3)))
            .await
            .unwrap();

        let bytes = store.snapshot().to_cbor().unwrap();
        let restored = MemoryStore::from_snapshot(Snapshot::from_cbor(&bytes).unwrap()).unwrap();

        assert_eq!(restored.snapshot(), store.snapshot());
        assert_eq!(restored.owner_counter(&owner).await.unwrap(), 1);
        let key = GrantKey::new(SecretId::new(1), grantee);
        assert!(restored.get_grant(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_inconsistent_snapshot_rejected() {
        let store = MemoryStore::new();
        let owner = Principal::from_bytes([1; 32]);
        store.insert_secret(&make_record(owner, 1)).await.unwrap();

        let mut lagging = store.snapshot();
        lagging.counters.clear();
        assert!(matches!(
            MemoryStore::from_snapshot(lagging),
            Err(StoreError::Corrupt(_))
        ));

        let mut duplicated = store.snapshot();
        duplicated.secrets.push(duplicated.secrets[0].clone());
        assert!(matches!(
            MemoryStore::from_snapshot(duplicated),
            Err(StoreError::Corrupt(_))
        ));

        assert!(MemoryStore::from_snapshot(store.snapshot()).is_ok());
    }
}
