//! Store trait: the abstract interface over the registry's three tables.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (persistent) and in-memory (tests, snapshots).

use async_trait::async_trait;
use secret_registry_core::{AccessGrant, GrantKey, Principal, SecretId, SecretRecord};

use crate::error::Result;

/// Result of inserting a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Record was inserted and the owner's counter advanced.
    Inserted,
    /// The identifier slot is taken. Nothing was written.
    AlreadyExists {
        /// Owner of the record occupying the slot.
        occupant: Principal,
    },
}

/// Result of removing a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveResult {
    /// Record was removed.
    Removed {
        /// Number of grants removed alongside it.
        purged_grants: usize,
    },
    /// No record with that identifier.
    NotFound,
}

/// What to do with a secret's grants when the secret is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantDisposal {
    /// Leave grants in place; they become orphaned.
    #[default]
    Keep,
    /// Remove every grant referencing the secret.
    Purge,
}

/// The Store trait: async interface for registry persistence.
///
/// # Design Notes
///
/// - **Atomic create**: `insert_secret` writes the record and advances the
///   owner's counter as one unit, or writes nothing.
/// - **No referential cleanup**: grants may reference identifiers with no
///   record unless removal is asked to purge them.
/// - **No ordering guarantees across calls**: callers serialize operations
///   that span several calls.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Secret Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a secret by identifier.
    async fn get_secret(&self, id: SecretId) -> Result<Option<SecretRecord>>;

    /// Insert a new secret and set its owner's counter to `record.id`.
    ///
    /// # Returns
    /// - `Inserted` if the slot was free.
    /// - `AlreadyExists` if a record already holds `record.id`.
    async fn insert_secret(&self, record: &SecretRecord) -> Result<InsertResult>;

    /// Remove a secret, optionally purging its grants in the same step.
    async fn remove_secret(&self, id: SecretId, grants: GrantDisposal) -> Result<RemoveResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Counter Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The last identifier issued to `owner`, or 0 if none.
    async fn owner_counter(&self, owner: &Principal) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Grant Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a grant by key.
    async fn get_grant(&self, key: &GrantKey) -> Result<Option<AccessGrant>>;

    /// Insert or overwrite a grant.
    async fn put_grant(&self, grant: &AccessGrant) -> Result<()>;

    /// Remove a grant. Returns whether one existed.
    async fn remove_grant(&self, key: &GrantKey) -> Result<bool>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Whether `principal` may read `record`: it owns it or holds a grant
    /// issued by the record's owner.
    ///
    /// Grants left behind by a deleted record stay in the table but never
    /// authorize a later record that reuses the identifier.
    fn can_read(
        &self,
        record: &SecretRecord,
        principal: &Principal,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn can_read(&self, record: &SecretRecord, principal: &Principal) -> Result<bool> {
        if record.is_owned_by(principal) {
            return Ok(true);
        }

        let key = GrantKey::new(record.id, *principal);
        let grant = self.get_grant(&key).await?;
        Ok(grant.is_some_and(|g| g.granted_by == record.owner))
    }
}
