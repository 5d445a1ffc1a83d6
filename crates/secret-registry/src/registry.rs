//! The Registry: the record-storage and authorization state machine.
//!
//! Every mutating operation resolves the caller from its [`CallContext`],
//! validates inputs, looks up the affected record, checks ownership and
//! expiry, and only then writes. All operations pass through one gate, so
//! no two interleave.

use std::sync::Arc;

use tokio::sync::Mutex;

use secret_registry_core::{
    validate_expiration, validate_grantee, validate_secret_id, validate_secret_input,
    AccessGrant, GrantKey, Height, Principal, RuleError, SecretId, SecretRecord,
};
use secret_registry_store::{InsertResult, RemoveResult, Store, StoreExt};

use crate::config::RegistryConfig;
use crate::context::CallContext;
use crate::error::{RegistryError, Result};

/// The main Registry struct.
///
/// Provides a unified API for:
/// - Storing secrets, with or without expiry
/// - Reading secrets as owner or grantee
/// - Deleting secrets and cleaning up expired ones
/// - Granting and revoking read access
/// - Read-only queries over ownership, access, and expiry
pub struct Registry<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: RegistryConfig,
    /// Serializes operations across all three tables.
    gate: Mutex<()>,
}

impl<S: Store> Registry<S> {
    /// Create a new registry over `store`.
    pub fn new(store: S, config: RegistryConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            gate: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Secret Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a secret with no expiry. Returns the new identifier.
    pub async fn store_secret(
        &self,
        ctx: &CallContext,
        payload: &[u8],
        salt: &[u8],
    ) -> Result<SecretId> {
        traced("store", self.create(ctx, payload, salt, None).await)
    }

    /// Store a secret that expires at `expires_at`. Returns the new identifier.
    ///
    /// `expires_at` must be strictly after the current height.
    pub async fn store_secret_with_expiration(
        &self,
        ctx: &CallContext,
        payload: &[u8],
        salt: &[u8],
        expires_at: Height,
    ) -> Result<SecretId> {
        traced(
            "store_with_expiration",
            self.create(ctx, payload, salt, Some(expires_at)).await,
        )
    }

    async fn create(
        &self,
        ctx: &CallContext,
        payload: &[u8],
        salt: &[u8],
        expires_at: Option<Height>,
    ) -> Result<SecretId> {
        let salt = validate_secret_input(payload, salt)?;
        if let Some(expires_at) = expires_at {
            validate_expiration(expires_at, ctx.height)?;
        }

        let _gate = self.gate.lock().await;

        let id = self.next_identifier(&ctx.caller).await?;
        let record = SecretRecord {
            id,
            owner: ctx.caller,
            payload: payload.to_vec().into(),
            salt,
            created_at: ctx.height,
            expires_at,
        };

        match self.store.insert_secret(&record).await? {
            InsertResult::Inserted => {
                tracing::info!(
                    secret_id = %id,
                    owner = %ctx.caller,
                    payload_digest = %record.payload_digest(),
                    expires_at = ?expires_at.map(Height::get),
                    "secret stored"
                );
                Ok(id)
            }
            InsertResult::AlreadyExists { .. } => Err(RuleError::AlreadyExists(id).into()),
        }
    }

    /// The identifier the next secret stored by `owner` will receive.
    async fn next_identifier(&self, owner: &Principal) -> Result<SecretId> {
        let last = self.store.owner_counter(owner).await?;
        let next = last
            .checked_add(1)
            .ok_or_else(|| RuleError::InvalidData("identifier space exhausted".into()))?;
        Ok(SecretId::new(next))
    }

    /// Read a secret as its owner or a grantee.
    ///
    /// Checks, in order: identifier is positive, record exists, record is
    /// not expired, caller is owner or grantee.
    pub async fn get_secret(&self, ctx: &CallContext, id: SecretId) -> Result<SecretRecord> {
        traced("get", self.read_secret(ctx, id).await)
    }

    async fn read_secret(&self, ctx: &CallContext, id: SecretId) -> Result<SecretRecord> {
        validate_secret_id(id)?;

        let _gate = self.gate.lock().await;

        let record = self.find(id).await?;
        if record.is_expired(ctx.height) {
            return Err(RuleError::SecretExpired(id).into());
        }
        if !self.store.can_read(&record, &ctx.caller).await? {
            return Err(RuleError::NotAuthorized(id).into());
        }

        Ok(record)
    }

    /// Delete a secret. Owner only, expired or not.
    pub async fn delete_secret(&self, ctx: &CallContext, id: SecretId) -> Result<()> {
        traced("delete", self.delete(ctx, id).await)
    }

    async fn delete(&self, ctx: &CallContext, id: SecretId) -> Result<()> {
        validate_secret_id(id)?;

        let _gate = self.gate.lock().await;

        let record = self.find(id).await?;
        if !record.is_owned_by(&ctx.caller) {
            return Err(RuleError::NotOwner(id).into());
        }

        let purged = self.remove(id).await?;
        tracing::info!(secret_id = %id, caller = %ctx.caller, purged_grants = purged, "secret deleted");
        Ok(())
    }

    /// Remove an expired secret. Any caller may do this once the record has
    /// expired; before that it fails with `SecretExpired`.
    pub async fn cleanup_expired(&self, ctx: &CallContext, id: SecretId) -> Result<()> {
        traced("cleanup_expired", self.cleanup(ctx, id).await)
    }

    async fn cleanup(&self, ctx: &CallContext, id: SecretId) -> Result<()> {
        validate_secret_id(id)?;

        let _gate = self.gate.lock().await;

        let record = self.find(id).await?;
        if !record.is_expired(ctx.height) {
            return Err(RuleError::SecretExpired(id).into());
        }

        let purged = self.remove(id).await?;
        tracing::info!(
            secret_id = %id,
            caller = %ctx.caller,
            owner = %record.owner,
            purged_grants = purged,
            "expired secret cleaned up"
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Let `grantee` read secret `id`. Owner only, record must not be expired.
    ///
    /// Granting again overwrites the previous grant's time.
    pub async fn grant_access(
        &self,
        ctx: &CallContext,
        id: SecretId,
        grantee: Principal,
    ) -> Result<()> {
        traced("grant_access", self.grant(ctx, id, grantee).await)
    }

    async fn grant(&self, ctx: &CallContext, id: SecretId, grantee: Principal) -> Result<()> {
        validate_secret_id(id)?;

        let _gate = self.gate.lock().await;

        let record = self.owned_record(ctx, id, &grantee).await?;
        if record.is_expired(ctx.height) {
            return Err(RuleError::SecretExpired(id).into());
        }

        let grant = AccessGrant::new(id, grantee, ctx.caller, ctx.height);
        self.store.put_grant(&grant).await?;

        tracing::info!(secret_id = %id, owner = %ctx.caller, grantee = %grantee, "access granted");
        Ok(())
    }

    /// Withdraw `grantee`'s access to secret `id`. Owner only, allowed after
    /// expiry. Revoking a grant that does not exist succeeds.
    pub async fn revoke_access(
        &self,
        ctx: &CallContext,
        id: SecretId,
        grantee: Principal,
    ) -> Result<()> {
        traced("revoke_access", self.revoke(ctx, id, grantee).await)
    }

    async fn revoke(&self, ctx: &CallContext, id: SecretId, grantee: Principal) -> Result<()> {
        validate_secret_id(id)?;

        let _gate = self.gate.lock().await;

        self.owned_record(ctx, id, &grantee).await?;
        let existed = self.store.remove_grant(&GrantKey::new(id, grantee)).await?;

        tracing::info!(
            secret_id = %id,
            owner = %ctx.caller,
            grantee = %grantee,
            existed,
            "access revoked"
        );
        Ok(())
    }

    /// Shared checks for grant and revoke: record exists, target is not the
    /// caller, caller owns the record.
    async fn owned_record(
        &self,
        ctx: &CallContext,
        id: SecretId,
        grantee: &Principal,
    ) -> Result<SecretRecord> {
        let record = self.find(id).await?;
        validate_grantee(grantee, &ctx.caller)?;
        if !record.is_owned_by(&ctx.caller) {
            return Err(RuleError::NotOwner(id).into());
        }
        Ok(record)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `user` owns secret `id`. False if there is no such secret.
    pub async fn owns_secret(&self, user: &Principal, id: SecretId) -> Result<bool> {
        let _gate = self.gate.lock().await;
        let record = self.store.get_secret(id).await?;
        Ok(record.is_some_and(|r| r.is_owned_by(user)))
    }

    /// Whether `user` owns or holds a grant on secret `id`. Ignores expiry.
    pub async fn has_access(&self, user: &Principal, id: SecretId) -> Result<bool> {
        let _gate = self.gate.lock().await;
        match self.store.get_secret(id).await? {
            Some(record) => Ok(self.store.can_read(&record, user).await?),
            None => Ok(false),
        }
    }

    /// Whether secret `id` exists and is expired at `now`.
    pub async fn is_expired(&self, id: SecretId, now: Height) -> Result<bool> {
        let _gate = self.gate.lock().await;
        let record = self.store.get_secret(id).await?;
        Ok(record.is_some_and(|r| r.is_expired(now)))
    }

    /// The grant entry for `(id, user)`, if any.
    ///
    /// Under [`OrphanGrantPolicy::Retain`](crate::OrphanGrantPolicy::Retain)
    /// this may return a grant whose secret no longer exists.
    pub async fn access_info(&self, id: SecretId, user: &Principal) -> Result<Option<AccessGrant>> {
        let _gate = self.gate.lock().await;
        Ok(self.store.get_grant(&GrantKey::new(id, *user)).await?)
    }

    /// Number of secrets `user` has ever stored. Deletions do not lower it.
    pub async fn owner_secret_count(&self, user: &Principal) -> Result<u64> {
        let _gate = self.gate.lock().await;
        Ok(self.store.owner_counter(user).await?)
    }

    /// The registry-wide administrator.
    pub fn registry_owner(&self) -> Principal {
        self.config.admin
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn find(&self, id: SecretId) -> Result<SecretRecord> {
        self.store
            .get_secret(id)
            .await?
            .ok_or_else(|| RuleError::SecretNotFound(id).into())
    }

    /// Remove a record found under the gate. Returns the number of grants purged.
    async fn remove(&self, id: SecretId) -> Result<usize> {
        match self
            .store
            .remove_secret(id, self.config.orphan_grants.into())
            .await?
        {
            RemoveResult::Removed { purged_grants } => Ok(purged_grants),
            RemoveResult::NotFound => Err(RuleError::SecretNotFound(id).into()),
        }
    }
}

/// Log the outcome of a failed operation.
fn traced<T>(op: &'static str, result: Result<T>) -> Result<T> {
    if let Err(ref err) = result {
        match err {
            RegistryError::Rule(rule) => {
                tracing::debug!(op, kind = ?rule.kind(), code = rule.kind().code(), "operation rejected: {}", rule);
            }
            other => tracing::warn!(op, "operation failed: {}", other),
        }
    }
    result
}
