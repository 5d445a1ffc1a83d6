//! SQLite implementation of the Store trait.
//!
//! The persistent backend. Uses rusqlite with bundled SQLite, wrapped in
//! async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use secret_registry_core::{
    AccessGrant, GrantKey, Height, Principal, Salt, SecretId, SecretRecord,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{GrantDisposal, InsertResult, RemoveResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// A secrets row as stored.
struct RawRecord {
    secret_id: i64,
    owner: Vec<u8>,
    payload: Vec<u8>,
    salt: Vec<u8>,
    created_at: i64,
    expires_at: Option<i64>,
}

fn row_to_raw_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        secret_id: row.get("secret_id")?,
        owner: row.get("owner")?,
        payload: row.get("payload")?,
        salt: row.get("salt")?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
    })
}

impl RawRecord {
    fn decode(self) -> Result<SecretRecord> {
        Ok(SecretRecord {
            id: SecretId::new(self.secret_id as u64),
            owner: decode_principal(&self.owner, "owner")?,
            payload: Bytes::from(self.payload),
            salt: Salt::try_from(self.salt.as_slice())
                .map_err(|_| StoreError::Corrupt(format!("salt of secret {}", self.secret_id)))?,
            created_at: Height::new(self.created_at as u64),
            expires_at: self.expires_at.map(|h| Height::new(h as u64)),
        })
    }
}

fn decode_principal(bytes: &[u8], column: &str) -> Result<Principal> {
    Principal::try_from(bytes).map_err(|_| {
        StoreError::Corrupt(format!("{} is {} bytes, expected 32", column, bytes.len()))
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_secret(&self, id: SecretId) -> Result<Option<SecretRecord>> {
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT secret_id, owner, payload, salt, created_at, expires_at
                     FROM secrets WHERE secret_id = ?1",
                    params![id.get() as i64],
                    row_to_raw_record,
                )
                .optional()?;

            raw.map(RawRecord::decode).transpose()
        })
        .await
    }

    async fn insert_secret(&self, record: &SecretRecord) -> Result<InsertResult> {
        let record = record.clone();

        self.run(move |conn| {
            let tx = conn.transaction()?;

            let occupant: Option<Vec<u8>> = tx
                .query_row(
                    "SELECT owner FROM secrets WHERE secret_id = ?1",
                    params![record.id.get() as i64],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(owner) = occupant {
                tracing::warn!(secret_id = %record.id, "secret slot already occupied");
                return Ok(InsertResult::AlreadyExists {
                    occupant: decode_principal(&owner, "owner")?,
                });
            }

            tx.execute(
                "INSERT INTO secrets (secret_id, owner, payload, salt, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id.get() as i64,
                    record.owner.as_bytes().as_slice(),
                    record.payload.as_ref(),
                    record.salt.as_bytes().as_slice(),
                    record.created_at.get() as i64,
                    record.expires_at.map(|h| h.get() as i64),
                ],
            )?;

            tx.execute(
                "INSERT INTO owner_counters (owner, last_issued) VALUES (?1, ?2)
                 ON CONFLICT(owner) DO UPDATE SET last_issued = excluded.last_issued",
                params![record.owner.as_bytes().as_slice(), record.id.get() as i64],
            )?;

            tx.commit()?;
            Ok(InsertResult::Inserted)
        })
        .await
    }

    async fn remove_secret(&self, id: SecretId, grants: GrantDisposal) -> Result<RemoveResult> {
        self.run(move |conn| {
            let tx = conn.transaction()?;

            let removed = tx.execute(
                "DELETE FROM secrets WHERE secret_id = ?1",
                params![id.get() as i64],
            )?;
            if removed == 0 {
                return Ok(RemoveResult::NotFound);
            }

            let purged_grants = match grants {
                GrantDisposal::Keep => 0,
                GrantDisposal::Purge => tx.execute(
                    "DELETE FROM access_grants WHERE secret_id = ?1",
                    params![id.get() as i64],
                )?,
            };

            tx.commit()?;
            Ok(RemoveResult::Removed { purged_grants })
        })
        .await
    }

    async fn owner_counter(&self, owner: &Principal) -> Result<u64> {
        let owner = *owner;

        self.run(move |conn| {
            let last: Option<i64> = conn
                .query_row(
                    "SELECT last_issued FROM owner_counters WHERE owner = ?1",
                    params![owner.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(last.map_or(0, |n| n as u64))
        })
        .await
    }

    async fn get_grant(&self, key: &GrantKey) -> Result<Option<AccessGrant>> {
        let key = *key;

        self.run(move |conn| {
            let row: Option<(i64, Vec<u8>)> = conn
                .query_row(
                    "SELECT granted_at, granted_by FROM access_grants
                     WHERE secret_id = ?1 AND grantee = ?2",
                    params![key.secret_id.get() as i64, key.grantee.as_bytes().as_slice()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            row.map(|(granted_at, granted_by)| {
                Ok(AccessGrant::new(
                    key.secret_id,
                    key.grantee,
                    decode_principal(&granted_by, "granted_by")?,
                    Height::new(granted_at as u64),
                ))
            })
            .transpose()
        })
        .await
    }

    async fn put_grant(&self, grant: &AccessGrant) -> Result<()> {
        let grant = grant.clone();

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO access_grants (secret_id, grantee, granted_at, granted_by)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(secret_id, grantee) DO UPDATE SET
                    granted_at = excluded.granted_at,
                    granted_by = excluded.granted_by",
                params![
                    grant.secret_id.get() as i64,
                    grant.grantee.as_bytes().as_slice(),
                    grant.granted_at.get() as i64,
                    grant.granted_by.as_bytes().as_slice(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove_grant(&self, key: &GrantKey) -> Result<bool> {
        let key = *key;

        self.run(move |conn| {
            let removed = conn.execute(
                "DELETE FROM access_grants WHERE secret_id = ?1 AND grantee = ?2",
                params![key.secret_id.get() as i64, key.grantee.as_bytes().as_slice()],
            )?;
            Ok(removed > 0)
        })
        .await
    }
}
