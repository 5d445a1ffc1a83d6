//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            tracing::debug!(version, "applying schema migration");
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, unix_seconds()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
///
/// Integer columns hold u64 values bit-cast to i64; they are never compared
/// in SQL.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Secret table
        CREATE TABLE secrets (
            secret_id INTEGER PRIMARY KEY,    -- per-owner sequential, never 0
            owner BLOB NOT NULL,              -- 32 bytes, immutable
            payload BLOB NOT NULL,            -- 1..=1024 bytes, pre-encrypted
            salt BLOB NOT NULL,               -- 32 bytes
            created_at INTEGER NOT NULL,      -- environment height
            expires_at INTEGER                -- environment height, nullable
        );

        -- Owner counter table
        CREATE TABLE owner_counters (
            owner BLOB PRIMARY KEY,
            last_issued INTEGER NOT NULL
        );

        -- Access table. No foreign key: grants may outlive their secret.
        CREATE TABLE access_grants (
            secret_id INTEGER NOT NULL,
            grantee BLOB NOT NULL,
            granted_at INTEGER NOT NULL,
            granted_by BLOB NOT NULL,
            PRIMARY KEY (secret_id, grantee)
        );

        CREATE INDEX idx_secrets_owner ON secrets(owner);
        "#,
    )?;

    Ok(())
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
