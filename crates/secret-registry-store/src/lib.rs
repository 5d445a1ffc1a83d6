//! # Secret Registry Store
//!
//! Storage abstraction for the secret registry. Provides a trait-based
//! interface over the three registry tables with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait,
//! allowing the registry to be storage-agnostic. [`SqliteStore`] is the
//! persistent backend; [`MemoryStore`] keeps everything in memory and can
//! be captured as a CBOR [`Snapshot`].
//!
//! ## Tables
//!
//! - **Secrets**: identifier -> [`SecretRecord`](secret_registry_core::SecretRecord)
//! - **Owner counters**: owner -> last issued identifier
//! - **Access grants**: (identifier, grantee) -> [`AccessGrant`](secret_registry_core::AccessGrant)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use secret_registry_store::{MemoryStore, SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("registry.db").unwrap();
//!
//!     // Or keep everything in memory
//!     let store = MemoryStore::new();
//!     let bytes = store.snapshot().to_cbor().unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic create**: inserting a record and advancing its owner's
//!   counter happen together or not at all
//! - **Orphaned grants**: removing a record keeps its grants unless
//!   [`GrantDisposal::Purge`] is requested

pub mod error;
pub mod memory;
pub mod migration;
pub mod snapshot;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use sqlite::SqliteStore;
pub use traits::{GrantDisposal, InsertResult, RemoveResult, Store, StoreExt};
