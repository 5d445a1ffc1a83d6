//! # Secret Registry
//!
//! Ownership, access grants, and expiry over opaque encrypted payloads.
//!
//! ## Overview
//!
//! The registry stores payloads that callers have already encrypted, keyed
//! by a per-owner sequential identifier. It never sees plaintext. It decides:
//!
//! - **Who may read**: the owner, or principals the owner granted access
//! - **Who may delete**: only the owner, at any time
//! - **Who may grant and revoke**: only the owner; grants need a live record
//! - **Who may clean up**: anyone, once a record has expired
//!
//! Caller identity and the current height come from the host with every
//! call, as a [`CallContext`].
//!
//! ## Usage
//!
//! ```rust
//! use secret_registry::{CallContext, Registry, RegistryConfig};
//! use secret_registry::core::{Height, Principal};
//! use secret_registry::store::MemoryStore;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let registry = Registry::new(MemoryStore::new(), RegistryConfig::default());
//!
//! let alice = Principal::from_bytes([1; 32]);
//! let bob = Principal::from_bytes([2; 32]);
//! let now = Height::new(100);
//!
//! let id = registry
//!     .store_secret(&CallContext::new(alice, now), b"ciphertext", &[0u8; 32])
//!     .await
//!     .unwrap();
//! registry
//!     .grant_access(&CallContext::new(alice, now), id, bob)
//!     .await
//!     .unwrap();
//!
//! let record = registry.get_secret(&CallContext::new(bob, now), id).await.unwrap();
//! assert_eq!(&record.payload[..], b"ciphertext");
//! # });
//! ```
//!
//! ## Re-exports
//!
//! - `secret_registry::core` - Data model (SecretRecord, AccessGrant, etc.)
//! - `secret_registry::store` - Storage abstraction, memory and SQLite

pub mod config;
pub mod context;
pub mod error;
pub mod registry;

// Re-export component crates
pub use secret_registry_core as core;
pub use secret_registry_store as store;

// Re-export main types for convenience
pub use config::{OrphanGrantPolicy, RegistryConfig};
pub use context::CallContext;
pub use error::{RegistryError, Result};
pub use registry::Registry;

// Re-export commonly used core types
pub use secret_registry_core::{
    AccessGrant, Height, Principal, RuleError, RuleKind, Salt, SecretId, SecretRecord,
    MAX_PAYLOAD_LEN, SALT_LEN,
};
