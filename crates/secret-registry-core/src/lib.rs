//! # Secret Registry Core
//!
//! Pure data model for the secret registry: records, grants, identifiers,
//! and input validation.
//!
//! This crate contains no I/O, no storage, no clock. It is pure computation
//! over the registry's three tables.
//!
//! ## Key Types
//!
//! - [`SecretRecord`] - An encrypted payload with its owner and expiry
//! - [`AccessGrant`] - Permission for one principal to read one secret
//! - [`Principal`] - The identity of a caller, supplied by the host
//! - [`SecretId`] - Per-owner sequential identifier, never zero
//! - [`Height`] - Environment time used for creation stamps and expiry
//!
//! ## Errors
//!
//! Every business-rule rejection is a [`RuleError`]. See [`RuleKind::code`]
//! for stable numeric codes.

pub mod error;
pub mod grant;
pub mod record;
pub mod types;
pub mod validation;

pub use error::{RuleError, RuleKind};
pub use grant::{AccessGrant, GrantKey};
pub use record::{SecretRecord, MAX_PAYLOAD_LEN};
pub use types::{Height, Principal, Salt, SecretId, PRINCIPAL_LEN, SALT_LEN};
pub use validation::{
    validate_expiration, validate_grantee, validate_secret_id, validate_secret_input,
};
