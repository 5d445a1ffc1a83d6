//! Business-rule errors for registry operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Height, SecretId};

/// A rejected registry operation.
///
/// Every variant is a non-retryable business-rule rejection. A rejected
/// operation leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("caller is not the owner of secret {0}")]
    NotOwner(SecretId),

    #[error("secret not found: {0}")]
    SecretNotFound(SecretId),

    #[error("secret slot {0} is already occupied")]
    AlreadyExists(SecretId),

    #[error("caller is not authorized to read secret {0}")]
    NotAuthorized(SecretId),

    /// Raised both when a live record is required (get, grant) and when an
    /// expired one is required (cleanup).
    #[error("secret {0} has the wrong expiry state for this operation")]
    SecretExpired(SecretId),

    #[error("expiry {expires_at} is not after current height {now}")]
    InvalidExpiration { expires_at: Height, now: Height },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl RuleError {
    /// The fieldless kind of this error.
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleError::NotOwner(_) => RuleKind::NotOwner,
            RuleError::SecretNotFound(_) => RuleKind::SecretNotFound,
            RuleError::AlreadyExists(_) => RuleKind::AlreadyExists,
            RuleError::NotAuthorized(_) => RuleKind::NotAuthorized,
            RuleError::SecretExpired(_) => RuleKind::SecretExpired,
            RuleError::InvalidExpiration { .. } => RuleKind::InvalidExpiration,
            RuleError::InvalidData(_) => RuleKind::InvalidData,
        }
    }
}

/// Discriminant of a [`RuleError`], with a stable numeric code for hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    NotOwner,
    SecretNotFound,
    AlreadyExists,
    NotAuthorized,
    SecretExpired,
    InvalidExpiration,
    InvalidData,
}

impl RuleKind {
    /// Stable numeric code for this kind.
    pub const fn code(self) -> u32 {
        match self {
            RuleKind::NotOwner => 100,
            RuleKind::SecretNotFound => 101,
            RuleKind::AlreadyExists => 102,
            RuleKind::NotAuthorized => 103,
            RuleKind::SecretExpired => 104,
            RuleKind::InvalidExpiration => 105,
            RuleKind::InvalidData => 106,
        }
    }

    /// Look up a kind from its numeric code.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            100 => Some(RuleKind::NotOwner),
            101 => Some(RuleKind::SecretNotFound),
            102 => Some(RuleKind::AlreadyExists),
            103 => Some(RuleKind::NotAuthorized),
            104 => Some(RuleKind::SecretExpired),
            105 => Some(RuleKind::InvalidExpiration),
            106 => Some(RuleKind::InvalidData),
            _ => None,
        }
    }
}
