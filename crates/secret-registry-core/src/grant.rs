//! Access grants.
//!
//! A grant lets one principal read one secret it does not own. Grants are
//! keyed by `(secret_id, grantee)`; granting twice overwrites the entry.

use serde::{Deserialize, Serialize};

use crate::types::{Height, Principal, SecretId};

/// Key of an access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantKey {
    /// The secret the grant applies to.
    pub secret_id: SecretId,

    /// The principal being granted access.
    pub grantee: Principal,
}

impl GrantKey {
    /// Create a grant key.
    pub const fn new(secret_id: SecretId, grantee: Principal) -> Self {
        Self { secret_id, grantee }
    }
}

/// An access grant entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// The secret the grant applies to.
    pub secret_id: SecretId,

    /// Who received access.
    pub grantee: Principal,

    /// Height at which the grant was issued.
    pub granted_at: Height,

    /// Who issued the grant. Always the record owner at grant time.
    pub granted_by: Principal,
}

impl AccessGrant {
    /// Create a new grant.
    pub fn new(
        secret_id: SecretId,
        grantee: Principal,
        granted_by: Principal,
        granted_at: Height,
    ) -> Self {
        Self {
            secret_id,
            grantee,
            granted_at,
            granted_by,
        }
    }

    /// The table key of this grant.
    pub fn key(&self) -> GrantKey {
        GrantKey::new(self.secret_id, self.grantee)
    }
}
