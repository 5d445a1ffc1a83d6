//! Registry configuration.

use serde::{Deserialize, Serialize};

use secret_registry_core::Principal;
use secret_registry_store::GrantDisposal;

use crate::error::{RegistryError, Result};

/// What happens to a secret's grants when the secret is deleted or cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanGrantPolicy {
    /// Grants stay behind and remain visible through `access_info`.
    #[default]
    Retain,
    /// Grants are removed together with the secret.
    Purge,
}

impl From<OrphanGrantPolicy> for GrantDisposal {
    fn from(policy: OrphanGrantPolicy) -> Self {
        match policy {
            OrphanGrantPolicy::Retain => GrantDisposal::Keep,
            OrphanGrantPolicy::Purge => GrantDisposal::Purge,
        }
    }
}

/// Configuration for the Registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry-wide administrator. Reported by `registry_owner`, never
    /// consulted for access decisions.
    #[serde(with = "principal_hex")]
    pub admin: Principal,

    /// Grant handling on delete and cleanup.
    pub orphan_grants: OrphanGrantPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            admin: Principal::ZERO,
            orphan_grants: OrphanGrantPolicy::Retain,
        }
    }
}

impl RegistryConfig {
    /// Config with the given administrator and default policies.
    pub fn with_admin(admin: Principal) -> Self {
        Self {
            admin,
            ..Self::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    ///
    /// ```rust
    /// use secret_registry::{OrphanGrantPolicy, RegistryConfig};
    ///
    /// let config = RegistryConfig::from_json(r#"{ "orphan_grants": "purge" }"#).unwrap();
    /// assert_eq!(config.orphan_grants, OrphanGrantPolicy::Purge);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RegistryError::Config(e.to_string()))
    }
}

mod principal_hex {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use secret_registry_core::Principal;

    pub fn serialize<S: Serializer>(principal: &Principal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&principal.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Principal, D::Error> {
        let s = String::deserialize(deserializer)?;
        Principal::from_hex(&s).map_err(de::Error::custom)
    }
}
