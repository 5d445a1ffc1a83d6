//! Strong type definitions for the secret registry.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a principal identity in bytes.
pub const PRINCIPAL_LEN: usize = 32;

/// Length of a salt in bytes.
pub const SALT_LEN: usize = 32;

/// The identity of a calling party, as established by the hosting environment.
///
/// The registry never authenticates principals itself. It only compares them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(pub [u8; PRINCIPAL_LEN]);

impl Principal {
    /// Create a principal from raw bytes.
    pub const fn from_bytes(bytes: [u8; PRINCIPAL_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; PRINCIPAL_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; PRINCIPAL_LEN] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// The all-zero principal. Used as the default registry administrator.
    pub const ZERO: Self = Self([0u8; PRINCIPAL_LEN]);
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl From<[u8; PRINCIPAL_LEN]> for Principal {
    fn from(bytes: [u8; PRINCIPAL_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Principal {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; PRINCIPAL_LEN] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// Identifier of a stored secret.
///
/// Identifiers are minted per owner starting at 1. Zero is never a valid
/// identifier; see [`crate::validation::validate_secret_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecretId(pub u64);

impl SecretId {
    /// Create an identifier from its numeric value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this identifier can name a record at all.
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SecretId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Environment time: a monotonically non-decreasing counter (e.g. a block height).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Height(pub u64);

impl Height {
    /// Create a height from its numeric value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The height `delta` steps after this one, saturating at `u64::MAX`.
    pub const fn after(self, delta: u64) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Height {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A 32-byte salt used by off-registry decryption. Opaque to the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Salt(pub [u8; SALT_LEN]);

impl Salt {
    /// Create a salt from raw bytes.
    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", &hex::encode(self.0)[..16])
    }
}

impl AsRef<[u8]> for Salt {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Salt {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; SALT_LEN] = slice.try_into()?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_hex_roundtrip() {
        let p = Principal::from_bytes([0x42; 32]);
        let recovered = Principal::from_hex(&p.to_hex()).unwrap();
        assert_eq!(p, recovered);
    }

    #[test]
    fn test_principal_from_hex_wrong_length() {
        assert!(Principal::from_hex("abcd").is_err());
    }

    #[test]
    fn test_principal_display() {
        let p = Principal::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", p), "abababababababab");
        assert!(format!("{:?}", p).starts_with("Principal("));
    }

    #[test]
    fn test_secret_id_validity() {
        assert!(!SecretId::new(0).is_valid());
        assert!(SecretId::new(1).is_valid());
    }

    #[test]
    fn test_height_after_saturates() {
        assert_eq!(Height::new(5).after(3), Height::new(8));
        assert_eq!(Height::new(u64::MAX).after(1), Height::new(u64::MAX));
    }

    #[test]
    fn test_salt_try_from_slice() {
        assert!(Salt::try_from(&[0u8; 32][..]).is_ok());
        assert!(Salt::try_from(&[0u8; 31][..]).is_err());
        assert!(Salt::try_from(&[0u8; 33][..]).is_err());
    }
}
