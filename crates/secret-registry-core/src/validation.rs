//! Input validation for registry operations.
//!
//! Each check maps onto exactly one [`RuleError`]. Checks never touch
//! storage, so they can all run before any lookup or mutation.

use crate::error::RuleError;
use crate::record::MAX_PAYLOAD_LEN;
use crate::types::{Height, Principal, Salt, SecretId, SALT_LEN};

/// Reject the zero identifier.
pub fn validate_secret_id(id: SecretId) -> Result<(), RuleError> {
    if !id.is_valid() {
        return Err(RuleError::InvalidData("secret id must be positive".into()));
    }
    Ok(())
}

/// Validate a payload and salt for a new record.
///
/// Checks, in order:
/// 1. Payload is non-empty
/// 2. Payload is at most [`MAX_PAYLOAD_LEN`] bytes
/// 3. Salt is exactly [`SALT_LEN`] bytes
pub fn validate_secret_input(payload: &[u8], salt: &[u8]) -> Result<Salt, RuleError> {
    if payload.is_empty() {
        return Err(RuleError::InvalidData("payload must not be empty".into()));
    }

    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(RuleError::InvalidData(format!(
            "payload is {} bytes, maximum is {}",
            payload.len(),
            MAX_PAYLOAD_LEN
        )));
    }

    Salt::try_from(salt).map_err(|_| {
        RuleError::InvalidData(format!(
            "salt is {} bytes, expected {}",
            salt.len(),
            SALT_LEN
        ))
    })
}

/// Require an expiry strictly after the current height.
pub fn validate_expiration(expires_at: Height, now: Height) -> Result<(), RuleError> {
    if expires_at <= now {
        return Err(RuleError::InvalidExpiration { expires_at, now });
    }
    Ok(())
}

/// Reject grants and revocations targeting the caller itself.
pub fn validate_grantee(grantee: &Principal, caller: &Principal) -> Result<(), RuleError> {
    if grantee == caller {
        return Err(RuleError::InvalidData(
            "cannot grant or revoke access for yourself".into(),
        ));
    }
    Ok(())
}
