//! Proptest generators for property-based testing.

use proptest::prelude::*;

use secret_registry_core::{Height, Principal, SecretId, MAX_PAYLOAD_LEN, SALT_LEN};

/// Generate a random principal.
pub fn principal() -> impl Strategy<Value = Principal> {
    any::<[u8; 32]>().prop_map(Principal::from_bytes)
}

/// Generate a valid (non-zero) secret identifier.
pub fn secret_id() -> impl Strategy<Value = SecretId> {
    (1u64..=u64::MAX).prop_map(SecretId::new)
}

/// Generate a height that leaves room for expiry offsets.
pub fn height() -> impl Strategy<Value = Height> {
    (0u64..=u64::MAX / 2).prop_map(Height::new)
}

/// Generate a payload within the accepted bounds.
pub fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=MAX_PAYLOAD_LEN)
}

/// Generate a payload the registry must reject for its length.
pub fn oversized_payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), MAX_PAYLOAD_LEN + 1..=MAX_PAYLOAD_LEN * 2)
}

/// Generate a salt of any length other than 32 bytes.
pub fn bad_salt() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..SALT_LEN),
        prop::collection::vec(any::<u8>(), SALT_LEN + 1..=SALT_LEN * 2),
    ]
}

/// Parameters for storing one secret.
#[derive(Debug, Clone)]
pub struct SecretParams {
    pub payload: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    /// Blocks from creation until expiry, if the secret expires.
    pub expires_in: Option<u64>,
}

impl Arbitrary for SecretParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            payload(),
            any::<[u8; SALT_LEN]>(),
            prop::option::of(1u64..=1_000),
        )
            .prop_map(|(payload, salt, expires_in)| SecretParams {
                payload,
                salt,
                expires_in,
            })
            .boxed()
    }
}
