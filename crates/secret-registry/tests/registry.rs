//! End-to-end registry behavior, run against every storage backend.

use secret_registry::store::{MemoryStore, SqliteStore, Store};
use secret_registry::{
    CallContext, Height, OrphanGrantPolicy, Principal, Registry, RegistryConfig, RuleKind,
    SecretId,
};

const ALICE: Principal = Principal::from_bytes([0xa1; 32]);
const BOB: Principal = Principal::from_bytes([0xb0; 32]);
const CAROL: Principal = Principal::from_bytes([0xc0; 32]);
const ZERO_SALT: [u8; 32] = [0u8; 32];

fn at(caller: Principal, height: u64) -> CallContext {
    CallContext::new(caller, Height::new(height))
}

fn rule<T: std::fmt::Debug>(result: secret_registry::Result<T>) -> RuleKind {
    result
        .unwrap_err()
        .rule_kind()
        .expect("expected a rule violation")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Generates one test per backend for each async check below.
macro_rules! backend_tests {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $name() -> anyhow::Result<()> {
                    super::init_tracing();
                    let registry = super::Registry::new(
                        super::MemoryStore::new(),
                        super::RegistryConfig::default(),
                    );
                    super::$name(registry).await
                }
            )*
        }

        mod sqlite {
            $(
                #[tokio::test]
                async fn $name() -> anyhow::Result<()> {
                    super::init_tracing();
                    let registry = super::Registry::new(
                        super::SqliteStore::open_memory()?,
                        super::RegistryConfig::default(),
                    );
                    super::$name(registry).await
                }
            )*
        }
    };
}

backend_tests!(
    store_then_get_returns_record,
    stranger_is_not_authorized,
    grant_enables_read_until_expiry,
    cleanup_only_after_expiry,
    delete_is_owner_only_at_any_time,
    revoke_is_idempotent,
    identifiers_are_sequential_per_owner,
    grant_revoke_scenario,
    expiry_cleanup_scenario,
    grants_outlive_their_secret,
    grant_requires_live_record,
    revoke_allowed_after_expiry,
    queries_on_missing_secret,
    stale_grant_does_not_cover_reused_identifier,
);

async fn store_then_get_returns_record<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let payload = vec![0x5a; 1024];
    let salt = [0x11; 32];

    let id = reg.store_secret(&at(ALICE, 42), &payload, &salt).await?;
    let record = reg.get_secret(&at(ALICE, 50), id).await?;

    assert_eq!(record.id, id);
    assert_eq!(record.owner, ALICE);
    assert_eq!(&record.payload[..], &payload[..]);
    assert_eq!(record.salt.as_bytes(), &salt);
    assert_eq!(record.created_at, Height::new(42));
    assert_eq!(record.expires_at, None);
    Ok(())
}

async fn stranger_is_not_authorized<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let plain = reg.store_secret(&at(ALICE, 1), &[1], &ZERO_SALT).await?;
    let expiring = reg
        .store_secret_with_expiration(&at(ALICE, 1), &[2], &ZERO_SALT, Height::new(100))
        .await?;

    assert_eq!(rule(reg.get_secret(&at(CAROL, 5), plain).await), RuleKind::NotAuthorized);
    assert_eq!(rule(reg.get_secret(&at(CAROL, 5), expiring).await), RuleKind::NotAuthorized);

    // Expiry is checked before authorization
    assert_eq!(rule(reg.get_secret(&at(CAROL, 100), expiring).await), RuleKind::SecretExpired);
    assert_eq!(rule(reg.get_secret(&at(CAROL, 100), plain).await), RuleKind::NotAuthorized);
    Ok(())
}

async fn grant_enables_read_until_expiry<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg
        .store_secret_with_expiration(&at(ALICE, 10), &[7, 7], &ZERO_SALT, Height::new(20))
        .await?;
    reg.grant_access(&at(ALICE, 11), id, BOB).await?;

    assert_eq!(&reg.get_secret(&at(BOB, 19), id).await?.payload[..], &[7, 7]);

    assert_eq!(rule(reg.get_secret(&at(BOB, 20), id).await), RuleKind::SecretExpired);
    assert_eq!(rule(reg.get_secret(&at(ALICE, 20), id).await), RuleKind::SecretExpired);
    Ok(())
}

async fn cleanup_only_after_expiry<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg
        .store_secret_with_expiration(&at(ALICE, 0), &[1], &ZERO_SALT, Height::new(3))
        .await?;

    assert_eq!(rule(reg.cleanup_expired(&at(CAROL, 2), id).await), RuleKind::SecretExpired);
    assert!(reg.owns_secret(&ALICE, id).await?);

    // Anyone, not just the owner
    reg.cleanup_expired(&at(CAROL, 3), id).await?;
    assert!(!reg.owns_secret(&ALICE, id).await?);
    assert_eq!(rule(reg.cleanup_expired(&at(CAROL, 4), id).await), RuleKind::SecretNotFound);

    // Records without expiry are never eligible
    let forever = reg.store_secret(&at(ALICE, 5), &[1], &ZERO_SALT).await?;
    assert_eq!(
        rule(reg.cleanup_expired(&at(CAROL, u64::MAX), forever).await),
        RuleKind::SecretExpired
    );
    Ok(())
}

async fn delete_is_owner_only_at_any_time<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg
        .store_secret_with_expiration(&at(ALICE, 0), &[1], &ZERO_SALT, Height::new(5))
        .await?;
    reg.grant_access(&at(ALICE, 1), id, BOB).await?;

    assert_eq!(rule(reg.delete_secret(&at(BOB, 2), id).await), RuleKind::NotOwner);
    assert_eq!(rule(reg.delete_secret(&at(CAROL, 2), id).await), RuleKind::NotOwner);

    // Owner may delete after expiry too
    reg.delete_secret(&at(ALICE, 9), id).await?;
    assert_eq!(rule(reg.get_secret(&at(ALICE, 9), id).await), RuleKind::SecretNotFound);
    assert_eq!(rule(reg.delete_secret(&at(ALICE, 9), id).await), RuleKind::SecretNotFound);

    let live = reg.store_secret(&at(ALICE, 10), &[1], &ZERO_SALT).await?;
    reg.delete_secret(&at(ALICE, 10), live).await?;
    Ok(())
}

async fn revoke_is_idempotent<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg.store_secret(&at(ALICE, 1), &[1], &ZERO_SALT).await?;

    reg.revoke_access(&at(ALICE, 2), id, BOB).await?;
    reg.revoke_access(&at(ALICE, 2), id, BOB).await?;
    assert!(!reg.has_access(&BOB, id).await?);
    assert!(reg.access_info(id, &BOB).await?.is_none());

    assert_eq!(rule(reg.revoke_access(&at(CAROL, 2), id, BOB).await), RuleKind::NotOwner);
    Ok(())
}

async fn identifiers_are_sequential_per_owner<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let mut ids = Vec::new();
    for height in 1..=3 {
        ids.push(reg.store_secret(&at(ALICE, height), &[height as u8], &ZERO_SALT).await?);
    }

    assert_eq!(ids, vec![SecretId::new(1), SecretId::new(2), SecretId::new(3)]);
    assert_eq!(reg.owner_secret_count(&ALICE).await?, 3);

    // Deleting never reclaims an identifier
    reg.delete_secret(&at(ALICE, 4), SecretId::new(3)).await?;
    assert_eq!(reg.owner_secret_count(&ALICE).await?, 3);
    assert_eq!(reg.store_secret(&at(ALICE, 5), &[4], &ZERO_SALT).await?, SecretId::new(4));
    assert_eq!(reg.owner_secret_count(&BOB).await?, 0);
    Ok(())
}

async fn grant_revoke_scenario<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg.store_secret(&at(ALICE, 1), &[0x01, 0x02], &ZERO_SALT).await?;
    assert_eq!(id, SecretId::new(1));

    reg.grant_access(&at(ALICE, 2), id, BOB).await?;
    let grant = reg.access_info(id, &BOB).await?.expect("grant present");
    assert_eq!(grant.granted_by, ALICE);
    assert_eq!(grant.granted_at, Height::new(2));
    assert!(reg.has_access(&BOB, id).await?);

    let record = reg.get_secret(&at(BOB, 3), id).await?;
    assert_eq!(&record.payload[..], &[0x01, 0x02]);

    reg.revoke_access(&at(ALICE, 4), id, BOB).await?;
    assert_eq!(rule(reg.get_secret(&at(BOB, 5), id).await), RuleKind::NotAuthorized);
    Ok(())
}

async fn expiry_cleanup_scenario<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let now = 100;
    let id = reg
        .store_secret_with_expiration(&at(ALICE, now), &[9], &ZERO_SALT, Height::new(now + 5))
        .await?;

    assert!(!reg.is_expired(id, Height::new(now + 4)).await?);
    assert_eq!(
        rule(reg.cleanup_expired(&at(BOB, now + 4), id).await),
        RuleKind::SecretExpired
    );

    assert!(reg.is_expired(id, Height::new(now + 5)).await?);
    reg.cleanup_expired(&at(BOB, now + 5), id).await?;
    assert_eq!(rule(reg.get_secret(&at(ALICE, now + 6), id).await), RuleKind::SecretNotFound);
    Ok(())
}

async fn grants_outlive_their_secret<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg.store_secret(&at(ALICE, 1), &[1], &ZERO_SALT).await?;
    reg.grant_access(&at(ALICE, 1), id, BOB).await?;
    reg.delete_secret(&at(ALICE, 2), id).await?;

    // The grant entry remains, but grants nothing without a record
    assert!(reg.access_info(id, &BOB).await?.is_some());
    assert!(!reg.has_access(&BOB, id).await?);
    assert_eq!(rule(reg.get_secret(&at(BOB, 3), id).await), RuleKind::SecretNotFound);
    Ok(())
}

async fn stale_grant_does_not_cover_reused_identifier<S: Store>(
    reg: Registry<S>,
) -> anyhow::Result<()> {
    let id = reg.store_secret(&at(ALICE, 1), b"alice", &ZERO_SALT).await?;
    reg.grant_access(&at(ALICE, 1), id, BOB).await?;
    reg.delete_secret(&at(ALICE, 2), id).await?;

    let reused = reg.store_secret(&at(CAROL, 3), b"carol", &ZERO_SALT).await?;
    assert_eq!(reused, id);

    assert!(reg.access_info(id, &BOB).await?.is_some());
    assert!(!reg.has_access(&BOB, id).await?);
    assert_eq!(rule(reg.get_secret(&at(BOB, 4), id).await), RuleKind::NotAuthorized);

    // A fresh grant from the new owner works as usual
    reg.grant_access(&at(CAROL, 5), id, BOB).await?;
    assert_eq!(&reg.get_secret(&at(BOB, 6), id).await?.payload[..], b"carol");
    Ok(())
}

async fn grant_requires_live_record<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg
        .store_secret_with_expiration(&at(ALICE, 0), &[1], &ZERO_SALT, Height::new(2))
        .await?;

    assert_eq!(rule(reg.grant_access(&at(ALICE, 2), id, BOB).await), RuleKind::SecretExpired);
    assert!(reg.access_info(id, &BOB).await?.is_none());

    // Ownership is checked before expiry
    assert_eq!(rule(reg.grant_access(&at(CAROL, 2), id, BOB).await), RuleKind::NotOwner);
    Ok(())
}

async fn revoke_allowed_after_expiry<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    let id = reg
        .store_secret_with_expiration(&at(ALICE, 0), &[1], &ZERO_SALT, Height::new(2))
        .await?;
    reg.grant_access(&at(ALICE, 1), id, BOB).await?;

    reg.revoke_access(&at(ALICE, 10), id, BOB).await?;
    assert!(reg.access_info(id, &BOB).await?.is_none());
    Ok(())
}

async fn queries_on_missing_secret<S: Store>(reg: Registry<S>) -> anyhow::Result<()> {
    for id in [SecretId::new(0), SecretId::new(1), SecretId::new(u64::MAX)] {
        assert!(!reg.owns_secret(&ALICE, id).await?);
        assert!(!reg.has_access(&ALICE, id).await?);
        assert!(!reg.is_expired(id, Height::new(u64::MAX)).await?);
        assert!(reg.access_info(id, &ALICE).await?.is_none());
    }
    assert_eq!(reg.owner_secret_count(&ALICE).await?, 0);
    assert_eq!(reg.registry_owner(), Principal::ZERO);
    Ok(())
}

#[tokio::test]
async fn failed_operations_leave_tables_unchanged() -> anyhow::Result<()> {
    let reg = Registry::new(MemoryStore::new(), RegistryConfig::default());
    let id = reg
        .store_secret_with_expiration(&at(ALICE, 0), &[1], &ZERO_SALT, Height::new(10))
        .await?;
    reg.grant_access(&at(ALICE, 1), id, BOB).await?;
    let before = reg.store().snapshot();

    assert_eq!(rule(reg.store_secret(&at(ALICE, 2), &[], &ZERO_SALT).await), RuleKind::InvalidData);
    // Slot 1 is taken by Alice
    assert_eq!(rule(reg.store_secret(&at(BOB, 2), &[1], &ZERO_SALT).await), RuleKind::AlreadyExists);
    assert_eq!(rule(reg.delete_secret(&at(BOB, 2), id).await), RuleKind::NotOwner);
    assert_eq!(rule(reg.grant_access(&at(ALICE, 10), id, CAROL).await), RuleKind::SecretExpired);
    assert_eq!(rule(reg.grant_access(&at(BOB, 2), id, CAROL).await), RuleKind::NotOwner);
    assert_eq!(rule(reg.revoke_access(&at(ALICE, 2), id, ALICE).await), RuleKind::InvalidData);
    assert_eq!(rule(reg.cleanup_expired(&at(CAROL, 9), id).await), RuleKind::SecretExpired);
    assert_eq!(rule(reg.get_secret(&at(CAROL, 2), id).await), RuleKind::NotAuthorized);

    assert_eq!(reg.store().snapshot(), before);
    Ok(())
}

#[tokio::test]
async fn purge_policy_sweeps_grants_on_cleanup() -> anyhow::Result<()> {
    let config = RegistryConfig {
        orphan_grants: OrphanGrantPolicy::Purge,
        ..RegistryConfig::default()
    };
    let reg = Registry::new(SqliteStore::open_memory()?, config);

    let id = reg
        .store_secret_with_expiration(&at(ALICE, 0), &[1], &ZERO_SALT, Height::new(2))
        .await?;
    reg.grant_access(&at(ALICE, 1), id, BOB).await?;
    reg.cleanup_expired(&at(CAROL, 2), id).await?;

    assert!(reg.access_info(id, &BOB).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn concurrent_stores_mint_distinct_identifiers() -> anyhow::Result<()> {
    let reg = std::sync::Arc::new(Registry::new(
        SqliteStore::open_memory()?,
        RegistryConfig::default(),
    ));

    let mut handles = Vec::new();
    for i in 0..16u8 {
        let reg = std::sync::Arc::clone(&reg);
        handles.push(tokio::spawn(async move {
            reg.store_secret(&at(ALICE, 1), &[i], &ZERO_SALT).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }
    ids.sort();

    let expected: Vec<SecretId> = (1..=16).map(SecretId::new).collect();
    assert_eq!(ids, expected);
    assert_eq!(reg.owner_secret_count(&ALICE).await?, 16);
    Ok(())
}

#[tokio::test]
async fn sqlite_registry_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("registry.db");

    let id = {
        let reg = Registry::new(SqliteStore::open(&path)?, RegistryConfig::default());
        let id = reg.store_secret(&at(ALICE, 1), &[1, 2, 3], &ZERO_SALT).await?;
        reg.grant_access(&at(ALICE, 2), id, BOB).await?;
        id
    };

    let reg = Registry::new(SqliteStore::open(&path)?, RegistryConfig::default());
    assert_eq!(&reg.get_secret(&at(BOB, 3), id).await?.payload[..], &[1, 2, 3]);
    assert_eq!(reg.store_secret(&at(ALICE, 4), &[4], &ZERO_SALT).await?, SecretId::new(2));
    Ok(())
}
