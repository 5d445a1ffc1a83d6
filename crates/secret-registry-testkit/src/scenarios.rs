//! Scripted scenarios with expected outcomes.
//!
//! Each scenario is a list of steps written as data, so every backend (and
//! any other implementation of the registry rules) can replay the same
//! script and must observe the same results. Principals are named by label
//! and resolved with [`principal`].

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use secret_registry_core::{RuleKind, SecretId, SALT_LEN};
use secret_registry_store::Store;

use crate::fixtures::{principal, TestChain};

/// Expected outcome of a mutating step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expect {
    /// The step succeeds.
    Ok,
    /// A store step succeeds and mints this identifier.
    Id(u64),
    /// The step is rejected with this kind.
    Rejected(RuleKind),
}

/// One step of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Move the environment height forward.
    Advance(u64),
    /// Store a secret with a zero salt, expiring `expires_in` blocks from now.
    Store {
        caller: String,
        payload: Vec<u8>,
        expires_in: Option<u64>,
        expect: Expect,
    },
    /// Read a secret; on success the payload must equal `payload`, if given.
    Get {
        caller: String,
        id: u64,
        payload: Option<Vec<u8>>,
        expect: Expect,
    },
    Delete { caller: String, id: u64, expect: Expect },
    Grant { caller: String, id: u64, grantee: String, expect: Expect },
    Revoke { caller: String, id: u64, grantee: String, expect: Expect },
    Cleanup { caller: String, id: u64, expect: Expect },
    HasAccess { user: String, id: u64, expect: bool },
    IsExpired { id: u64, expect: bool },
    OwnerCount { user: String, expect: u64 },
}

/// A named script of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    fn new(name: &str, description: &str, steps: Vec<Step>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            steps,
        }
    }

    /// Encode as pretty JSON, for sharing scripts with other implementations.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn store(caller: &str, payload: &[u8], expires_in: Option<u64>, expect: Expect) -> Step {
    Step::Store {
        caller: caller.into(),
        payload: payload.to_vec(),
        expires_in,
        expect,
    }
}

fn get(caller: &str, id: u64, expect: Expect) -> Step {
    Step::Get {
        caller: caller.into(),
        id,
        payload: None,
        expect,
    }
}

fn grant(caller: &str, id: u64, grantee: &str, expect: Expect) -> Step {
    Step::Grant {
        caller: caller.into(),
        id,
        grantee: grantee.into(),
        expect,
    }
}

fn revoke(caller: &str, id: u64, grantee: &str, expect: Expect) -> Step {
    Step::Revoke {
        caller: caller.into(),
        id,
        grantee: grantee.into(),
        expect,
    }
}

fn cleanup(caller: &str, id: u64, expect: Expect) -> Step {
    Step::Cleanup {
        caller: caller.into(),
        id,
        expect,
    }
}

fn delete(caller: &str, id: u64, expect: Expect) -> Step {
    Step::Delete {
        caller: caller.into(),
        id,
        expect,
    }
}

fn has_access(user: &str, id: u64, expect: bool) -> Step {
    Step::HasAccess {
        user: user.into(),
        id,
        expect,
    }
}

fn rejected(kind: RuleKind) -> Expect {
    Expect::Rejected(kind)
}

/// All built-in scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "grant_then_revoke",
            "Owner shares a secret, then withdraws access",
            vec![
                store("alice", &[0x01, 0x02], None, Expect::Id(1)),
                grant("alice", 1, "bob", Expect::Ok),
                Step::Get {
                    caller: "bob".into(),
                    id: 1,
                    payload: Some(vec![0x01, 0x02]),
                    expect: Expect::Ok,
                },
                revoke("alice", 1, "bob", Expect::Ok),
                get("bob", 1, rejected(RuleKind::NotAuthorized)),
                has_access("bob", 1, false),
            ],
        ),
        Scenario::new(
            "expiry_then_cleanup",
            "A secret expiring five blocks out can only be cleaned up once expired",
            vec![
                store("alice", &[0x0a], Some(5), Expect::Id(1)),
                Step::Advance(4),
                Step::IsExpired { id: 1, expect: false },
                cleanup("carol", 1, rejected(RuleKind::SecretExpired)),
                Step::Advance(1),
                Step::IsExpired { id: 1, expect: true },
                get("alice", 1, rejected(RuleKind::SecretExpired)),
                get("bob", 1, rejected(RuleKind::SecretExpired)),
                cleanup("carol", 1, Expect::Ok),
                get("alice", 1, rejected(RuleKind::SecretNotFound)),
            ],
        ),
        Scenario::new(
            "sequential_identifiers",
            "Each owner's identifiers count up from one and are never reused",
            vec![
                store("alice", b"a", None, Expect::Id(1)),
                store("alice", b"b", None, Expect::Id(2)),
                store("alice", b"c", None, Expect::Id(3)),
                Step::OwnerCount { user: "alice".into(), expect: 3 },
                delete("alice", 3, Expect::Ok),
                store("alice", b"d", None, Expect::Id(4)),
                Step::OwnerCount { user: "alice".into(), expect: 4 },
            ],
        ),
        Scenario::new(
            "owner_only_delete",
            "Grantees and strangers cannot delete; the owner can, even after expiry",
            vec![
                store("alice", b"s", Some(2), Expect::Id(1)),
                grant("alice", 1, "bob", Expect::Ok),
                delete("bob", 1, rejected(RuleKind::NotOwner)),
                delete("carol", 1, rejected(RuleKind::NotOwner)),
                Step::Advance(10),
                delete("alice", 1, Expect::Ok),
                delete("alice", 1, rejected(RuleKind::SecretNotFound)),
            ],
        ),
        Scenario::new(
            "grant_rules",
            "Self grants, foreign grants and grants on expired secrets are rejected",
            vec![
                grant("alice", 1, "bob", rejected(RuleKind::SecretNotFound)),
                store("alice", b"s", Some(3), Expect::Id(1)),
                grant("alice", 1, "alice", rejected(RuleKind::InvalidData)),
                grant("carol", 1, "bob", rejected(RuleKind::NotOwner)),
                grant("alice", 0, "bob", rejected(RuleKind::InvalidData)),
                grant("alice", 1, "bob", Expect::Ok),
                Step::Advance(3),
                grant("alice", 1, "carol", rejected(RuleKind::SecretExpired)),
                revoke("alice", 1, "bob", Expect::Ok),
                revoke("alice", 1, "bob", Expect::Ok),
                has_access("bob", 1, false),
            ],
        ),
        Scenario::new(
            "store_validation",
            "Empty or oversized payloads and past expiries are rejected",
            vec![
                store("alice", &[], None, rejected(RuleKind::InvalidData)),
                store("alice", &[0u8; 1025], None, rejected(RuleKind::InvalidData)),
                store("alice", b"s", Some(0), rejected(RuleKind::InvalidExpiration)),
                Step::OwnerCount { user: "alice".into(), expect: 0 },
                store("alice", &[0u8; 1024], None, Expect::Id(1)),
            ],
        ),
        Scenario::new(
            "cross_owner_collision",
            "Per-owner counters collide in the shared identifier space",
            vec![
                store("alice", b"a", None, Expect::Id(1)),
                store("bob", b"b", None, rejected(RuleKind::AlreadyExists)),
                Step::OwnerCount { user: "bob".into(), expect: 0 },
                delete("alice", 1, Expect::Ok),
                store("bob", b"b", None, Expect::Id(1)),
                get("alice", 1, rejected(RuleKind::NotAuthorized)),
            ],
        ),
        Scenario::new(
            "stale_grant_on_reused_identifier",
            "A grant left by a deleted secret does not cover the next owner's secret",
            vec![
                store("alice", b"alice", None, Expect::Id(1)),
                grant("alice", 1, "bob", Expect::Ok),
                delete("alice", 1, Expect::Ok),
                store("carol", b"carol", None, Expect::Id(1)),
                has_access("bob", 1, false),
                get("bob", 1, rejected(RuleKind::NotAuthorized)),
                grant("carol", 1, "bob", Expect::Ok),
                Step::Get {
                    caller: "bob".into(),
                    id: 1,
                    payload: Some(b"carol".to_vec()),
                    expect: Expect::Ok,
                },
            ],
        ),
    ]
}

/// Replay `scenario` on a fresh chain over `store`.
///
/// Returns an error naming the first step whose outcome differs from its
/// expectation.
pub async fn run_scenario<S: Store>(scenario: &Scenario, store: S) -> anyhow::Result<()> {
    let mut chain = TestChain::with_store(store, Default::default());

    for (index, step) in scenario.steps.iter().enumerate() {
        run_step(&mut chain, step)
            .await
            .with_context(|| format!("scenario {} step {}: {:?}", scenario.name, index, step))?;
    }

    Ok(())
}

async fn run_step<S: Store>(chain: &mut TestChain<S>, step: &Step) -> anyhow::Result<()> {
    let zero_salt = [0u8; SALT_LEN];

    match step {
        Step::Advance(blocks) => {
            chain.advance(*blocks);
        }
        Step::Store {
            caller,
            payload,
            expires_in,
            expect,
        } => {
            let ctx = chain.call(principal(caller));
            let result = match expires_in {
                Some(blocks) => {
                    let expires_at = ctx.height.after(*blocks);
                    chain
                        .registry()
                        .store_secret_with_expiration(&ctx, payload, &zero_salt, expires_at)
                        .await
                }
                None => chain.registry().store_secret(&ctx, payload, &zero_salt).await,
            };
            check(result.map(|id| Some(id.get())), expect)?;
        }
        Step::Get {
            caller,
            id,
            payload,
            expect,
        } => {
            let result = chain
                .registry()
                .get_secret(&chain.call(principal(caller)), SecretId::new(*id))
                .await;
            if let (Ok(record), Some(payload)) = (&result, payload) {
                if record.payload[..] != payload[..] {
                    bail!("payload mismatch: got {:?}", record.payload);
                }
            }
            check(result.map(|_| None), expect)?;
        }
        Step::Delete { caller, id, expect } => {
            let result = chain
                .registry()
                .delete_secret(&chain.call(principal(caller)), SecretId::new(*id))
                .await;
            check(result.map(|_| None), expect)?;
        }
        Step::Grant {
            caller,
            id,
            grantee,
            expect,
        } => {
            let result = chain
                .registry()
                .grant_access(
                    &chain.call(principal(caller)),
                    SecretId::new(*id),
                    principal(grantee),
                )
                .await;
            check(result.map(|_| None), expect)?;
        }
        Step::Revoke {
            caller,
            id,
            grantee,
            expect,
        } => {
            let result = chain
                .registry()
                .revoke_access(
                    &chain.call(principal(caller)),
                    SecretId::new(*id),
                    principal(grantee),
                )
                .await;
            check(result.map(|_| None), expect)?;
        }
        Step::Cleanup { caller, id, expect } => {
            let result = chain
                .registry()
                .cleanup_expired(&chain.call(principal(caller)), SecretId::new(*id))
                .await;
            check(result.map(|_| None), expect)?;
        }
        Step::HasAccess { user, id, expect } => {
            let got = chain.registry().has_access(&principal(user), SecretId::new(*id)).await?;
            if got != *expect {
                bail!("has_access: expected {}, got {}", expect, got);
            }
        }
        Step::IsExpired { id, expect } => {
            let got = chain.registry().is_expired(SecretId::new(*id), chain.height()).await?;
            if got != *expect {
                bail!("is_expired: expected {}, got {}", expect, got);
            }
        }
        Step::OwnerCount { user, expect } => {
            let got = chain.registry().owner_secret_count(&principal(user)).await?;
            if got != *expect {
                bail!("owner_secret_count: expected {}, got {}", expect, got);
            }
        }
    }

    Ok(())
}

/// Compare an outcome with its expectation. A successful store step carries
/// the minted identifier in its `Ok` value.
fn check(result: secret_registry::Result<Option<u64>>, expect: &Expect) -> anyhow::Result<()> {
    match (result, expect) {
        (Ok(_), Expect::Ok) => Ok(()),
        (Ok(Some(minted)), Expect::Id(want)) if minted == *want => Ok(()),
        (Err(err), Expect::Rejected(kind)) if err.rule_kind() == Some(*kind) => Ok(()),
        (Ok(minted), _) => bail!("expected {:?}, got Ok({:?})", expect, minted),
        (Err(err), _) => bail!("expected {:?}, got error: {}", expect, err),
    }
}
