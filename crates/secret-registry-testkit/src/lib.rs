//! # Secret Registry Testkit
//!
//! Testing utilities for the secret registry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenarios**: Scripted step lists with expected outcomes, replayable on any backend
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic principals, salts, and a height-controlled test chain
//!
//! ## Scenarios
//!
//! ```rust
//! use secret_registry::store::MemoryStore;
//! use secret_registry_testkit::scenarios::{all_scenarios, run_scenario};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! for scenario in all_scenarios() {
//!     run_scenario(&scenario, MemoryStore::new()).await.unwrap();
//! }
//! # });
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use secret_registry_testkit::generators::SecretParams;
//!
//! proptest! {
//!     #[test]
//!     fn stored_payload_is_returned(params: SecretParams) {
//!         // store params.payload, read it back, compare
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use secret_registry_testkit::fixtures::{principal, TestChain};
//!
//! let mut chain = TestChain::new();
//! let ctx = chain.call(principal("alice"));
//! chain.advance(5);
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{multi_party_principals, principal, random_salt, TestChain};
pub use generators::SecretParams;
pub use scenarios::{all_scenarios, run_scenario, Expect, Scenario, Step};
