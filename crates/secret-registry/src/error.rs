//! Error types for the Registry.

use secret_registry_core::{RuleError, RuleKind};
use secret_registry_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The operation was rejected by a registry rule. Nothing was written.
    #[error("rule violation: {0}")]
    Rule(#[from] RuleError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// The business-rule rejection, if this is one.
    pub fn rule(&self) -> Option<&RuleError> {
        match self {
            RegistryError::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    /// The kind of the business-rule rejection, if this is one.
    pub fn rule_kind(&self) -> Option<RuleKind> {
        self.rule().map(RuleError::kind)
    }
}

/// Result type for Registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
