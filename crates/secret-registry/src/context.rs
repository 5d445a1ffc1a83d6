//! Per-call environment context.

use secret_registry_core::{Height, Principal};

/// What the hosting environment supplies with every call.
///
/// The registry never fabricates either value: the host authenticates the
/// caller and owns the height counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// The calling principal.
    pub caller: Principal,

    /// Current environment height.
    pub height: Height,
}

impl CallContext {
    /// Create a call context.
    pub const fn new(caller: Principal, height: Height) -> Self {
        Self { caller, height }
    }

    /// The same caller at another height.
    pub const fn at(self, height: Height) -> Self {
        Self {
            caller: self.caller,
            height,
        }
    }
}
