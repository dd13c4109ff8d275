// crates/vote-ledger-core/src/runtime/access.rs
// ============================================================================
// Module: Vote Ledger Access Control
// Description: Static principal-to-capability authorizer.
// Purpose: Gate mutating ledger operations with a fixed grant table.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`StaticAuthorizer`] denies by default and allows only capabilities that
//! were explicitly granted to a principal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::PrincipalId;
use crate::interfaces::Authorizer;
use crate::interfaces::Capability;

// ============================================================================
// SECTION: Static Authorizer
// ============================================================================

/// Deny-by-default grant table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StaticAuthorizer {
    /// Capabilities per principal.
    grants: BTreeMap<PrincipalId, BTreeSet<Capability>>,
}

impl StaticAuthorizer {
    /// Creates an authorizer with no grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants capabilities to a principal.
    #[must_use]
    pub fn grant(
        mut self,
        principal: PrincipalId,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.grants.entry(principal).or_default().extend(capabilities);
        self
    }
}

impl Authorizer for StaticAuthorizer {
    fn is_authorized(&self, principal: &PrincipalId, capability: Capability) -> bool {
        self.grants.get(principal).is_some_and(|caps| caps.contains(&capability))
    }
}
