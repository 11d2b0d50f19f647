//! Administrative capability check
//!
//! Who counts as an administrator is decided outside the gate; the gate only
//! asks before applying an administrative operation.

use crate::types::AccountId;
use std::collections::HashSet;

/// Capability check guarding administrative operations
pub trait Authorizer: Send + Sync + std::fmt::Debug {
    /// Whether `caller` may perform administrative operations
    fn is_administrator(&self, caller: &AccountId) -> bool;
}

/// Fixed set of administrator accounts
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    admins: HashSet<AccountId>,
}

impl AdminSet {
    /// Create from a list of administrators
    pub fn new(admins: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Number of administrators
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// True when nobody can administer the gate
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl Authorizer for AdminSet {
    fn is_administrator(&self, caller: &AccountId) -> bool {
        self.admins.contains(caller)
    }
}
