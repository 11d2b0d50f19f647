//! Accounts exempt from the hard lock
//!
//! Membership only lifts the hard lock. Exempt accounts are still subject to
//! the quota window.

use crate::types::AccountId;
use std::collections::HashSet;

/// Set of exempt accounts
#[derive(Debug, Clone, Default)]
pub struct ExceptionRegistry {
    accounts: HashSet<AccountId>,
}

impl ExceptionRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add account. Returns whether it was newly inserted.
    pub fn add(&mut self, account: AccountId) -> bool {
        self.accounts.insert(account)
    }

    /// Remove account. Returns whether it was present.
    pub fn remove(&mut self, account: &AccountId) -> bool {
        self.accounts.remove(account)
    }

    /// Membership test
    pub fn contains(&self, account: &AccountId) -> bool {
        self.accounts.contains(account)
    }

    /// Number of exempt accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// No exempt accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
