//! First-observed balance per account
//!
//! The tracker is the ledger's [`BalanceHook`]: after every successful
//! movement or issuance the ledger reports the new balance of each affected
//! account, and the first non-zero report becomes that account's permanent
//! initial balance.

use crate::balances::BalanceHook;
use crate::types::{AccountId, Amount};
use std::collections::HashMap;

/// Immutable initial balances
#[derive(Debug, Clone, Default)]
pub struct SnapshotTracker {
    initial: HashMap<AccountId, Amount>,
}

impl SnapshotTracker {
    /// Create empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial balance, or 0 when never observed non-zero
    pub fn initial_balance_of(&self, account: &AccountId) -> Amount {
        self.initial.get(account).copied().unwrap_or(0)
    }

    /// Record `balance` as the snapshot if none exists yet.
    ///
    /// Returns true when a snapshot was taken.
    pub fn observe(&mut self, account: &AccountId, balance: Amount) -> bool {
        if balance == 0 || self.initial.contains_key(account) {
            return false;
        }

        self.initial.insert(account.clone(), balance);

        tracing::info!(
            account = %account,
            initial_balance = %balance,
            "Initial balance recorded"
        );

        true
    }

    /// Number of accounts with a snapshot
    pub fn len(&self) -> usize {
        self.initial.len()
    }

    /// No snapshots yet
    pub fn is_empty(&self) -> bool {
        self.initial.is_empty()
    }
}

impl BalanceHook for SnapshotTracker {
    fn balance_changed(&mut self, account: &AccountId, balance: Amount) {
        self.observe(account, balance);
    }
}
