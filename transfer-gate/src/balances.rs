//! Balance ledger collaborator
//!
//! The ledger owns balances and allowances and performs the actual value
//! movement. After each successful movement or issuance it reports the new
//! balance of every affected account to a [`BalanceHook`]. Validation happens
//! before any mutation, so a failed call leaves the ledger unchanged and
//! never reaches the hook.

use crate::{
    error::{Error, Result},
    types::{AccountId, Amount},
};
use std::collections::HashMap;

/// Observer of post-movement balances
pub trait BalanceHook {
    /// `account` now holds `balance`
    fn balance_changed(&mut self, account: &AccountId, balance: Amount);
}

/// Authoritative balance store and value-movement primitive
pub trait BalanceLedger: Send + std::fmt::Debug {
    /// Current balance
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Remaining allowance `owner` granted to `spender`
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Sum of all balances
    fn total_supply(&self) -> Amount;

    /// Set the allowance `owner` grants to `spender`
    fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<()>;

    /// Debit `from`, credit `to`, then report both balances to `hook`
    fn move_value(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        hook: &mut dyn BalanceHook,
    ) -> Result<()>;

    /// Spend `spender`'s allowance on `from` and move the value
    fn move_value_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        hook: &mut dyn BalanceHook,
    ) -> Result<()>;

    /// Create `amount` new units for `to`, then report its balance to `hook`
    fn issue(&mut self, to: &AccountId, amount: Amount, hook: &mut dyn BalanceHook) -> Result<()>;
}

/// In-memory ledger
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
}

impl MemoryLedger {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a movement and compute the post-movement balances
    fn plan_move(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(Amount, Amount)> {
        let from_balance = self.balance_of(from);
        if amount > from_balance {
            return Err(Error::InsufficientFunds {
                account: from.clone(),
                balance: from_balance,
                requested: amount,
            });
        }

        if from == to {
            return Ok((from_balance, from_balance));
        }

        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| Error::ArithmeticOverflow(format!("balance of {}", to)))?;

        Ok((from_balance - amount, to_balance))
    }

    fn apply_move(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        (from_balance, to_balance): (Amount, Amount),
        hook: &mut dyn BalanceHook,
    ) {
        self.balances.insert(from.clone(), from_balance);
        self.balances.insert(to.clone(), to_balance);

        hook.balance_changed(from, from_balance);
        hook.balance_changed(to, to_balance);
    }
}

impl BalanceLedger for MemoryLedger {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<()> {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(())
    }

    fn move_value(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        hook: &mut dyn BalanceHook,
    ) -> Result<()> {
        let planned = self.plan_move(from, to, amount)?;
        self.apply_move(from, to, planned, hook);

        tracing::debug!(from = %from, to = %to, amount = %amount, "Value moved");

        Ok(())
    }

    fn move_value_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        hook: &mut dyn BalanceHook,
    ) -> Result<()> {
        let allowance = self.allowance(from, spender);
        if amount > allowance {
            return Err(Error::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                allowance,
                requested: amount,
            });
        }

        let planned = self.plan_move(from, to, amount)?;

        self.allowances
            .insert((from.clone(), spender.clone()), allowance - amount);
        self.apply_move(from, to, planned, hook);

        tracing::debug!(
            spender = %spender,
            from = %from,
            to = %to,
            amount = %amount,
            "Value moved on behalf of owner"
        );

        Ok(())
    }

    fn issue(&mut self, to: &AccountId, amount: Amount, hook: &mut dyn BalanceHook) -> Result<()> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| Error::ArithmeticOverflow("total supply".to_string()))?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| Error::ArithmeticOverflow(format!("balance of {}", to)))?;

        self.total_supply = total_supply;
        self.balances.insert(to.clone(), balance);
        hook.balance_changed(to, balance);

        tracing::debug!(to = %to, amount = %amount, "Value issued");

        Ok(())
    }
}
