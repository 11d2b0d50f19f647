//! Releasable quota during the quota window
//!
//! The releasable total for an account is a pure function of its initial
//! balance and the number of whole 30-day months elapsed since the first
//! unlock:
//!
//! ```text
//! total = floor(initial * 49 / 100) + months * floor(initial * 425 / 10_000)
//! ```
//!
//! Every term truncates. The total is not capped at `initial`: after enough
//! months it exceeds the initial balance and the cap stops binding.

use crate::{
    error::{Error, Result},
    types::{AccountId, Amount, Timestamp},
};
use std::collections::HashMap;

/// Length of a quota month in seconds (30 days)
pub const SECONDS_PER_MONTH: u64 = 2_592_000;

/// Share released at the start of the window, in percent
pub const IMMEDIATE_RELEASE_PERCENT: Amount = 49;

/// Share released per elapsed month, in basis points (4.25%)
pub const MONTHLY_RELEASE_BPS: Amount = 425;

const BPS_DENOMINATOR: Amount = 10_000;
const PERCENT_DENOMINATOR: Amount = 100;

/// Whole months elapsed since `first_unlock_time`. Zero before it.
pub fn months_elapsed(now: Timestamp, first_unlock_time: Timestamp) -> u64 {
    now.saturating_sub(first_unlock_time) / SECONDS_PER_MONTH
}

/// Amount released per elapsed month
pub fn monthly_quota(initial_balance: Amount) -> Amount {
    scale_floor(initial_balance, MONTHLY_RELEASE_BPS, BPS_DENOMINATOR)
}

/// Amount released immediately at the first unlock
pub fn immediate_quota(initial_balance: Amount) -> Amount {
    scale_floor(initial_balance, IMMEDIATE_RELEASE_PERCENT, PERCENT_DENOMINATOR)
}

/// Cumulative releasable amount after `months` whole months
pub fn total_quota(initial_balance: Amount, months: u64) -> Result<Amount> {
    monthly_quota(initial_balance)
        .checked_mul(Amount::from(months))
        .and_then(|laddered| laddered.checked_add(immediate_quota(initial_balance)))
        .ok_or_else(|| overflow("total quota", initial_balance))
}

/// `floor(value * numerator / denominator)` for `numerator < denominator`,
/// without forming the full product.
fn scale_floor(value: Amount, numerator: Amount, denominator: Amount) -> Amount {
    (value / denominator) * numerator + (value % denominator) * numerator / denominator
}

fn overflow(what: &str, initial_balance: Amount) -> Error {
    Error::ArithmeticOverflow(format!("{} for initial balance {}", what, initial_balance))
}

/// Pending consumption produced by a successful quota check
///
/// Applied with [`QuotaLedger::commit`] once the value movement succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a quota charge does nothing until committed"]
pub struct QuotaCharge {
    account: AccountId,
    amount: Amount,
}

/// Cumulative quota consumption per account
#[derive(Debug, Clone, Default)]
pub struct QuotaLedger {
    used: HashMap<AccountId, Amount>,
}

impl QuotaLedger {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount consumed so far
    pub fn used_quota_of(&self, account: &AccountId) -> Amount {
        self.used.get(account).copied().unwrap_or(0)
    }

    /// Quota still available: `max(0, total - used)`
    pub fn available(&self, account: &AccountId, total: Amount) -> Amount {
        total.saturating_sub(self.used_quota_of(account))
    }

    /// Check `amount` against the releasable total without consuming it.
    ///
    /// Fails with `InitialBalanceNotSet` for a zero initial balance and with
    /// `QuotaExceeded` when `amount` is above what is still available.
    pub fn check(
        &self,
        account: &AccountId,
        amount: Amount,
        initial_balance: Amount,
        months: u64,
    ) -> Result<QuotaCharge> {
        if initial_balance == 0 {
            return Err(Error::InitialBalanceNotSet(account.clone()));
        }

        let total = total_quota(initial_balance, months)?;
        let available = self.available(account, total);

        if amount > available {
            return Err(Error::QuotaExceeded {
                account: account.clone(),
                requested: amount,
                available,
            });
        }

        self.used_quota_of(account)
            .checked_add(amount)
            .ok_or_else(|| overflow("used quota", initial_balance))?;

        Ok(QuotaCharge {
            account: account.clone(),
            amount,
        })
    }

    /// Apply a charge produced by [`QuotaLedger::check`]
    pub fn commit(&mut self, charge: QuotaCharge) {
        let used = self.used.entry(charge.account).or_insert(0);
        // Overflow was ruled out by `check`, and nothing else mutates `used`
        // between check and commit.
        *used = used.saturating_add(charge.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn test_months_elapsed_truncates() {
        assert_eq!(months_elapsed(1_000, 1_000), 0);
        assert_eq!(months_elapsed(1_000 + SECONDS_PER_MONTH - 1, 1_000), 0);
        assert_eq!(months_elapsed(1_000 + SECONDS_PER_MONTH, 1_000), 1);
        assert_eq!(months_elapsed(1_000 + 35 * 86_400, 1_000), 1);
        assert_eq!(months_elapsed(500, 1_000), 0);
    }

    #[test]
    fn test_formula_for_one_million() {
        assert_eq!(immediate_quota(1_000_000), 490_000);
        assert_eq!(monthly_quota(1_000_000), 42_500);
        assert_eq!(total_quota(1_000_000, 0).unwrap(), 490_000);
        assert_eq!(total_quota(1_000_000, 1).unwrap(), 532_500);
    }

    #[test]
    fn test_formula_truncates_each_term() {
        // 99 * 49 / 100 = 48.51 -> 48; 99 * 425 / 10000 = 4.2075 -> 4
        assert_eq!(immediate_quota(99), 48);
        assert_eq!(monthly_quota(99), 4);
        assert_eq!(total_quota(99, 3).unwrap(), 60);

        // Small balances release no monthly amount at all
        assert_eq!(monthly_quota(23), 0);
        assert_eq!(total_quota(23, 100).unwrap(), 11);
    }

    #[test]
    fn test_total_is_not_capped_at_initial_balance() {
        // 490_000 + 13 * 42_500 = 1_042_500
        assert_eq!(total_quota(1_000_000, 13).unwrap(), 1_042_500);
        assert!(total_quota(1_000_000, 13).unwrap() > 1_000_000);
    }

    #[test]
    fn test_huge_initial_balance_does_not_overflow() {
        let initial = Amount::MAX / 100;
        assert_eq!(
            immediate_quota(initial),
            1_667_383_597_912_598_470_970_535_576_415_664_235
        );
        assert_eq!(
            monthly_quota(initial),
            144_620_005_941_398_846_971_934_208_158_501_489
        );
        assert_eq!(
            total_quota(initial, 12).unwrap(),
            3_402_823_669_209_384_634_633_746_074_317_682_103
        );

        // Largest possible balance still has a defined immediate release
        assert_eq!(
            immediate_quota(Amount::MAX),
            166_738_359_791_259_847_097_053_557_641_566_423_612
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = total_quota(Amount::MAX, u64::MAX).unwrap_err();
        assert!(matches!(err, Error::ArithmeticOverflow(_)));
    }

    #[test]
    fn test_check_requires_initial_balance() {
        let ledger = QuotaLedger::new();
        let err = ledger.check(&alice(), 0, 0, 5).unwrap_err();
        assert!(matches!(err, Error::InitialBalanceNotSet(_)));
    }

    #[test]
    fn test_check_then_commit_consumes() {
        let mut ledger = QuotaLedger::new();

        let charge = ledger.check(&alice(), 490_000, 1_000_000, 0).unwrap();
        assert_eq!(ledger.used_quota_of(&alice()), 0);
        ledger.commit(charge);
        assert_eq!(ledger.used_quota_of(&alice()), 490_000);

        let err = ledger.check(&alice(), 1, 1_000_000, 0).unwrap_err();
        match err {
            Error::QuotaExceeded {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_available_never_negative() {
        let mut ledger = QuotaLedger::new();
        let charge = ledger.check(&alice(), 532_500, 1_000_000, 1).unwrap();
        ledger.commit(charge);

        // Re-evaluated with a smaller total, availability floors at zero
        assert_eq!(ledger.available(&alice(), 490_000), 0);
    }
}
