//! Property-based tests for gate invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Snapshot immutability: a recorded initial balance never changes
//! - Quota monotonicity: used quota only grows, by exactly the gated amount
//! - Atomicity: a rejected transfer, direct or delegated, changes nothing
//! - Transparency: with the lock off the gate never interferes
//! - Value conservation: transfers never change total supply

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use transfer_gate::{
    quota::{self, SECONDS_PER_MONTH},
    AccountId, AdminSet, Amount, ManualClock, MemoryLedger, Timestamp, TransferGate,
};

const FIRST_UNLOCK: Timestamp = 1_700_000_000;
const SECOND_UNLOCK: Timestamp = FIRST_UNLOCK + 30 * SECONDS_PER_MONTH;
const ACCOUNTS: [&str; 4] = ["a", "b", "c", "d"];

/// One operation in a random history
#[derive(Debug, Clone)]
enum Op {
    Transfer { from: usize, to: usize, amount: Amount },
    Approve { owner: usize, spender: usize, amount: Amount },
    TransferFrom { spender: usize, from: usize, to: usize, amount: Amount },
    Advance { seconds: u64 },
    ToggleException { account: usize },
}

/// Strategy for generating operations
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..ACCOUNTS.len(), 0..ACCOUNTS.len(), 0u128..400_000u128)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        2 => (0..ACCOUNTS.len(), 0..ACCOUNTS.len(), 0u128..400_000u128)
            .prop_map(|(owner, spender, amount)| Op::Approve { owner, spender, amount }),
        3 => (0..ACCOUNTS.len(), 0..ACCOUNTS.len(), 0..ACCOUNTS.len(), 0u128..400_000u128)
            .prop_map(|(spender, from, to, amount)| Op::TransferFrom { spender, from, to, amount }),
        2 => (0u64..3 * SECONDS_PER_MONTH).prop_map(|seconds| Op::Advance { seconds }),
        1 => (0..ACCOUNTS.len()).prop_map(|account| Op::ToggleException { account }),
    ]
}

fn account(index: usize) -> AccountId {
    AccountId::new(ACCOUNTS[index])
}

fn owner() -> AccountId {
    AccountId::new("owner")
}

/// Create test gate with `a` and `b` funded, then the lock switched on
fn create_test_gate(start: Timestamp, locked: bool) -> (TransferGate<MemoryLedger>, ManualClock) {
    let clock = ManualClock::new(start);
    let mut gate = TransferGate::new(
        MemoryLedger::new(),
        Arc::new(clock.clone()),
        Arc::new(AdminSet::new([owner()])),
    );
    gate.issue(&owner(), &account(0), 1_000_000).unwrap();
    gate.issue(&owner(), &account(1), 250_000).unwrap();
    gate.set_global_lock(&owner(), locked, FIRST_UNLOCK, SECOND_UNLOCK)
        .unwrap();
    gate.drain_events();
    (gate, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: random histories keep every gate invariant
    #[test]
    fn prop_invariants_hold_over_random_histories(
        start in (FIRST_UNLOCK - 5 * 86_400)..(FIRST_UNLOCK + 2 * SECONDS_PER_MONTH),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let (mut gate, clock) = create_test_gate(start, true);
        let supply = gate.total_supply();
        let mut exempt = [false; 4];
        let mut snapshots: HashMap<AccountId, Amount> = HashMap::new();

        for op in ops {
            match op {
                Op::Advance { seconds } => clock.advance(seconds),
                Op::ToggleException { account: i } => {
                    if exempt[i] {
                        gate.remove_exception(&owner(), &account(i)).unwrap();
                    } else {
                        gate.add_exception(&owner(), &account(i)).unwrap();
                    }
                    exempt[i] = !exempt[i];
                }
                Op::Approve { owner, spender, amount } => {
                    gate.approve(&account(owner), &account(spender), amount).unwrap();
                }
                Op::Transfer { .. } | Op::TransferFrom { .. } => {
                    let (spender, from, to, amount) = match op {
                        Op::Transfer { from, to, amount } => (None, from, to, amount),
                        Op::TransferFrom { spender, from, to, amount } => {
                            (Some(account(spender)), from, to, amount)
                        }
                        _ => unreachable!(),
                    };
                    let (from, to) = (account(from), account(to));
                    let used_before = gate.used_quota_of(&from);
                    let balance_before = gate.balance_of(&from);
                    let to_before = gate.balance_of(&to);
                    let allowance_before = spender
                        .as_ref()
                        .map(|s| gate.allowance(&from, s));
                    let in_window = clock.now_in(FIRST_UNLOCK, SECOND_UNLOCK);
                    gate.drain_events();

                    let result = match &spender {
                        Some(s) => gate.transfer_from(s, &from, &to, amount),
                        None => gate.transfer(&from, &to, amount),
                    };

                    match result {
                        Ok(()) => {
                            let expected = if in_window { used_before + amount } else { used_before };
                            prop_assert_eq!(gate.used_quota_of(&from), expected);
                            prop_assert_eq!(gate.pending_events().len(), 1);
                        }
                        Err(_) => {
                            prop_assert_eq!(gate.used_quota_of(&from), used_before);
                            prop_assert_eq!(gate.balance_of(&from), balance_before);
                            prop_assert_eq!(gate.balance_of(&to), to_before);
                            prop_assert_eq!(
                                spender.as_ref().map(|s| gate.allowance(&from, s)),
                                allowance_before
                            );
                            prop_assert!(gate.pending_events().is_empty());
                        }
                    }
                }
            }

            prop_assert_eq!(gate.total_supply(), supply);

            for i in 0..ACCOUNTS.len() {
                let id = account(i);
                let initial = gate.initial_balance_of(&id);
                match snapshots.get(&id) {
                    Some(recorded) => prop_assert_eq!(initial, *recorded),
                    None if initial != 0 => {
                        snapshots.insert(id, initial);
                    }
                    None => {}
                }
            }
        }
    }

    /// Property: with the lock off, any affordable transfer succeeds without quota
    #[test]
    fn prop_unlocked_gate_is_transparent(
        start in (FIRST_UNLOCK - SECONDS_PER_MONTH)..(SECOND_UNLOCK + SECONDS_PER_MONTH),
        amount in 0u128..=1_000_000u128,
    ) {
        let (mut gate, _clock) = create_test_gate(start, false);
        prop_assert!(gate.transfer(&account(0), &account(2), amount).is_ok());
        prop_assert_eq!(gate.used_quota_of(&account(0)), 0);
        prop_assert_eq!(gate.balance_of(&account(2)), amount);
    }

    /// Property: inside the window the releasable total matches the formula
    #[test]
    fn prop_releasable_matches_formula(
        initial in 1u128..10_000_000_000u128,
        elapsed in 0u64..(30 * SECONDS_PER_MONTH),
    ) {
        let clock = ManualClock::new(FIRST_UNLOCK - 1);
        let mut gate = TransferGate::new(
            MemoryLedger::new(),
            Arc::new(clock.clone()),
            Arc::new(AdminSet::new([owner()])),
        );
        gate.issue(&owner(), &account(0), initial).unwrap();
        gate.set_global_lock(&owner(), true, FIRST_UNLOCK, SECOND_UNLOCK).unwrap();
        clock.set(FIRST_UNLOCK + elapsed);

        let months = elapsed / SECONDS_PER_MONTH;
        let expected = initial * 49 / 100 + Amount::from(months) * (initial * 425 / 10_000);
        prop_assert_eq!(quota::total_quota(initial, months).unwrap(), expected);
        prop_assert_eq!(gate.releasable_quota(&account(0)).unwrap(), Some(expected));
    }

    /// Property: the hard lock rejects every amount for non-exempt senders
    #[test]
    fn prop_hard_lock_rejects_everything(
        before in 1u64..(365 * 86_400),
        amount in 0u128..2_000_000u128,
    ) {
        let (mut gate, _clock) = create_test_gate(FIRST_UNLOCK - before, true);
        let result = gate.transfer(&account(0), &account(1), amount);
        prop_assert!(matches!(result, Err(transfer_gate::Error::AccountLocked(_))));
    }
}

/// Window membership for the manual clock
trait WindowExt {
    fn now_in(&self, start: Timestamp, end: Timestamp) -> bool;
}

impl WindowExt for ManualClock {
    fn now_in(&self, start: Timestamp, end: Timestamp) -> bool {
        use transfer_gate::Clock;
        let now = self.now();
        now >= start && now < end
    }
}
