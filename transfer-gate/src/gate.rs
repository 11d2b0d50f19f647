//! Transfer orchestration
//!
//! This module ties together the lock configuration, exception list,
//! snapshot tracker, quota ledger and balance ledger into the operations
//! callers actually invoke.
//!
//! Every outbound movement runs the same sequence for the paying account:
//!
//! 1. hard lock: reject with `AccountLocked`
//! 2. quota gate: reject with `InitialBalanceNotSet` / `QuotaExceeded`
//! 3. ledger movement: reject with `InsufficientFunds` / `InsufficientAllowance`
//! 4. commit the quota charge, emit the event
//!
//! Snapshot recording happens inside step 3 through the ledger's hook. The
//! clock is read once per operation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use transfer_gate::{AccountId, AdminSet, ManualClock, MemoryLedger, TransferGate};
//!
//! let owner = AccountId::new("owner");
//! let clock = ManualClock::new(0);
//! let mut gate = TransferGate::new(
//!     MemoryLedger::new(),
//!     Arc::new(clock.clone()),
//!     Arc::new(AdminSet::new([owner.clone()])),
//! );
//!
//! gate.issue(&owner, &owner, 1_000).unwrap();
//! gate.set_global_lock(&owner, true, 100, 200).unwrap();
//! assert!(gate.is_locked(&owner));
//!
//! clock.set(100);
//! assert_eq!(gate.releasable_quota(&owner).unwrap(), Some(490));
//! ```

use crate::{
    auth::{AdminSet, Authorizer},
    balances::BalanceLedger,
    clock::Clock,
    config::Config,
    error::{Error, Result},
    exceptions::ExceptionRegistry,
    lock::LockConfig,
    metrics::GateMetrics,
    quota::{self, QuotaCharge, QuotaLedger},
    snapshot::SnapshotTracker,
    types::{AccountId, Amount, EventKind, EventLog, GateEvent, Timestamp},
};
use std::sync::Arc;

/// Balance-gated transfer authorization engine
#[derive(Debug)]
pub struct TransferGate<L> {
    /// Balance ledger collaborator
    ledger: L,

    /// Time source
    clock: Arc<dyn Clock>,

    /// Administrative capability check
    authorizer: Arc<dyn Authorizer>,

    /// Global lock
    lock: LockConfig,

    /// Accounts exempt from the hard lock
    exceptions: ExceptionRegistry,

    /// Initial balances
    snapshots: SnapshotTracker,

    /// Consumed quota
    quotas: QuotaLedger,

    /// Emitted events
    events: EventLog,

    /// Optional Prometheus counters
    metrics: Option<GateMetrics>,
}

impl<L: BalanceLedger> TransferGate<L> {
    /// Create gate with the lock off
    pub fn new(ledger: L, clock: Arc<dyn Clock>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            ledger,
            clock,
            authorizer,
            lock: LockConfig::default(),
            exceptions: ExceptionRegistry::new(),
            snapshots: SnapshotTracker::new(),
            quotas: QuotaLedger::new(),
            events: EventLog::new(),
            metrics: None,
        }
    }

    /// Build from configuration: administrators, starting lock and metrics
    pub fn from_config(config: &Config, ledger: L, clock: Arc<dyn Clock>) -> Result<Self> {
        let authorizer = Arc::new(AdminSet::new(config.administrators.iter().cloned()));
        let mut gate = Self::new(ledger, clock, authorizer).with_lock(config.lock.to_lock_config());

        if config.metrics_enabled {
            gate = gate.with_metrics(GateMetrics::new()?);
        }

        tracing::info!(
            service = %config.service_name,
            administrators = config.administrators.len(),
            locked = config.lock.locked,
            "Transfer gate configured"
        );

        Ok(gate)
    }

    /// Set the starting lock without emitting an event
    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    /// Attach metrics collector
    pub fn with_metrics(mut self, metrics: GateMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    // Administrative operations

    /// Replace the global lock.
    ///
    /// The emitted event carries the lock flag and the first unlock time only.
    pub fn set_global_lock(
        &mut self,
        caller: &AccountId,
        locked: bool,
        first_unlock_time: Timestamp,
        second_unlock_time: Timestamp,
    ) -> Result<()> {
        self.authorize(caller, "set_global_lock")?;
        let now = self.clock.now();

        let previous = self
            .lock
            .replace(LockConfig::new(locked, first_unlock_time, second_unlock_time));

        tracing::info!(
            locked,
            first_unlock_time,
            second_unlock_time,
            was_locked = previous.is_locked,
            "Global lock replaced"
        );

        self.events.emit(
            now,
            EventKind::LockStateChanged {
                locked,
                first_unlock_time,
            },
        );
        self.record_admin("set_global_lock");
        Ok(())
    }

    /// Exempt `account` from the hard lock. Emits even if already exempt.
    pub fn add_exception(&mut self, caller: &AccountId, account: &AccountId) -> Result<()> {
        self.authorize(caller, "add_exception")?;
        let now = self.clock.now();

        let inserted = self.exceptions.add(account.clone());
        tracing::info!(account = %account, inserted, "Exception added");

        self.events.emit(
            now,
            EventKind::ExceptionAdded {
                account: account.clone(),
            },
        );
        self.record_admin("add_exception");
        Ok(())
    }

    /// Remove `account` from the exception list. Emits even if absent.
    pub fn remove_exception(&mut self, caller: &AccountId, account: &AccountId) -> Result<()> {
        self.authorize(caller, "remove_exception")?;
        let now = self.clock.now();

        let removed = self.exceptions.remove(account);
        tracing::info!(account = %account, removed, "Exception removed");

        self.events.emit(
            now,
            EventKind::ExceptionRemoved {
                account: account.clone(),
            },
        );
        self.record_admin("remove_exception");
        Ok(())
    }

    /// Issue new value to `to`. Not subject to lock or quota.
    pub fn issue(&mut self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        self.authorize(caller, "issue")?;
        let now = self.clock.now();

        let snapshots_before = self.snapshots.len();
        self.ledger.issue(to, amount, &mut self.snapshots)?;
        self.record_snapshots(snapshots_before);

        self.events.emit(
            now,
            EventKind::Issued {
                to: to.clone(),
                amount,
            },
        );
        self.record_admin("issue");
        Ok(())
    }

    // Transfers

    /// Directed transfer: `caller` pays `to` from its own balance
    pub fn transfer(&mut self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        let now = self.clock.now();

        let charge = match self.gate_outbound(caller, amount, now) {
            Ok(charge) => charge,
            Err(e) => return Err(self.reject(caller, amount, e)),
        };

        let snapshots_before = self.snapshots.len();
        if let Err(e) = self.ledger.move_value(caller, to, amount, &mut self.snapshots) {
            return Err(self.reject(caller, amount, e));
        }

        self.complete_transfer(caller, to, amount, charge, snapshots_before, now);
        Ok(())
    }

    /// Delegated transfer: `spender` moves `from`'s funds to `to`.
    ///
    /// Lock and quota apply to `from`, the paying account.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let now = self.clock.now();

        let charge = match self.gate_outbound(from, amount, now) {
            Ok(charge) => charge,
            Err(e) => return Err(self.reject(from, amount, e)),
        };

        let snapshots_before = self.snapshots.len();
        if let Err(e) = self
            .ledger
            .move_value_from(spender, from, to, amount, &mut self.snapshots)
        {
            return Err(self.reject(from, amount, e));
        }

        self.complete_transfer(from, to, amount, charge, snapshots_before, now);
        Ok(())
    }

    /// Allow `spender` to move up to `amount` of `owner`'s funds
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<()> {
        let now = self.clock.now();
        self.ledger.approve(owner, spender, amount)?;

        self.events.emit(
            now,
            EventKind::Approval {
                owner: owner.clone(),
                spender: spender.clone(),
                amount,
            },
        );
        Ok(())
    }

    // Queries

    /// Whether `account` is currently in the hard-lock phase
    pub fn is_locked(&self, account: &AccountId) -> bool {
        self.is_locked_at(account, self.clock.now())
    }

    /// Whether `account` is on the exception list
    pub fn is_exception(&self, account: &AccountId) -> bool {
        self.exceptions.contains(account)
    }

    /// Recorded initial balance, 0 if never observed non-zero
    pub fn initial_balance_of(&self, account: &AccountId) -> Amount {
        self.snapshots.initial_balance_of(account)
    }

    /// Quota consumed so far
    pub fn used_quota_of(&self, account: &AccountId) -> Amount {
        self.quotas.used_quota_of(account)
    }

    /// Quota `account` may still send right now.
    ///
    /// `None` when the quota window is not active and the gate does not cap
    /// outbound transfers.
    pub fn releasable_quota(&self, account: &AccountId) -> Result<Option<Amount>> {
        let now = self.clock.now();
        if !self.lock.in_quota_window(now) {
            return Ok(None);
        }

        let initial = self.snapshots.initial_balance_of(account);
        if initial == 0 {
            return Err(Error::InitialBalanceNotSet(account.clone()));
        }

        let months = quota::months_elapsed(now, self.lock.first_unlock_time);
        let total = quota::total_quota(initial, months)?;
        Ok(Some(self.quotas.available(account, total)))
    }

    /// Current balance
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.ledger.balance_of(account)
    }

    /// Remaining allowance
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.ledger.allowance(owner, spender)
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    /// Events not yet drained
    pub fn pending_events(&self) -> &[GateEvent] {
        self.events.pending()
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GateEvent> {
        self.events.drain()
    }

    // Internals

    fn authorize(&self, caller: &AccountId, operation: &'static str) -> Result<()> {
        if self.authorizer.is_administrator(caller) {
            return Ok(());
        }

        tracing::warn!(caller = %caller, operation, "Unauthorized administrative call");
        Err(Error::Unauthorized(caller.clone()))
    }

    fn is_locked_at(&self, account: &AccountId, now: Timestamp) -> bool {
        self.lock.in_hard_lock(now) && !self.exceptions.contains(account)
    }

    /// Hard lock then quota gate for the paying account.
    ///
    /// Returns the quota charge to commit once value has moved, or `None`
    /// outside the quota window.
    fn gate_outbound(
        &self,
        payer: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Option<QuotaCharge>> {
        if self.is_locked_at(payer, now) {
            return Err(Error::AccountLocked(payer.clone()));
        }

        // Exception membership does not exempt from the quota gate
        if !self.lock.in_quota_window(now) {
            return Ok(None);
        }

        let initial = self.snapshots.initial_balance_of(payer);
        let months = quota::months_elapsed(now, self.lock.first_unlock_time);
        self.quotas.check(payer, amount, initial, months).map(Some)
    }

    fn complete_transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        charge: Option<QuotaCharge>,
        snapshots_before: usize,
        now: Timestamp,
    ) {
        let quota_gated = charge.is_some();
        if let Some(charge) = charge {
            self.quotas.commit(charge);
        }

        self.record_snapshots(snapshots_before);
        if let Some(metrics) = &self.metrics {
            metrics.record_allowed(quota_gated);
        }

        tracing::debug!(
            from = %from,
            to = %to,
            amount = %amount,
            quota_gated,
            used_quota = %self.quotas.used_quota_of(from),
            "Transfer allowed"
        );

        self.events.emit(
            now,
            EventKind::Transfer {
                from: from.clone(),
                to: to.clone(),
                amount,
            },
        );
    }

    fn reject(&self, payer: &AccountId, amount: Amount, error: Error) -> Error {
        tracing::warn!(
            payer = %payer,
            amount = %amount,
            reason = error.reason(),
            "Transfer rejected: {}",
            error
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_rejected(error.reason());
        }

        error
    }

    fn record_snapshots(&self, before: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.record_snapshots(self.snapshots.len().saturating_sub(before));
        }
    }

    fn record_admin(&self, operation: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_admin(operation);
        }
    }
}
