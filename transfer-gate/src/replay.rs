//! Scenario replay
//!
//! A scenario is a TOML document with an optional `[config]` table and an
//! ordered list of `[[steps]]`. Steps run through a [`GateHandle`] against an
//! in-memory ledger and a [`ManualClock`]; the result is one record per step
//! outcome followed by the events that step emitted.
//!
//! ```toml
//! start_time = 1699999000
//!
//! [config]
//! administrators = ["owner"]
//!
//! [[steps]]
//! op = "issue"
//! caller = "owner"
//! to = "alice"
//! amount = 1000000
//!
//! [[steps]]
//! op = "set_time"
//! at = 1700000000
//! ```

use crate::{
    actor::{spawn_gate_actor, GateHandle},
    balances::MemoryLedger,
    clock::{Clock, ManualClock},
    config::Config,
    error::{Error, Result},
    gate::TransferGate,
    types::{AccountId, Amount, GateEvent, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Replay input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Clock value before the first step
    #[serde(default)]
    pub start_time: Timestamp,

    /// Gate configuration
    #[serde(default)]
    pub config: Config,

    /// Operations in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse scenario: {}", e)))
    }
}

/// One scenario operation
///
/// Amounts are `u64` here because TOML integers are 64-bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Move the clock to `at`
    SetTime {
        /// New time
        at: Timestamp,
    },
    /// Move the clock forward
    AdvanceTime {
        /// Seconds to add
        seconds: u64,
    },
    /// Issue new value
    Issue {
        /// Administrator
        caller: AccountId,
        /// Recipient
        to: AccountId,
        /// Amount
        amount: u64,
    },
    /// Directed transfer
    Transfer {
        /// Payer
        caller: AccountId,
        /// Recipient
        to: AccountId,
        /// Amount
        amount: u64,
    },
    /// Set allowance
    Approve {
        /// Funds owner
        owner: AccountId,
        /// Spender
        spender: AccountId,
        /// Allowance
        amount: u64,
    },
    /// Delegated transfer
    TransferFrom {
        /// Spender
        spender: AccountId,
        /// Payer
        from: AccountId,
        /// Recipient
        to: AccountId,
        /// Amount
        amount: u64,
    },
    /// Replace global lock
    SetGlobalLock {
        /// Administrator
        caller: AccountId,
        /// Lock flag
        locked: bool,
        /// First unlock time
        first_unlock_time: Timestamp,
        /// Second unlock time
        second_unlock_time: Timestamp,
    },
    /// Add exception
    AddException {
        /// Administrator
        caller: AccountId,
        /// Exempted account
        account: AccountId,
    },
    /// Remove exception
    RemoveException {
        /// Administrator
        caller: AccountId,
        /// Account
        account: AccountId,
    },
    /// Report an account's gate state
    Query {
        /// Account
        account: AccountId,
    },
}

impl Step {
    /// Operation name
    pub fn op(&self) -> &'static str {
        match self {
            Step::SetTime { .. } => "set_time",
            Step::AdvanceTime { .. } => "advance_time",
            Step::Issue { .. } => "issue",
            Step::Transfer { .. } => "transfer",
            Step::Approve { .. } => "approve",
            Step::TransferFrom { .. } => "transfer_from",
            Step::SetGlobalLock { .. } => "set_global_lock",
            Step::AddException { .. } => "add_exception",
            Step::RemoveException { .. } => "remove_exception",
            Step::Query { .. } => "query",
        }
    }
}

/// Quota state of a queried account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaView {
    /// Quota window not active
    Unrestricted,
    /// Inside the window, this much may still be sent
    Available(Amount),
    /// Inside the window without a recorded initial balance
    InitialBalanceNotSet,
}

/// Gate state of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    /// Account
    pub account: AccountId,
    /// Balance
    pub balance: Amount,
    /// Initial balance snapshot
    pub initial_balance: Amount,
    /// Used quota
    pub used_quota: Amount,
    /// Releasable quota
    pub quota: QuotaView,
    /// Hard-lock predicate
    pub locked: bool,
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// Position in the scenario
    pub index: usize,
    /// Operation name
    pub op: &'static str,
    /// Clock value when the step ran
    pub now: Timestamp,
    /// Whether the operation was applied
    pub ok: bool,
    /// Error reason label for rejected steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Error message for rejected steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Account state for `query` steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<AccountView>,
}

/// Replay output line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayRecord {
    /// Step outcome
    Step(StepOutcome),
    /// Event emitted by the preceding step
    Event(GateEvent),
}

/// Run `scenario` to completion.
///
/// Rejected steps are recorded and the replay continues; only actor failures
/// abort it.
pub async fn replay(scenario: &Scenario) -> Result<Vec<ReplayRecord>> {
    let clock = ManualClock::new(scenario.start_time);
    let gate = TransferGate::from_config(
        &scenario.config,
        MemoryLedger::new(),
        Arc::new(clock.clone()),
    )?;
    let (handle, join) = spawn_gate_actor(gate, scenario.config.actor.mailbox_capacity);

    let mut records = Vec::new();
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = run_step(&handle, &clock, index, step).await?;
        records.push(ReplayRecord::Step(outcome));

        for event in handle.drain_events().await? {
            records.push(ReplayRecord::Event(event));
        }
    }

    handle.shutdown().await?;
    join.await
        .map_err(|e| Error::Concurrency(format!("Gate actor failed: {}", e)))?;

    tracing::info!(
        steps = scenario.steps.len(),
        records = records.len(),
        "Scenario replayed"
    );

    Ok(records)
}

async fn run_step(
    handle: &GateHandle,
    clock: &ManualClock,
    index: usize,
    step: &Step,
) -> Result<StepOutcome> {
    let mut view = None;
    let result = match step.clone() {
        Step::SetTime { at } => {
            clock.set(at);
            Ok(())
        }
        Step::AdvanceTime { seconds } => {
            clock.advance(seconds);
            Ok(())
        }
        Step::Issue { caller, to, amount } => handle.issue(caller, to, amount.into()).await,
        Step::Transfer { caller, to, amount } => {
            handle.transfer(caller, to, amount.into()).await
        }
        Step::Approve {
            owner,
            spender,
            amount,
        } => handle.approve(owner, spender, amount.into()).await,
        Step::TransferFrom {
            spender,
            from,
            to,
            amount,
        } => handle.transfer_from(spender, from, to, amount.into()).await,
        Step::SetGlobalLock {
            caller,
            locked,
            first_unlock_time,
            second_unlock_time,
        } => {
            handle
                .set_global_lock(caller, locked, first_unlock_time, second_unlock_time)
                .await
        }
        Step::AddException { caller, account } => handle.add_exception(caller, account).await,
        Step::RemoveException { caller, account } => {
            handle.remove_exception(caller, account).await
        }
        Step::Query { account } => {
            view = Some(query(handle, account).await?);
            Ok(())
        }
    };

    let now = clock.now();
    match result {
        Ok(()) => Ok(StepOutcome {
            index,
            op: step.op(),
            now,
            ok: true,
            reason: None,
            error: None,
            view,
        }),
        Err(Error::Concurrency(msg)) => Err(Error::Concurrency(msg)),
        Err(e) => Ok(StepOutcome {
            index,
            op: step.op(),
            now,
            ok: false,
            reason: Some(e.reason()),
            error: Some(e.to_string()),
            view,
        }),
    }
}

async fn query(handle: &GateHandle, account: AccountId) -> Result<AccountView> {
    let quota = match handle.releasable_quota(account.clone()).await {
        Ok(None) => QuotaView::Unrestricted,
        Ok(Some(available)) => QuotaView::Available(available),
        Err(Error::InitialBalanceNotSet(_)) => QuotaView::InitialBalanceNotSet,
        Err(e) => return Err(e),
    };

    Ok(AccountView {
        balance: handle.balance_of(account.clone()).await?,
        initial_balance: handle.initial_balance_of(account.clone()).await?,
        used_quota: handle.used_quota_of(account.clone()).await?,
        locked: handle.is_locked(account.clone()).await?,
        quota,
        account,
    })
}
