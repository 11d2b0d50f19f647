//! Actor-based serialization for the gate
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`TransferGate`] and applies operations one at a time
//! - Every operation observes the fully committed result of the previous one
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        Callers (API handlers, replay driver)          │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                GateHandle (Clone)                     │
//! │         Sends messages to actor mailbox               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               GateActor (Single Task)                 │
//! │   hard lock → quota gate → ledger → snapshot hook     │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    balances::BalanceLedger,
    gate::TransferGate,
    types::{AccountId, Amount, GateEvent, Timestamp},
    Error, Result,
};
use tokio::sync::{mpsc, oneshot};

type Reply<T> = oneshot::Sender<Result<T>>;

/// Message sent to the gate actor
#[derive(Debug)]
pub enum GateMessage {
    /// Directed transfer
    Transfer {
        caller: AccountId,
        to: AccountId,
        amount: Amount,
        response: Reply<()>,
    },

    /// Delegated transfer
    TransferFrom {
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
        response: Reply<()>,
    },

    /// Set allowance
    Approve {
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
        response: Reply<()>,
    },

    /// Issue new value
    Issue {
        caller: AccountId,
        to: AccountId,
        amount: Amount,
        response: Reply<()>,
    },

    /// Replace global lock
    SetGlobalLock {
        caller: AccountId,
        locked: bool,
        first_unlock_time: Timestamp,
        second_unlock_time: Timestamp,
        response: Reply<()>,
    },

    /// Add exception
    AddException {
        caller: AccountId,
        account: AccountId,
        response: Reply<()>,
    },

    /// Remove exception
    RemoveException {
        caller: AccountId,
        account: AccountId,
        response: Reply<()>,
    },

    /// Hard-lock predicate
    IsLocked {
        account: AccountId,
        response: Reply<bool>,
    },

    /// Initial balance query
    InitialBalanceOf {
        account: AccountId,
        response: Reply<Amount>,
    },

    /// Used quota query
    UsedQuotaOf {
        account: AccountId,
        response: Reply<Amount>,
    },

    /// Releasable quota query
    ReleasableQuota {
        account: AccountId,
        response: Reply<Option<Amount>>,
    },

    /// Balance query
    BalanceOf {
        account: AccountId,
        response: Reply<Amount>,
    },

    /// Take pending events
    DrainEvents { response: Reply<Vec<GateEvent>> },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the gate
#[derive(Debug)]
pub struct GateActor<L> {
    /// Gate state
    gate: TransferGate<L>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<GateMessage>,
}

impl<L: BalanceLedger> GateActor<L> {
    /// Create new actor
    pub fn new(gate: TransferGate<L>, mailbox: mpsc::Receiver<GateMessage>) -> Self {
        Self { gate, mailbox }
    }

    /// Run the actor event loop until shutdown or all handles are dropped.
    ///
    /// Returns the gate so its final state can be inspected.
    pub async fn run(mut self) -> TransferGate<L> {
        while let Some(msg) = self.mailbox.recv().await {
            if let GateMessage::Shutdown = msg {
                tracing::debug!("Gate actor shutting down");
                break;
            }
            self.handle_message(msg);
        }

        self.gate
    }

    /// Handle a single message. The gate call completes before the reply is
    /// sent, so replies are ordered with the state they describe.
    fn handle_message(&mut self, msg: GateMessage) {
        let gate = &mut self.gate;

        match msg {
            GateMessage::Transfer {
                caller,
                to,
                amount,
                response,
            } => {
                let _ = response.send(gate.transfer(&caller, &to, amount));
            }

            GateMessage::TransferFrom {
                spender,
                from,
                to,
                amount,
                response,
            } => {
                let _ = response.send(gate.transfer_from(&spender, &from, &to, amount));
            }

            GateMessage::Approve {
                owner,
                spender,
                amount,
                response,
            } => {
                let _ = response.send(gate.approve(&owner, &spender, amount));
            }

            GateMessage::Issue {
                caller,
                to,
                amount,
                response,
            } => {
                let _ = response.send(gate.issue(&caller, &to, amount));
            }

            GateMessage::SetGlobalLock {
                caller,
                locked,
                first_unlock_time,
                second_unlock_time,
                response,
            } => {
                let result =
                    gate.set_global_lock(&caller, locked, first_unlock_time, second_unlock_time);
                let _ = response.send(result);
            }

            GateMessage::AddException {
                caller,
                account,
                response,
            } => {
                let _ = response.send(gate.add_exception(&caller, &account));
            }

            GateMessage::RemoveException {
                caller,
                account,
                response,
            } => {
                let _ = response.send(gate.remove_exception(&caller, &account));
            }

            GateMessage::IsLocked { account, response } => {
                let _ = response.send(Ok(gate.is_locked(&account)));
            }

            GateMessage::InitialBalanceOf { account, response } => {
                let _ = response.send(Ok(gate.initial_balance_of(&account)));
            }

            GateMessage::UsedQuotaOf { account, response } => {
                let _ = response.send(Ok(gate.used_quota_of(&account)));
            }

            GateMessage::ReleasableQuota { account, response } => {
                let _ = response.send(gate.releasable_quota(&account));
            }

            GateMessage::BalanceOf { account, response } => {
                let _ = response.send(Ok(gate.balance_of(&account)));
            }

            GateMessage::DrainEvents { response } => {
                let _ = response.send(Ok(gate.drain_events()));
            }

            GateMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct GateHandle {
    sender: mpsc::Sender<GateMessage>,
}

impl GateHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<GateMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> GateMessage) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Directed transfer
    pub async fn transfer(&self, caller: AccountId, to: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| GateMessage::Transfer {
            caller,
            to,
            amount,
            response,
        })
        .await
    }

    /// Delegated transfer
    pub async fn transfer_from(
        &self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        self.request(|response| GateMessage::TransferFrom {
            spender,
            from,
            to,
            amount,
            response,
        })
        .await
    }

    /// Set allowance
    pub async fn approve(&self, owner: AccountId, spender: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| GateMessage::Approve {
            owner,
            spender,
            amount,
            response,
        })
        .await
    }

    /// Issue new value
    pub async fn issue(&self, caller: AccountId, to: AccountId, amount: Amount) -> Result<()> {
        self.request(|response| GateMessage::Issue {
            caller,
            to,
            amount,
            response,
        })
        .await
    }

    /// Replace global lock
    pub async fn set_global_lock(
        &self,
        caller: AccountId,
        locked: bool,
        first_unlock_time: Timestamp,
        second_unlock_time: Timestamp,
    ) -> Result<()> {
        self.request(|response| GateMessage::SetGlobalLock {
            caller,
            locked,
            first_unlock_time,
            second_unlock_time,
            response,
        })
        .await
    }

    /// Add exception
    pub async fn add_exception(&self, caller: AccountId, account: AccountId) -> Result<()> {
        self.request(|response| GateMessage::AddException {
            caller,
            account,
            response,
        })
        .await
    }

    /// Remove exception
    pub async fn remove_exception(&self, caller: AccountId, account: AccountId) -> Result<()> {
        self.request(|response| GateMessage::RemoveException {
            caller,
            account,
            response,
        })
        .await
    }

    /// Hard-lock predicate
    pub async fn is_locked(&self, account: AccountId) -> Result<bool> {
        self.request(|response| GateMessage::IsLocked { account, response })
            .await
    }

    /// Initial balance
    pub async fn initial_balance_of(&self, account: AccountId) -> Result<Amount> {
        self.request(|response| GateMessage::InitialBalanceOf { account, response })
            .await
    }

    /// Used quota
    pub async fn used_quota_of(&self, account: AccountId) -> Result<Amount> {
        self.request(|response| GateMessage::UsedQuotaOf { account, response })
            .await
    }

    /// Releasable quota, `None` outside the quota window
    pub async fn releasable_quota(&self, account: AccountId) -> Result<Option<Amount>> {
        self.request(|response| GateMessage::ReleasableQuota { account, response })
            .await
    }

    /// Balance
    pub async fn balance_of(&self, account: AccountId) -> Result<Amount> {
        self.request(|response| GateMessage::BalanceOf { account, response })
            .await
    }

    /// Take pending events
    pub async fn drain_events(&self) -> Result<Vec<GateEvent>> {
        self.request(|response| GateMessage::DrainEvents { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(GateMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the gate actor.
///
/// The join handle yields the gate once the actor stops.
pub fn spawn_gate_actor<L>(
    gate: TransferGate<L>,
    mailbox_capacity: usize,
) -> (GateHandle, tokio::task::JoinHandle<TransferGate<L>>)
where
    L: BalanceLedger + 'static,
{
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = GateActor::new(gate, rx);

    let join = tokio::spawn(actor.run());

    (GateHandle::new(tx), join)
}
