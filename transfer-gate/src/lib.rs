//! DelTran Transfer Gate
//!
//! Balance-gated transfer authorization for locked token allocations.
//!
//! # Architecture
//!
//! - **Hard lock**: non-exempt accounts cannot send before the first unlock time
//! - **Quota window**: between the two unlock times, senders are capped by a
//!   releasable amount derived from their first observed balance
//! - **Snapshot hook**: the balance ledger reports every balance change so the
//!   first non-zero balance of each account is captured exactly once
//! - **Single Writer**: one actor task applies operations in a total order
//!
//! # Invariants
//!
//! - A recorded initial balance never changes
//! - Used quota never decreases
//! - A rejected operation has no observable effect

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod auth;
pub mod balances;
pub mod clock;
pub mod config;
pub mod error;
pub mod exceptions;
pub mod gate;
pub mod lock;
pub mod metrics;
pub mod quota;
pub mod replay;
pub mod snapshot;
pub mod types;

// Re-exports
pub use actor::{spawn_gate_actor, GateHandle};
pub use auth::{AdminSet, Authorizer};
pub use balances::{BalanceHook, BalanceLedger, MemoryLedger};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use gate::TransferGate;
pub use lock::LockConfig;
pub use types::{AccountId, Amount, EventKind, GateEvent, Timestamp};
