//! Core types for the transfer gate
//!
//! All types are designed for:
//! - Deterministic serialization (serde)
//! - Exact integer arithmetic (token base units)

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Token amount in base units
pub type Amount = u128;

/// Logical time in seconds since the Unix epoch
pub type Timestamp = u64;

/// Account identifier (address, wallet id, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Notification emitted by a successful operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Global lock replaced. The second unlock time is not carried.
    LockStateChanged {
        /// New lock flag
        locked: bool,
        /// New first unlock time
        first_unlock_time: Timestamp,
    },
    /// Account added to the exception list
    ExceptionAdded {
        /// Exempted account
        account: AccountId,
    },
    /// Account removed from the exception list
    ExceptionRemoved {
        /// Account no longer exempt
        account: AccountId,
    },
    /// Value moved between accounts
    Transfer {
        /// Paying account
        from: AccountId,
        /// Receiving account
        to: AccountId,
        /// Amount moved
        amount: Amount,
    },
    /// New value issued to an account
    Issued {
        /// Receiving account
        to: AccountId,
        /// Amount issued
        amount: Amount,
    },
    /// Allowance set for delegated transfers
    Approval {
        /// Account whose funds may be spent
        owner: AccountId,
        /// Account allowed to spend
        spender: AccountId,
        /// New allowance
        amount: Amount,
    },
}

/// Event envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// Gap-free position in the event log
    pub sequence: u64,

    /// Logical time of the emitting operation
    pub timestamp: Timestamp,

    /// Event payload
    pub kind: EventKind,
}

/// Append-only buffer of emitted events awaiting a consumer
#[derive(Debug, Default)]
pub struct EventLog {
    next_sequence: u64,
    pending: Vec<GateEvent>,
}

impl EventLog {
    /// Create empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn emit(&mut self, timestamp: Timestamp, kind: EventKind) -> &GateEvent {
        let event = GateEvent {
            event_id: Uuid::now_v7(),
            sequence: self.next_sequence,
            timestamp,
            kind,
        };
        self.next_sequence += 1;
        self.pending.push(event);
        &self.pending[self.pending.len() - 1]
    }

    /// Events not yet drained
    pub fn pending(&self) -> &[GateEvent] {
        &self.pending
    }

    /// Take all pending events. Sequence numbers keep counting.
    pub fn drain(&mut self) -> Vec<GateEvent> {
        std::mem::take(&mut self.pending)
    }
}
