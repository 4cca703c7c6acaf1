//! Core types for the points ledger
//!
//! Points are whole numbers carried as `i64`. Ledger deltas are signed:
//! positive for purchase credits, negative for spend debits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Payer identifier (e.g. "DANNON")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayerId(String);

impl PayerId {
    /// Create new payer ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank ids are never valid ledger keys
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A partner whose purchases accrue points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    /// Unique payer ID
    pub id: PayerId,

    /// Display name
    pub name: String,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Origin of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Points earned by a purchase (credit)
    Purchase,
    /// Points removed by a spend allocation (debit)
    Spend,
}

/// Immutable point delta for one payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (UUIDv7)
    pub entry_id: Uuid,

    /// Insertion order, assigned by the ledger on append
    pub sequence: u64,

    /// Payer the points belong to
    pub payer: PayerId,

    /// Signed point delta
    pub points: i64,

    /// When the points were earned or spent
    pub timestamp: DateTime<Utc>,

    /// Purchase or spend
    pub kind: EntryKind,
}

impl LedgerEntry {
    /// Purchase credit
    pub fn purchase(payer: PayerId, points: i64, timestamp: DateTime<Utc>) -> Self {
        Self::new(payer, points, timestamp, EntryKind::Purchase)
    }

    /// Compensating debit for `points` spent (stored negated)
    pub fn spend(payer: PayerId, points: i64, timestamp: DateTime<Utc>) -> Self {
        Self::new(payer, -points, timestamp, EntryKind::Spend)
    }

    fn new(payer: PayerId, points: i64, timestamp: DateTime<Utc>, kind: EntryKind) -> Self {
        Self {
            entry_id: Uuid::now_v7(),
            sequence: 0,
            payer,
            points,
            timestamp,
            kind,
        }
    }

    /// Positive delta
    pub fn is_credit(&self) -> bool {
        self.points > 0
    }

    /// Negative delta
    pub fn is_debit(&self) -> bool {
        self.points < 0
    }
}

/// Current balance of one payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerBalance {
    /// The payer
    pub payer: Payer,

    /// Points currently available
    pub points: i64,
}

/// Per-payer deduction result of one spend request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendPlan {
    /// Points requested by the caller
    pub requested: i64,

    /// Points actually removed across all payers
    pub allocated: i64,

    /// Requested points that could not be covered
    pub unfulfilled: i64,

    /// Payer -> points deducted (negative); payers with no deduction are absent
    pub allocations: BTreeMap<PayerId, i64>,
}

impl SpendPlan {
    /// Nothing was deducted
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Signed deduction for a payer (0 if untouched)
    pub fn deduction_for(&self, payer: &PayerId) -> i64 {
        self.allocations.get(payer).copied().unwrap_or(0)
    }

    /// Request fully covered
    pub fn is_fulfilled(&self) -> bool {
        self.unfulfilled == 0
    }
}
