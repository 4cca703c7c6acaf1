//! Loyalty Points Ledger
//!
//! Tracks points earned by purchases attributed to paying partners ("payers")
//! and spends them oldest-first across payers.
//!
//! # Architecture
//!
//! - **Ledger**: append-only, time-ordered record of point deltas
//! - **Balance Index**: running total per payer, rebuildable from the ledger
//! - **Allocator**: oldest-credit-first spend planning
//! - **Store**: owns the above and commits spend plans atomically
//! - **Actor**: single writer task serializing concurrent callers

#![forbid(unsafe_code)]
//!
//! # Invariants
//!
//! - Balance consistency: index(p) == Σ ledger deltas of p, always
//! - No overdraft: a spend never drives a payer below zero
//! - Deterministic replay: same ledger → same plan
//! - Append-only: entries never modified or deleted

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod ledger;
pub mod balance;
pub mod payer;
pub mod allocator;
pub mod store;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{EntryKind, LedgerEntry, Payer, PayerBalance, PayerId, SpendPlan};
pub use ledger::Ledger;
pub use balance::BalanceIndex;
pub use payer::PayerRegistry;
pub use allocator::{Allocator, SpendPolicy};
pub use store::PointsStore;
pub use actor::{spawn_points_actor, PointsHandle};
pub use config::Config;
pub use metrics::Metrics;
