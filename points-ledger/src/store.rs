//! Points store: the synchronous core API
//!
//! Owns the payer registry, the ledger and the balance index. Every write
//! goes through `&mut self`, so a spend's read -> plan -> commit sequence runs
//! under one exclusive borrow and cannot interleave with another write.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use points_ledger::{PayerId, PointsStore, SpendPolicy};
//!
//! let mut store = PointsStore::new(SpendPolicy::Partial);
//! store.register_payer(PayerId::new("DANNON"), "Dannon").unwrap();
//! store.record_purchase(&PayerId::new("DANNON"), 300, Utc::now()).unwrap();
//!
//! let plan = store.spend(200).unwrap();
//! assert_eq!(plan.deduction_for(&PayerId::new("DANNON")), -200);
//! assert_eq!(store.get_balance(&PayerId::new("DANNON")).unwrap().points, 100);
//! ```

use crate::{
    allocator::{Allocator, SpendPolicy},
    balance::BalanceIndex,
    ledger::Ledger,
    payer::PayerRegistry,
    types::{LedgerEntry, Payer, PayerBalance, PayerId, SpendPlan},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// In-memory points store
#[derive(Debug, Default, Clone)]
pub struct PointsStore {
    payers: PayerRegistry,
    ledger: Ledger,
    balances: BalanceIndex,
    allocator: Allocator,
}

impl PointsStore {
    /// Empty store with a shortfall policy
    pub fn new(policy: SpendPolicy) -> Self {
        Self {
            allocator: Allocator::new(policy),
            ..Self::default()
        }
    }

    /// Register a payer, created now
    pub fn register_payer(&mut self, id: PayerId, name: impl Into<String>) -> Result<Payer> {
        self.payers.register(id, name, Utc::now())
    }

    /// Record points earned by a purchase
    ///
    /// On error nothing is written.
    pub fn record_purchase(
        &mut self,
        payer_id: &PayerId,
        points: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<PayerBalance> {
        let payer = self
            .payers
            .get(payer_id)
            .cloned()
            .ok_or_else(|| Error::PayerNotFound(payer_id.to_string()))?;

        if points < 0 {
            return Err(Error::InvalidEntry(format!(
                "Purchase points must not be negative: {}",
                points
            )));
        }

        // Overflow is caught before the ledger is touched
        self.balances.checked_total(payer_id, points)?;

        self.ledger
            .append(LedgerEntry::purchase(payer_id.clone(), points, timestamp))?;
        let points = self.balances.credit(payer_id, points)?;

        Ok(PayerBalance { payer, points })
    }

    /// Spend points, oldest first, debits timestamped now
    pub fn spend(&mut self, points: i64) -> Result<SpendPlan> {
        self.spend_at(points, Utc::now())
    }

    /// Spend points with debits timestamped `now`
    ///
    /// The plan is computed without touching the ledger; the compensating
    /// debits are then appended together. A failed spend writes nothing.
    pub fn spend_at(&mut self, points: i64, now: DateTime<Utc>) -> Result<SpendPlan> {
        let plan = self
            .allocator
            .plan(&self.ledger, &self.balances, self.payers.iter().map(|p| &p.id), points)?;

        let debits: Vec<LedgerEntry> = plan
            .allocations
            .iter()
            .map(|(payer, &deduction)| LedgerEntry::spend(payer.clone(), -deduction, now))
            .collect();

        self.ledger.append_all(debits)?;
        for (payer, &deduction) in &plan.allocations {
            self.balances.credit(payer, deduction)?;
        }

        Ok(plan)
    }

    /// Balance of one registered payer (0 before any purchase)
    pub fn get_balance(&self, payer_id: &PayerId) -> Result<PayerBalance> {
        let payer = self
            .payers
            .get(payer_id)
            .ok_or_else(|| Error::PayerNotFound(payer_id.to_string()))?;

        Ok(PayerBalance {
            payer: payer.clone(),
            points: self.balances.get(payer_id).unwrap_or(0),
        })
    }

    /// Balance of every registered payer
    pub fn get_all_balances(&self) -> BTreeMap<PayerId, i64> {
        self.payers
            .iter()
            .map(|payer| (payer.id.clone(), self.balances.get(&payer.id).unwrap_or(0)))
            .collect()
    }

    /// Balance of every registered payer, with payer details
    pub fn payer_balances(&self) -> Vec<PayerBalance> {
        self.payers
            .iter()
            .map(|payer| PayerBalance {
                payer: payer.clone(),
                points: self.balances.get(&payer.id).unwrap_or(0),
            })
            .collect()
    }

    /// Points available across all payers
    pub fn total_available(&self) -> i64 {
        self.balances.total_available()
    }

    /// All registered payers ordered by id
    pub fn payers(&self) -> Vec<Payer> {
        self.payers.iter().cloned().collect()
    }

    /// Look up a payer by exact display name
    pub fn find_payer_by_name(&self, name: &str) -> Option<Payer> {
        self.payers.get_by_name(name).cloned()
    }

    /// Payers whose name matches a prefix query
    pub fn search_payers(&self, query: &str) -> Vec<Payer> {
        self.payers.search(query).into_iter().cloned().collect()
    }

    /// Read-only view of the ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Check the balance index against a full replay of the ledger
    pub fn verify(&self) -> Result<()> {
        let replayed = BalanceIndex::from_ledger(&self.ledger)?;
        let diverged = self.balances.diff(&replayed);

        if diverged.is_empty() {
            return Ok(());
        }

        let payers: Vec<&str> = diverged.iter().map(|p| p.as_str()).collect();
        Err(Error::InvariantViolation(format!(
            "Balance index diverged from ledger for: {}",
            payers.join(", ")
        )))
    }
}
