//! Running balance per payer
//!
//! A cache over the ledger: `get(p)` always equals the sum of `p`'s ledger
//! deltas. It can be thrown away and rebuilt with [`BalanceIndex::from_ledger`].

use crate::{ledger::Ledger, types::PayerId, Error, Result};
use std::collections::BTreeMap;

/// Payer -> current point total
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BalanceIndex {
    totals: BTreeMap<PayerId, i64>,
}

impl BalanceIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every balance from the ledger
    pub fn from_ledger(ledger: &Ledger) -> Result<Self> {
        let mut index = Self::new();
        for entry in ledger.iter() {
            index.credit(&entry.payer, entry.points)?;
        }
        Ok(index)
    }

    /// Add a signed delta; returns the new total
    ///
    /// Fails with `InvalidEntry` if the total would leave the `i64` range.
    /// The index is unchanged in that case.
    pub fn credit(&mut self, payer: &PayerId, delta: i64) -> Result<i64> {
        let total = self.checked_total(payer, delta)?;
        self.totals.insert(payer.clone(), total);
        Ok(total)
    }

    /// The total `credit` would produce, without applying it
    pub fn checked_total(&self, payer: &PayerId, delta: i64) -> Result<i64> {
        let current = self.get(payer).unwrap_or(0);
        current.checked_add(delta).ok_or_else(|| {
            Error::InvalidEntry(format!(
                "Balance of {} would overflow: {} + {}",
                payer, current, delta
            ))
        })
    }

    /// Current balance, `None` if the payer was never credited
    pub fn get(&self, payer: &PayerId) -> Option<i64> {
        self.totals.get(payer).copied()
    }

    /// Sum of all positive balances, saturating at `i64::MAX`
    pub fn total_available(&self) -> i64 {
        self.totals
            .values()
            .fold(0i64, |total, &points| total.saturating_add(points.max(0)))
    }

    /// Balances ordered by payer
    pub fn iter(&self) -> impl Iterator<Item = (&PayerId, i64)> + '_ {
        self.totals.iter().map(|(payer, &points)| (payer, points))
    }

    /// Payers whose cached balance differs from `other`
    pub fn diff<'a>(&'a self, other: &'a BalanceIndex) -> Vec<&'a PayerId> {
        let mut diverged: Vec<&PayerId> = self
            .totals
            .iter()
            .filter(|(payer, &points)| other.get(payer).unwrap_or(0) != points)
            .map(|(payer, _)| payer)
            .collect();

        diverged.extend(
            other
                .totals
                .iter()
                .filter(|(payer, &points)| !self.totals.contains_key(*payer) && points != 0)
                .map(|(payer, _)| payer),
        );

        diverged
    }
}
