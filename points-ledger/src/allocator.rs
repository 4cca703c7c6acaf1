//! Oldest-first spend allocation
//!
//! # Algorithm
//!
//! 1. Seed each known payer's remaining balance from the balance index
//! 2. Scan the ledger oldest first, skipping debits
//! 3. For each credit take `min(remaining request, credit, payer remaining)`
//! 4. Stop once the request is covered
//!
//! The payer's remaining balance, not the credit amount, caps every take: a
//! payer whose points were partly spent before still has all its credits in
//! the ledger, and those credits together exceed what is actually left.
//!
//! # Example
//!
//! ```text
//! Ledger (oldest first):
//!   t=1  A +500
//!   t=2  B +349
//!   t=3  B +251
//!
//! spend(850):
//!   t=1  take 500 from A   (request 350 left)
//!   t=2  take 349 from B   (request   1 left)
//!   t=3  take   1 from B   (request   0 left)
//!
//! Plan: A -500, B -350
//! ```
//!
//! Planning is read-only. Committing the plan (compensating debits) is the
//! store's job.

use crate::{
    balance::BalanceIndex,
    ledger::Ledger,
    types::{PayerId, SpendPlan},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What to do when a spend asks for more points than exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendPolicy {
    /// Allocate everything available and report the shortfall as `unfulfilled`
    #[default]
    Partial,
    /// Fail with `InsufficientPoints` and change nothing
    Reject,
}

impl fmt::Display for SpendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpendPolicy::Partial => write!(f, "partial"),
            SpendPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for SpendPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "partial" => Ok(SpendPolicy::Partial),
            "reject" => Ok(SpendPolicy::Reject),
            other => Err(Error::Config(format!("Unknown spend policy: {}", other))),
        }
    }
}

/// Spend allocator
#[derive(Debug, Clone, Copy, Default)]
pub struct Allocator {
    policy: SpendPolicy,
}

impl Allocator {
    /// Create allocator with a shortfall policy
    pub fn new(policy: SpendPolicy) -> Self {
        Self { policy }
    }

    /// Compute the deduction plan for `requested` points
    ///
    /// `payers` are the known payers; credits of anyone else are ignored.
    pub fn plan<'a>(
        &self,
        ledger: &Ledger,
        balances: &BalanceIndex,
        payers: impl IntoIterator<Item = &'a PayerId>,
        requested: i64,
    ) -> Result<SpendPlan> {
        if requested < 0 {
            return Err(Error::InvalidSpendRequest(format!(
                "Spend amount must not be negative: {}",
                requested
            )));
        }

        // Step 1: remaining balance per known payer (negative balances have nothing to give)
        let mut remaining: BTreeMap<&PayerId, i64> = payers
            .into_iter()
            .map(|payer| (payer, balances.get(payer).unwrap_or(0).max(0)))
            .collect();

        let available = remaining
            .values()
            .fold(0i64, |total, &points| total.saturating_add(points));
        if requested > available && self.policy == SpendPolicy::Reject {
            return Err(Error::InsufficientPoints {
                requested,
                available,
            });
        }

        // Step 2: walk credits oldest first
        let mut allocated: BTreeMap<PayerId, i64> = BTreeMap::new();
        let mut remaining_request = requested;

        for entry in ledger.chronological() {
            if remaining_request == 0 {
                break;
            }
            if !entry.is_credit() {
                continue;
            }

            let payer_remaining = match remaining.get_mut(&entry.payer) {
                Some(points) if *points > 0 => points,
                _ => continue,
            };

            // Step 3: take what this credit, the payer, and the request allow
            let take = remaining_request.min(entry.points).min(*payer_remaining);

            *payer_remaining -= take;
            *allocated.entry(entry.payer.clone()).or_insert(0) += take;
            remaining_request -= take;
        }

        let total: i64 = allocated.values().sum();

        Ok(SpendPlan {
            requested,
            allocated: total,
            unfulfilled: requested - total,
            allocations: allocated
                .into_iter()
                .map(|(payer, points)| (payer, -points))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LedgerEntry;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    struct Fixture {
        ledger: Ledger,
        balances: BalanceIndex,
        payers: Vec<PayerId>,
    }

    impl Fixture {
        fn new(payers: &[&str]) -> Self {
            Self {
                ledger: Ledger::new(),
                balances: BalanceIndex::new(),
                payers: payers.iter().map(|p| PayerId::new(*p)).collect(),
            }
        }

        fn record(&mut self, entry: LedgerEntry) {
            self.balances.credit(&entry.payer, entry.points).unwrap();
            self.ledger.append(entry).unwrap();
        }

        fn purchase(&mut self, payer: &str, points: i64, secs: i64) {
            self.record(LedgerEntry::purchase(PayerId::new(payer), points, at(secs)));
        }

        fn spent(&mut self, payer: &str, points: i64, secs: i64) {
            self.record(LedgerEntry::spend(PayerId::new(payer), points, at(secs)));
        }

        fn plan(&self, allocator: Allocator, requested: i64) -> Result<SpendPlan> {
            allocator.plan(&self.ledger, &self.balances, &self.payers, requested)
        }
    }

    #[test]
    fn test_oldest_credit_first_across_payers() {
        let mut fx = Fixture::new(&["account-1", "account-2"]);
        fx.purchase("account-1", 500, 1);
        fx.purchase("account-2", 349, 2);
        fx.purchase("account-2", 251, 3);

        let plan = fx.plan(Allocator::default(), 850).unwrap();

        assert_eq!(plan.allocations.len(), 2);
        assert_eq!(plan.deduction_for(&PayerId::new("account-1")), -500);
        assert_eq!(plan.deduction_for(&PayerId::new("account-2")), -350);
        assert_eq!(plan.allocated, 850);
        assert!(plan.is_fulfilled());
    }

    #[test]
    fn test_follows_timestamps_not_insertion_order() {
        let mut fx = Fixture::new(&["DANNON", "UNILEVER", "MILLER COORS"]);
        fx.purchase("DANNON", 1000, 50);
        fx.purchase("UNILEVER", 200, 10);
        fx.purchase("MILLER COORS", 10_000, 40);
        fx.purchase("DANNON", 300, 20);

        let plan = fx.plan(Allocator::default(), 5000).unwrap();

        assert_eq!(plan.deduction_for(&PayerId::new("UNILEVER")), -200);
        assert_eq!(plan.deduction_for(&PayerId::new("DANNON")), -300);
        assert_eq!(plan.deduction_for(&PayerId::new("MILLER COORS")), -4500);
        assert_eq!(plan.allocated, 5000);
    }

    #[test]
    fn test_prior_spend_caps_payer() {
        let mut fx = Fixture::new(&["A", "B"]);
        fx.purchase("A", 100, 1);
        fx.purchase("A", 100, 2);
        fx.spent("A", 150, 3);
        fx.purchase("B", 100, 4);

        // A's two credits nominally hold 200 but only 50 remain
        let plan = fx.plan(Allocator::default(), 120).unwrap();

        assert_eq!(plan.deduction_for(&PayerId::new("A")), -50);
        assert_eq!(plan.deduction_for(&PayerId::new("B")), -70);
    }

    #[test]
    fn test_zero_spend_is_empty() {
        let mut fx = Fixture::new(&["A"]);
        fx.purchase("A", 100, 1);

        let plan = fx.plan(Allocator::default(), 0).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.allocated, 0);
        assert_eq!(plan.unfulfilled, 0);
    }

    #[test]
    fn test_negative_spend_rejected() {
        let fx = Fixture::new(&["A"]);
        let result = fx.plan(Allocator::default(), -1);
        assert!(matches!(result, Err(Error::InvalidSpendRequest(_))));
    }

    #[test]
    fn test_partial_policy_reports_shortfall() {
        let mut fx = Fixture::new(&["A", "B"]);
        fx.purchase("A", 100, 1);
        fx.purchase("B", 50, 2);

        let plan = fx.plan(Allocator::new(SpendPolicy::Partial), 400).unwrap();

        assert_eq!(plan.allocated, 150);
        assert_eq!(plan.unfulfilled, 250);
        assert!(!plan.is_fulfilled());
    }

    #[test]
    fn test_reject_policy_fails_on_shortfall() {
        let mut fx = Fixture::new(&["A"]);
        fx.purchase("A", 100, 1);

        let result = fx.plan(Allocator::new(SpendPolicy::Reject), 101);
        assert!(matches!(
            result,
            Err(Error::InsufficientPoints {
                requested: 101,
                available: 100
            })
        ));

        let plan = fx.plan(Allocator::new(SpendPolicy::Reject), 100).unwrap();
        assert_eq!(plan.allocated, 100);
    }

    #[test]
    fn test_unknown_payer_credits_ignored() {
        let mut fx = Fixture::new(&["A"]);
        fx.purchase("GHOST", 1000, 1);
        fx.purchase("A", 10, 2);

        let plan = fx.plan(Allocator::default(), 50).unwrap();
        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocated, 10);
    }

    #[test]
    fn test_spend_policy_from_str() {
        assert_eq!("partial".parse::<SpendPolicy>().unwrap(), SpendPolicy::Partial);
        assert_eq!(" Reject ".parse::<SpendPolicy>().unwrap(), SpendPolicy::Reject);
        assert!("strict".parse::<SpendPolicy>().is_err());
    }
}
