//! Append-only points ledger
//!
//! Entries are stored in insertion order and never modified or removed. A
//! chronological view (timestamp ascending, insertion order on ties) is kept
//! alongside and updated on every append, so reads never sort.
//!
//! # Invariants
//!
//! - Append-only: entries never modified or deleted
//! - Stable order: equal timestamps keep insertion order
//! - Late arrivals slot in by timestamp; nothing else moves

use crate::{
    types::{LedgerEntry, PayerId},
    Error, Result,
};
use uuid::Uuid;

/// In-memory append-only ledger
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    /// Entries in insertion order
    entries: Vec<LedgerEntry>,

    /// Indices into `entries`, ordered by (timestamp, sequence)
    chronological: Vec<usize>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry
    ///
    /// The entry's `sequence` is overwritten with its insertion position.
    pub fn append(&mut self, entry: LedgerEntry) -> Result<Uuid> {
        Self::validate(&entry)?;
        Ok(self.push(entry))
    }

    /// Append a group of entries: all of them land or none do
    pub fn append_all(&mut self, entries: Vec<LedgerEntry>) -> Result<Vec<Uuid>> {
        for entry in &entries {
            Self::validate(entry)?;
        }

        Ok(entries.into_iter().map(|entry| self.push(entry)).collect())
    }

    /// All entries, oldest first
    pub fn chronological(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.chronological.iter().map(move |&idx| &self.entries[idx])
    }

    /// All entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.iter()
    }

    /// One payer's entries, oldest first
    pub fn entries_for<'a>(
        &'a self,
        payer: &'a PayerId,
    ) -> impl Iterator<Item = &'a LedgerEntry> + 'a {
        self.chronological().filter(move |entry| &entry.payer == payer)
    }

    /// Sum of a payer's deltas
    pub fn sum_for(&self, payer: &PayerId) -> i64 {
        self.entries
            .iter()
            .filter(|entry| &entry.payer == payer)
            .map(|entry| entry.points)
            .sum()
    }

    /// Look up an entry by ID
    pub fn get(&self, entry_id: Uuid) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.entry_id == entry_id)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(entry: &LedgerEntry) -> Result<()> {
        if entry.payer.is_blank() {
            return Err(Error::InvalidEntry("Payer id must not be empty".to_string()));
        }

        Ok(())
    }

    fn push(&mut self, mut entry: LedgerEntry) -> Uuid {
        let idx = self.entries.len();
        entry.sequence = idx as u64;
        let entry_id = entry.entry_id;

        // After every entry at or before this timestamp: ties stay in insertion order
        let pos = self
            .chronological
            .partition_point(|&i| self.entries[i].timestamp <= entry.timestamp);

        self.entries.push(entry);
        self.chronological.insert(pos, idx);

        entry_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn purchase(payer: &str, points: i64, secs: i64) -> LedgerEntry {
        LedgerEntry::purchase(PayerId::new(payer), points, at(secs))
    }

    #[test]
    fn test_append_assigns_sequence() {
        let mut ledger = Ledger::new();
        let first = ledger.append(purchase("DANNON", 100, 1)).unwrap();
        let second = ledger.append(purchase("UNILEVER", 200, 2)).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(first).unwrap().sequence, 0);
        assert_eq!(ledger.get(second).unwrap().sequence, 1);
    }

    #[test]
    fn test_append_rejects_empty_payer() {
        let mut ledger = Ledger::new();
        let result = ledger.append(purchase("", 100, 1));

        assert!(matches!(result, Err(Error::InvalidEntry(_))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_chronological_orders_late_arrivals() {
        let mut ledger = Ledger::new();
        ledger.append(purchase("A", 1, 30)).unwrap();
        ledger.append(purchase("B", 2, 10)).unwrap();
        ledger.append(purchase("C", 3, 20)).unwrap();

        let order: Vec<i64> = ledger.chronological().map(|e| e.points).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_chronological_keeps_insertion_order_on_ties() {
        let mut ledger = Ledger::new();
        ledger.append(purchase("A", 1, 5)).unwrap();
        ledger.append(purchase("B", 2, 5)).unwrap();
        ledger.append(purchase("C", 3, 1)).unwrap();
        ledger.append(purchase("D", 4, 5)).unwrap();

        let order: Vec<i64> = ledger.chronological().map(|e| e.points).collect();
        assert_eq!(order, vec![3, 1, 2, 4]);

        let sequences: Vec<u64> = ledger.chronological().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_append_all_is_all_or_nothing() {
        let mut ledger = Ledger::new();
        ledger.append(purchase("A", 10, 1)).unwrap();

        let result = ledger.append_all(vec![purchase("B", 5, 2), purchase(" ", 5, 3)]);
        assert!(result.is_err());
        assert_eq!(ledger.len(), 1);

        let ids = ledger
            .append_all(vec![purchase("B", 5, 2), purchase("C", 5, 3)])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_entries_for_and_sum_for() {
        let mut ledger = Ledger::new();
        let dannon = PayerId::new("DANNON");
        ledger.append(purchase("DANNON", 300, 3)).unwrap();
        ledger.append(purchase("UNILEVER", 200, 2)).unwrap();
        ledger.append(purchase("DANNON", 1000, 1)).unwrap();
        ledger
            .append(LedgerEntry::spend(dannon.clone(), 200, at(4)))
            .unwrap();

        let points: Vec<i64> = ledger.entries_for(&dannon).map(|e| e.points).collect();
        assert_eq!(points, vec![1000, 300, -200]);
        assert_eq!(ledger.sum_for(&dannon), 1100);
        assert_eq!(ledger.sum_for(&PayerId::new("MILLER COORS")), 0);
    }
}
