//! Registry of known payers
//!
//! Payers are registered once and never change. Lookups by id, by exact
//! name, and a case-insensitive prefix search over the words of a name.
//! Both ids and display names are unique.

use crate::{
    types::{Payer, PayerId},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Registered payers
#[derive(Debug, Default, Clone)]
pub struct PayerRegistry {
    by_id: BTreeMap<PayerId, Payer>,
    by_name: HashMap<String, PayerId>,
}

impl PayerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payer
    pub fn register(
        &mut self,
        id: PayerId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Payer> {
        if id.is_blank() {
            return Err(Error::InvalidEntry("Payer id must not be empty".to_string()));
        }
        if self.by_id.contains_key(&id) {
            return Err(Error::PayerExists(id.to_string()));
        }

        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(Error::PayerExists(format!("name '{}'", name)));
        }

        let payer = Payer {
            id: id.clone(),
            name,
            created_at,
        };

        self.by_name.insert(payer.name.clone(), id.clone());
        self.by_id.insert(id, payer.clone());

        Ok(payer)
    }

    /// Look up by id
    pub fn get(&self, id: &PayerId) -> Option<&Payer> {
        self.by_id.get(id)
    }

    /// Look up by exact display name
    pub fn get_by_name(&self, name: &str) -> Option<&Payer> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Payers whose name, or any word of it, starts with `query` (ignoring case)
    pub fn search(&self, query: &str) -> Vec<&Payer> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.by_id
            .values()
            .filter(|payer| {
                let name = payer.name.to_lowercase();
                name.starts_with(&query)
                    || name.split_whitespace().any(|word| word.starts_with(&query))
            })
            .collect()
    }

    /// All payers ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &Payer> + '_ {
        self.by_id.values()
    }

    /// Number of payers
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// No payers registered
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PayerRegistry {
        let mut registry = PayerRegistry::new();
        let now = Utc::now();
        registry.register("DANNON".into(), "Dannon", now).unwrap();
        registry.register("UNILEVER".into(), "Unilever", now).unwrap();
        registry
            .register("MILLER COORS".into(), "Miller Coors", now)
            .unwrap();
        registry
    }

    #[test]
    fn test_list_all_payers_ordered_by_id() {
        let registry = registry();
        let ids: Vec<&str> = registry.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["DANNON", "MILLER COORS", "UNILEVER"]);
    }

    #[test]
    fn test_get_with_id_and_name() {
        let registry = registry();

        let payer = registry.get(&PayerId::new("UNILEVER")).unwrap();
        assert_eq!(payer.name, "Unilever");

        let payer = registry.get_by_name("Miller Coors").unwrap();
        assert_eq!(payer.id, PayerId::new("MILLER COORS"));

        assert!(registry.get(&PayerId::new("account-1")).is_none());
        assert!(registry.get_by_name("miller coors").is_none());
    }

    #[test]
    fn test_register_rejects_blank_and_duplicate() {
        let mut registry = registry();

        let blank = registry.register("".into(), "Nobody", Utc::now());
        assert!(matches!(blank, Err(Error::InvalidEntry(_))));

        let duplicate = registry.register("DANNON".into(), "Dannon Again", Utc::now());
        assert!(matches!(duplicate, Err(Error::PayerExists(_))));
        assert_eq!(registry.get(&PayerId::new("DANNON")).unwrap().name, "Dannon");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let mut registry = registry();

        let result = registry.register("DANNON-2".into(), "Dannon", Utc::now());

        assert!(matches!(result, Err(Error::PayerExists(_))));
        assert!(registry.get(&PayerId::new("DANNON-2")).is_none());
        assert_eq!(
            registry.get_by_name("Dannon").unwrap().id,
            PayerId::new("DANNON")
        );
        assert_eq!(registry.len(), 3);

        // Names differing only in case are distinct
        registry.register("DANNON-2".into(), "DANNON", Utc::now()).unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_search_by_word_prefix() {
        let registry = registry();

        let hits: Vec<&str> = registry.search("co").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(hits, vec!["MILLER COORS"]);

        let hits: Vec<&str> = registry.search("Un").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(hits, vec!["UNILEVER"]);

        assert!(registry.search("  ").is_empty());
        assert!(registry.search("xyz").is_empty());
    }
}
