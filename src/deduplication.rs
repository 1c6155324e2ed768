//! The running set of known product identities.
//!
//! The classifier seeds an [`IdentitySet`] from the identity list artifact
//! and grows it as it accepts new products:
//! - lookups and inserts are keyed on the full `(store, sku)` pair;
//! - insertion order is irrelevant to membership, but the moment of
//!   insertion decides which of two equal scraped records is accepted;
//! - the set lives for exactly one classifier run and is never persisted.

use std::collections::HashSet;
use std::hash::BuildHasherDefault;

use seahash::SeaHasher;
use tracing::{debug, info};

use crate::model::ProductIdentity;

type IdentityHasher = BuildHasherDefault<SeaHasher>;

/// Identities already seen in the current run.
#[derive(Debug, Default)]
pub struct IdentitySet {
    seen: HashSet<ProductIdentity, IdentityHasher>,
}

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the baseline set from catalog identities. Repeated identities
    /// collapse into one entry.
    pub fn seeded<I>(identities: I) -> Self
    where
        I: IntoIterator<Item = ProductIdentity>,
    {
        let set = Self {
            seen: identities.into_iter().collect(),
        };
        info!("Seeded identity set with {} known products", set.len());
        set
    }

    pub fn contains(&self, identity: &ProductIdentity) -> bool {
        self.seen.contains(identity)
    }

    /// Registers an identity. Returns `false` if it was already known.
    pub fn insert(&mut self, identity: ProductIdentity) -> bool {
        let inserted = self.seen.insert(identity);
        if !inserted {
            debug!("Identity already registered");
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_collapses_repeated_identities() {
        let set = IdentitySet::seeded(vec![
            ProductIdentity::new("A", "1"),
            ProductIdentity::new("A", "1"),
            ProductIdentity::new("A", "2"),
        ]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&ProductIdentity::new("A", "1")));
    }

    #[test]
    fn same_sku_in_another_store_is_a_different_identity() {
        let mut set = IdentitySet::new();
        assert!(set.insert(ProductIdentity::new("A", "1")));
        assert!(!set.contains(&ProductIdentity::new("B", "1")));
        assert!(set.insert(ProductIdentity::new("B", "1")));
        assert!(!set.insert(ProductIdentity::new("A", "1")));
    }
}
