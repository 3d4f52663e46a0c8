//! The taxon identifier set shared by every tree, split and tally of one computation.
//!
//! Labels are kept sorted alphabetically, so the same set of taxa always maps to
//! the same bit positions no matter the order leaves appear in a newick string.
//! Node ids from the parser are never used as taxon indices.

use crate::bitset::Bitset;
use crate::error::{Result, StatsError};

/// An immutable, sorted, duplicate-free list of taxon labels.
///
/// Two taxon sets are equal when they hold the same labels; since labels are
/// sorted on construction this is also index-for-index equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaxonSet {
    labels: Vec<String>,
}

impl TaxonSet {
    /// Builds a taxon set from labels in any order.
    ///
    /// # Errors
    /// [`StatsError::DuplicateTaxon`] if a label appears twice.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.sort();
        if let Some(pair) = labels.windows(2).find(|w| w[0] == w[1]) {
            return Err(StatsError::DuplicateTaxon(pair[0].clone()));
        }
        Ok(TaxonSet { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, idx: usize) -> &str {
        &self.labels[idx]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of `label`, by binary search over the sorted labels.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .ok()
    }

    /// Number of u64 words a bitset over this taxon set needs.
    pub fn words(&self) -> usize {
        Bitset::words_for(self.labels.len())
    }

    /// Formats a subset of taxa as `{A,B,C}`.
    pub fn format_subset(&self, bits: &Bitset) -> String {
        let names: Vec<&str> = bits.iter_ones().map(|i| self.label(i)).collect();
        format!("{{{}}}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_sorted_and_indexed() {
        let taxa = TaxonSet::new(["Human", "Chimp", "Gorilla"]).unwrap();
        assert_eq!(taxa.labels(), ["Chimp", "Gorilla", "Human"]);
        assert_eq!(taxa.index_of("Human"), Some(2));
        assert_eq!(taxa.index_of("Orangutan"), None);
    }

    #[test]
    fn test_equality_is_order_independent() {
        let a = TaxonSet::new(["A", "B", "C", "D"]).unwrap();
        let b = TaxonSet::new(["D", "C", "A", "B"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = TaxonSet::new(["A", "B", "A"]).unwrap_err();
        assert!(matches!(err, StatsError::DuplicateTaxon(label) if label == "A"));
    }

    #[test]
    fn test_format_subset() {
        let taxa = TaxonSet::new(["A", "B", "C", "D"]).unwrap();
        let bits = Bitset::from_indices(4, &[1, 3]);
        assert_eq!(taxa.format_subset(&bits), "{B,D}");
    }
}
