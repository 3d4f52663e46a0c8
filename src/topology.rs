//! Counts of distinct tree topologies across a forest.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, StatsError};
use crate::forest::Forest;
use crate::snapshot::TreeSnapshot;
use crate::taxa::TaxonSet;

/// Entropy of an observed multinomial sample: `N ln N − Σ xᵢ ln xᵢ` with `N = Σ xᵢ`.
///
/// This is `−Σ ln(pᵢ^xᵢ)` with `pᵢ = xᵢ / N`. Zero counts contribute nothing.
pub fn entropy(counts: &[usize]) -> f64 {
    let xlnx = |x: usize| if x == 0 { 0.0 } else { x as f64 * (x as f64).ln() };
    let total: usize = counts.iter().sum();
    xlnx(total) - counts.iter().map(|&x| xlnx(x)).sum::<f64>()
}

/// Occurrence count of each branch-length-free topology string.
#[derive(Debug, Clone, Default)]
pub struct TopologyTally {
    counts: HashMap<String, usize>,
    taxa: Option<Arc<TaxonSet>>,
}

impl TopologyTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_forest(forest: &Forest) -> Result<Self> {
        let mut tally = Self::new();
        tally.add_forest(forest)?;
        Ok(tally)
    }

    /// Taxon sets are compared by their labels.
    pub fn add_tree(&mut self, tree: &TreeSnapshot) -> Result<()> {
        match &self.taxa {
            None => self.taxa = Some(Arc::clone(tree.taxa())),
            Some(taxa) if **taxa == **tree.taxa() => {}
            Some(_) => return Err(StatsError::TaxonMismatch("tree to topology counts")),
        }
        *self.counts.entry(tree.topology_string()).or_insert(0) += 1;
        Ok(())
    }

    pub fn add_forest(&mut self, forest: &Forest) -> Result<()> {
        for tree in forest {
            self.add_tree(tree)?;
        }
        Ok(())
    }

    /// Occurrence counts, ascending.
    pub fn sorted_counts(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self.counts.values().copied().collect();
        counts.sort_unstable();
        counts
    }

    /// Running totals of the counts, most frequent topology first.
    ///
    /// # Example
    /// Counts `{3, 1, 5}` give `[5, 8, 9]`.
    pub fn cumulative_counts(&self) -> Vec<usize> {
        self.sorted_counts()
            .into_iter()
            .rev()
            .scan(0, |acc, c| {
                *acc += c;
                Some(*acc)
            })
            .collect()
    }

    pub fn num_unique_topologies(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, topology: &str) -> usize {
        self.counts.get(topology).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts.iter().map(|(t, &c)| (t.as_str(), c))
    }

    pub fn taxa(&self) -> Option<&Arc<TaxonSet>> {
        self.taxa.as_ref()
    }
}
