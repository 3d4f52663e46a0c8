//! All summary statistics of one forest, computed up front.
//!
//! | name    | statistic |
//! |---------|-----------|
//! | `TE`    | topology entropy (S1) |
//! | `SI`    | weighted pairwise split incompatibility (S4) |
//! | `DC`    | summed RF distance to the majority-rule tree (S5) |
//! | `UC`    | unique cherries (S9) |
//! | `US`    | unique non-trivial splits (S10) |
//! | `QE`    | normalized quartet entropy (S11), needs at least 4 taxa |
//! | `TC`    | tree certainty |
//! | `TCA`   | tree certainty all, threshold 0 |
//! | `RS<k>` | distinct splits seen fewer than `k + 1` times (S12) |
//! | `SI-<t>`| split incompatibility beyond threshold `t` (S7) |
//! | `1`     | the constant 1, for intercept terms |

use log::debug;

use crate::error::{Result, StatsError};
use crate::forest::Forest;
use crate::quartet::quartet_entropy;
use crate::split_tally::{DEFAULT_SEED, SplitTally};
use crate::topology::{TopologyTally, entropy};

/// Anything that can resolve a statistic name to its value.
pub trait StatLookup {
    fn stat_by_name(&self, name: &str) -> Result<f64>;
}

#[derive(Debug, Clone)]
pub struct HybridStats {
    n_trees: usize,
    n_taxa: usize,
    n_splits: usize,
    topology_entropy: f64,
    cumulative_topology_counts: Vec<usize>,
    split_incompatibility: usize,
    reduced_split_incompatibility: Vec<usize>,
    consensus_distance: usize,
    unique_cherries: usize,
    unique_splits: usize,
    quartet_entropy: Option<f64>,
    cumulative_split_counts: Vec<usize>,
    tree_certainty: f64,
    tree_certainty_all: f64,
    split_tally: SplitTally,
}

impl HybridStats {
    pub fn new(forest: &Forest) -> Result<Self> {
        Self::with_seed(forest, DEFAULT_SEED)
    }

    /// Statistics with greedy-consensus ties broken by an RNG seeded with `seed`.
    pub fn with_seed(forest: &Forest, seed: u64) -> Result<Self> {
        Self::with_tally(forest, SplitTally::with_seed(seed))
    }

    /// Statistics using the empty `tally` to count the forest's splits.
    ///
    /// # Errors
    /// [`StatsError::TallyInUse`] if `tally` already holds splits.
    pub fn with_tally(forest: &Forest, mut tally: SplitTally) -> Result<Self> {
        if forest.is_empty() {
            return Err(StatsError::EmptyForest);
        }
        if tally.total_split_count() > 0 || tally.num_trees() > 0 {
            return Err(StatsError::TallyInUse(tally.num_trees()));
        }
        let n_trees = forest.len();
        tally.add_forest(forest)?;
        debug!(
            "Counted {} distinct splits over {} trees",
            tally.num_unique_splits(),
            n_trees
        );

        let topologies = TopologyTally::from_forest(forest)?;
        let topology_entropy = entropy(&topologies.sorted_counts());
        debug!("{} distinct topologies", topologies.num_unique_topologies());

        let reduced_split_incompatibility = tally.incompatibility_profile(n_trees / 2);
        let split_incompatibility = match reduced_split_incompatibility.first() {
            Some(&si) => si,
            None => tally.weighted_pairwise_split_incompatibility(0),
        };

        let cumulative_split_counts = tally
            .count_by_frequency()
            .iter()
            .scan(0, |acc, &f| {
                let before = *acc;
                *acc += f;
                Some(before)
            })
            .collect();

        let quartet_entropy = match quartet_entropy(forest) {
            Ok(qe) => Some(qe),
            Err(StatsError::TooFewTaxa(n)) => {
                debug!("No quartet entropy on {n} taxa");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(HybridStats {
            n_trees,
            n_taxa: forest.n_taxa(),
            n_splits: tally.total_split_count(),
            topology_entropy,
            cumulative_topology_counts: topologies.cumulative_counts(),
            split_incompatibility,
            reduced_split_incompatibility,
            consensus_distance: tally.sum_rf_to_majority_rule()?,
            unique_cherries: tally.num_unique_cherries(),
            unique_splits: tally.num_unique_splits(),
            quartet_entropy,
            cumulative_split_counts,
            tree_certainty: tally.tree_certainty(),
            tree_certainty_all: tally.tree_certainty_all(0),
            split_tally: tally,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn n_taxa(&self) -> usize {
        self.n_taxa
    }

    /// Total split occurrences over all trees.
    pub fn total_splits(&self) -> usize {
        self.n_splits
    }

    pub fn topology_entropy(&self) -> f64 {
        self.topology_entropy
    }

    pub fn cumulative_topology_counts(&self) -> &[usize] {
        &self.cumulative_topology_counts
    }

    pub fn split_incompatibility(&self) -> usize {
        self.split_incompatibility
    }

    /// Split incompatibility at every threshold `0..n_trees / 2`.
    pub fn reduced_split_incompatibilities(&self) -> &[usize] {
        &self.reduced_split_incompatibility
    }

    pub fn reduced_split_incompatibility(&self, threshold: usize) -> Result<usize> {
        self.reduced_split_incompatibility
            .get(threshold)
            .copied()
            .ok_or_else(|| StatsError::StatOutOfRange {
                name: format!("SI-{threshold}"),
                len: self.reduced_split_incompatibility.len(),
            })
    }

    pub fn consensus_distance(&self) -> usize {
        self.consensus_distance
    }

    pub fn unique_cherries(&self) -> usize {
        self.unique_cherries
    }

    pub fn unique_splits(&self) -> usize {
        self.unique_splits
    }

    /// `None` when the forest has fewer than 4 taxa.
    pub fn quartet_entropy(&self) -> Option<f64> {
        self.quartet_entropy
    }

    /// `c[k]` = number of distinct splits seen in at most `k` trees.
    pub fn cumulative_split_counts(&self) -> &[usize] {
        &self.cumulative_split_counts
    }

    pub fn cumulative_split_count(&self, k: usize) -> Result<usize> {
        self.cumulative_split_counts
            .get(k)
            .copied()
            .ok_or_else(|| StatsError::StatOutOfRange {
                name: format!("RS{k}"),
                len: self.cumulative_split_counts.len(),
            })
    }

    pub fn tree_certainty(&self) -> f64 {
        self.tree_certainty
    }

    pub fn tree_certainty_all(&self) -> f64 {
        self.tree_certainty_all
    }

    pub fn split_tally(&self) -> &SplitTally {
        &self.split_tally
    }

    /// Mutable access, for consensus trees and certainties computed on demand.
    pub fn split_tally_mut(&mut self) -> &mut SplitTally {
        &mut self.split_tally
    }
}

impl StatLookup for HybridStats {
    fn stat_by_name(&self, name: &str) -> Result<f64> {
        let value = match name {
            "1" => 1.0,
            "TE" => self.topology_entropy,
            "SI" => self.split_incompatibility as f64,
            "DC" => self.consensus_distance as f64,
            "UC" => self.unique_cherries as f64,
            "US" => self.unique_splits as f64,
            "QE" => self
                .quartet_entropy
                .ok_or(StatsError::TooFewTaxa(self.n_taxa))?,
            "TC" => self.tree_certainty,
            "TCA" => self.tree_certainty_all,
            _ => {
                let unknown = || StatsError::UnknownStat(name.to_string());
                if let Some(k) = name.strip_prefix("SI-") {
                    let k = k.parse().map_err(|_| unknown())?;
                    self.reduced_split_incompatibility(k)? as f64
                } else if let Some(k) = name.strip_prefix("RS") {
                    let k = k.parse().map_err(|_| unknown())?;
                    self.cumulative_split_count(k)? as f64
                } else {
                    return Err(unknown());
                }
            }
        };
        Ok(value)
    }
}
