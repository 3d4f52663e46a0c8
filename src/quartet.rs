//! Quartet topologies and quartet entropy of a forest.
//!
//! # Overview
//! Each 4-taxon subset {a, b, c, d} of an unrooted tree is displayed in one of
//! three resolved shapes, or not resolved at all:
//! ```text
//!   ab|cd        ac|bd        ad|bc
//!  a     c      a     b      a     b
//!   >---<        >---<        >---<
//!  b     d      c     d      d     c
//! ```
//! The shape follows from the four-point condition on leaf path lengths: the
//! pairing whose two path lengths have the smallest sum is the displayed one.
//!
//! Quartet entropy sums the Shannon entropy of the shape distribution across
//! trees over every quartet, normalized by the maximum `nQuads · ln 3`.

use std::fmt;

use itertools::Itertools;
use log::debug;
use rayon::prelude::*;

use crate::error::{Result, StatsError};
use crate::forest::Forest;
use crate::snapshot::LeafDistances;

/// The shape a tree displays on one quartet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuartetTopology {
    AbCd,
    AcBd,
    AdBc,
    Unresolved,
}

impl QuartetTopology {
    pub const RESOLVED: [QuartetTopology; 3] = [
        QuartetTopology::AbCd,
        QuartetTopology::AcBd,
        QuartetTopology::AdBc,
    ];

    fn index(self) -> usize {
        match self {
            QuartetTopology::AbCd => 0,
            QuartetTopology::AcBd => 1,
            QuartetTopology::AdBc => 2,
            QuartetTopology::Unresolved => 3,
        }
    }
}

/// Four taxon indices in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quartet(pub [usize; 4]);

impl Quartet {
    /// Every quartet of `n_taxa` taxa, in lexicographic order.
    pub fn all(n_taxa: usize) -> Vec<Quartet> {
        (0..n_taxa)
            .combinations(4)
            .map(|q| Quartet([q[0], q[1], q[2], q[3]]))
            .collect()
    }

    /// Shape displayed by a tree, given its leaf path lengths.
    pub fn topology(&self, dist: &LeafDistances) -> QuartetTopology {
        let [a, b, c, d] = self.0;
        let sums = [
            dist.get(a, b) + dist.get(c, d),
            dist.get(a, c) + dist.get(b, d),
            dist.get(a, d) + dist.get(b, c),
        ];
        let min = sums.iter().copied().min().unwrap_or(0);
        let mut at_min = sums.iter().positions(|&s| s == min);
        match (at_min.next(), at_min.next()) {
            (Some(i), None) => QuartetTopology::RESOLVED[i],
            _ => QuartetTopology::Unresolved,
        }
    }
}

impl fmt::Display for Quartet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "[{a},{b},{c},{d}]")
    }
}

/// How many trees display each shape of one quartet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuartetCounts([usize; 4]);

impl QuartetCounts {
    pub fn record(&mut self, topology: QuartetTopology) {
        self.0[topology.index()] += 1;
    }

    pub fn get(&self, topology: QuartetTopology) -> usize {
        self.0[topology.index()]
    }

    pub fn resolved(&self) -> [usize; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

fn check_forest(forest: &Forest) -> Result<()> {
    if forest.is_empty() {
        return Err(StatsError::EmptyForest);
    }
    if forest.n_taxa() < 4 {
        return Err(StatsError::TooFewTaxa(forest.n_taxa()));
    }
    Ok(())
}

/// Shape counts for every quartet of the forest's taxa.
///
/// Leaf path lengths are computed once per tree, then quartets are tallied in parallel.
pub fn quartet_topology_counts(forest: &Forest) -> Result<Vec<(Quartet, QuartetCounts)>> {
    check_forest(forest)?;
    let dists: Vec<LeafDistances> = forest
        .trees()
        .par_iter()
        .map(|tree| tree.leaf_distances())
        .collect();
    let quartets = Quartet::all(forest.n_taxa());
    debug!(
        "Tallying {} quartets over {} trees",
        quartets.len(),
        dists.len()
    );

    Ok(quartets
        .into_par_iter()
        .map(|quartet| {
            let mut counts = QuartetCounts::default();
            for dist in &dists {
                counts.record(quartet.topology(dist));
            }
            (quartet, counts)
        })
        .collect())
}

/// Normalized quartet entropy in `[0, 1]`.
///
/// `(nQuads · ln n − Σ c ln c / n) / (nQuads · ln 3)` over the resolved shape
/// counts `c` of every quartet, for `n` trees.
///
/// # Errors
/// - [`StatsError::EmptyForest`] / [`StatsError::TooFewTaxa`] when no quartet exists
/// - [`StatsError::UnresolvedQuartet`] when any tree leaves a quartet unresolved
pub fn quartet_entropy(forest: &Forest) -> Result<f64> {
    let tallies = quartet_topology_counts(forest)?;

    if let Some((quartet, counts)) = tallies
        .iter()
        .find(|(_, c)| c.get(QuartetTopology::Unresolved) > 0)
    {
        let taxa = forest.taxa().ok_or(StatsError::Unbound)?;
        return Err(StatsError::UnresolvedQuartet {
            taxa: quartet.0.map(|i| taxa.label(i).to_string()),
            count: counts.get(QuartetTopology::Unresolved),
        });
    }

    let n_trees = forest.len() as f64;
    let n_quads = tallies.len() as f64;
    let sum_clnc: f64 = tallies
        .iter()
        .flat_map(|(_, counts)| counts.resolved())
        .filter(|&c| c > 0)
        .map(|c| c as f64 * (c as f64).ln())
        .sum();
    let entropy = n_quads * n_trees.ln() - sum_clnc / n_trees;
    Ok(entropy / (n_quads * 3f64.ln()))
}
