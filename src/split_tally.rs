//! Split occurrence counts over a forest, and everything derived from them:
//! majority-rule and greedy consensus, pairwise split incompatibility and the
//! internode certainty family.
//!
//! # Ranking
//! Several results depend on the splits ranked by descending count. Ties are
//! broken by shuffling the (structurally sorted) splits with the tally's own
//! seeded RNG before a stable sort on count, so a fixed seed always gives the
//! same ranking. The ranking and the greedy selection derived from it are
//! cached and dropped together whenever the tally changes.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::certainty::{PairWeightedSplits, internode_certainty};
use crate::error::{Result, StatsError};
use crate::forest::Forest;
use crate::snapshot::TreeSnapshot;
use crate::split::Split;
use crate::taxa::TaxonSet;

/// Tie-breaking seed used when none is supplied.
pub const DEFAULT_SEED: u64 = 4;

/// How far [`SplitTally::conflicting_split_counts`] looks for competitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictLimit {
    /// Stop once the group (consensus split included) holds this many splits.
    /// `MaxLength(2)` gives the classic internode certainty.
    MaxLength(usize),
    /// Only splits seen at least this many times take part.
    MinCount(usize),
}

#[derive(Debug, Clone)]
struct GreedySelection {
    splits: Vec<Split>,
    /// Position of each accepted split in the ranking.
    positions: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct SplitTally {
    counts: HashMap<Split, usize>,
    taxa: Option<Arc<TaxonSet>>,
    n_trees: usize,
    n_splits: usize,
    added_only_via_trees: bool,
    rng: StdRng,
    ranked: Option<Vec<(Split, usize)>>,
    greedy: Option<GreedySelection>,
}

impl Default for SplitTally {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitTally {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        SplitTally {
            counts: HashMap::new(),
            taxa: None,
            n_trees: 0,
            n_splits: 0,
            added_only_via_trees: true,
            rng,
            ranked: None,
            greedy: None,
        }
    }

    /// Tally every tree of `forest` with the default seed.
    pub fn from_forest(forest: &Forest) -> Result<Self> {
        let mut tally = Self::new();
        tally.add_forest(forest)?;
        Ok(tally)
    }

    /// Replace the tie-breaking RNG. The current ranking is kept until the next reshuffle.
    pub fn set_rng(&mut self, rng: StdRng) {
        self.rng = rng;
    }

    fn bind_taxa(&mut self, taxa: &Arc<TaxonSet>, what: &'static str) -> Result<()> {
        match &self.taxa {
            None => {
                self.taxa = Some(Arc::clone(taxa));
                Ok(())
            }
            Some(bound) if **bound == **taxa => Ok(()),
            Some(_) => Err(StatsError::TaxonMismatch(what)),
        }
    }

    fn fold_splits<'a, I>(&mut self, splits: I)
    where
        I: IntoIterator<Item = &'a Split>,
    {
        for split in splits {
            *self.counts.entry(split.clone()).or_insert(0) += 1;
            self.n_splits += 1;
        }
        self.ranked = None;
        self.greedy = None;
    }

    pub fn add_tree(&mut self, tree: &TreeSnapshot) -> Result<()> {
        self.bind_taxa(tree.taxa(), "tree")?;
        self.n_trees += 1;
        self.fold_splits(tree.splits());
        Ok(())
    }

    pub fn add_forest(&mut self, forest: &Forest) -> Result<()> {
        for tree in forest {
            self.add_tree(tree)?;
        }
        Ok(())
    }

    /// Fold in a set of splits that does not come from a tree.
    ///
    /// The caller guarantees the splits are mutually compatible. Afterwards the
    /// tree count no longer describes the counts, so majority-rule queries fail.
    pub fn add_split_system(&mut self, taxa: &Arc<TaxonSet>, splits: &[Split]) -> Result<()> {
        if splits.iter().any(|s| s.n_taxa() != taxa.len()) {
            return Err(StatsError::TaxonMismatch("split system"));
        }
        self.bind_taxa(taxa, "split system")?;
        self.added_only_via_trees = false;
        self.fold_splits(splits);
        Ok(())
    }

    /// Sum of all split occurrence counts.
    pub fn total_split_count(&self) -> usize {
        self.n_splits
    }

    pub fn num_trees(&self) -> usize {
        self.n_trees
    }

    pub fn num_unique_splits(&self) -> usize {
        self.counts.len()
    }

    pub fn num_unique_cherries(&self) -> usize {
        self.counts.keys().filter(|s| s.is_cherry()).count()
    }

    pub fn count(&self, split: &Split) -> usize {
        self.counts.get(split).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Split, usize)> + '_ {
        self.counts.iter().map(|(s, &c)| (s, c))
    }

    pub fn taxa(&self) -> Option<&Arc<TaxonSet>> {
        self.taxa.as_ref()
    }

    fn require_trees(&self, what: &'static str) -> Result<()> {
        if self.added_only_via_trees {
            Ok(())
        } else {
            Err(StatsError::SplitsNotFromTrees(what))
        }
    }

    fn bound_taxa(&self) -> Result<Arc<TaxonSet>> {
        self.taxa.clone().ok_or(StatsError::Unbound)
    }

    /// Splits present in a strict majority of trees, in structural order.
    ///
    /// Any two of them share at least one tree, so they are pairwise compatible.
    pub fn majority_rule_splits(&self) -> Result<Vec<Split>> {
        self.require_trees("majority rule consensus")?;
        let majority = self.n_trees / 2 + 1;
        let mut splits: Vec<Split> = self
            .counts
            .iter()
            .filter(|&(_, &c)| c >= majority)
            .map(|(s, _)| s.clone())
            .collect();
        splits.sort();
        Ok(splits)
    }

    pub fn majority_rule_consensus_tree(&self) -> Result<TreeSnapshot> {
        let splits = self.majority_rule_splits()?;
        Ok(TreeSnapshot::from_splits(self.bound_taxa()?, splits))
    }

    /// Summed Robinson-Foulds distance from every tree to the majority-rule tree.
    ///
    /// A split seen `c` times out of `n` costs `n - c` if it is in the consensus
    /// and `c` otherwise, i.e. `min(c, n - c)`.
    pub fn sum_rf_to_majority_rule(&self) -> Result<usize> {
        self.require_trees("distance to majority rule consensus")?;
        Ok(self
            .counts
            .values()
            .map(|&c| c.min(self.n_trees - c))
            .sum())
    }

    /// Σ (c₁ − t)(c₂ − t) over unordered pairs of incompatible splits with both counts above `t`.
    pub fn weighted_pairwise_split_incompatibility(&self, threshold: usize) -> usize {
        let entries: Vec<(&Split, usize)> = self
            .counts
            .iter()
            .filter(|&(_, &c)| c > threshold)
            .map(|(s, &c)| (s, c - threshold))
            .collect();
        (0..entries.len())
            .into_par_iter()
            .map(|i| {
                let (a, ca) = entries[i];
                entries[i + 1..]
                    .iter()
                    .filter(|(b, _)| !a.compatible(b))
                    .map(|&(_, cb)| ca * cb)
                    .sum::<usize>()
            })
            .sum()
    }

    /// Pairwise split incompatibility at every threshold `0..n_thresholds`, from one pass over the pairs.
    ///
    /// A pair with `m = min(c₁, c₂)` contributes `c₁c₂ − t(c₁+c₂) + t²` to every
    /// threshold `t < m`, so bucketing the three coefficients by `m` and taking
    /// suffix sums gives all thresholds at once.
    pub fn incompatibility_profile(&self, n_thresholds: usize) -> Vec<usize> {
        if n_thresholds == 0 {
            return Vec::new();
        }
        let entries: Vec<(&Split, usize)> = self.counts.iter().map(|(s, &c)| (s, c)).collect();
        let buckets = entries.iter().map(|&(_, c)| c).max().unwrap_or(0) + 1;
        let zero = || vec![[0i64; 3]; buckets];
        let coeffs = (0..entries.len())
            .into_par_iter()
            .fold(zero, |mut acc, i| {
                let (a, ca) = entries[i];
                for &(b, cb) in &entries[i + 1..] {
                    if !a.compatible(b) {
                        let slot = &mut acc[ca.min(cb)];
                        slot[0] += (ca * cb) as i64;
                        slot[1] += (ca + cb) as i64;
                        slot[2] += 1;
                    }
                }
                acc
            })
            .reduce(zero, |mut left, right| {
                for (l, r) in left.iter_mut().zip(&right) {
                    l[0] += r[0];
                    l[1] += r[1];
                    l[2] += r[2];
                }
                left
            });

        let mut profile = vec![0usize; n_thresholds];
        let mut suffix = [0i64; 3];
        for m in (1..buckets).rev() {
            suffix[0] += coeffs[m][0];
            suffix[1] += coeffs[m][1];
            suffix[2] += coeffs[m][2];
            // suffix now covers every bucket above t = m - 1
            let t = m - 1;
            if t < n_thresholds {
                let t = t as i64;
                profile[m - 1] = (suffix[0] - t * suffix[1] + t * t * suffix[2]) as usize;
            }
        }
        profile
    }

    /// `f[i]` = number of distinct splits seen exactly `i + 1` times.
    ///
    /// The length is the tree count when every addition was a tree, otherwise
    /// the largest observed count.
    pub fn count_by_frequency(&self) -> Vec<usize> {
        let max = if self.added_only_via_trees {
            self.n_trees
        } else {
            self.counts.values().copied().max().unwrap_or(0)
        };
        let mut freq = vec![0usize; max];
        for &c in self.counts.values() {
            freq[c - 1] += 1;
        }
        freq
    }

    fn rerank(&mut self) {
        let mut ranked: Vec<(Split, usize)> =
            self.counts.iter().map(|(s, &c)| (s.clone(), c)).collect();
        ranked.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        ranked.shuffle(&mut self.rng);
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        debug!("Ranked {} distinct splits by frequency", ranked.len());
        self.ranked = Some(ranked);
        self.greedy = None;
    }

    fn ensure_greedy(&mut self) {
        if self.ranked.is_none() {
            self.rerank();
        }
        if self.greedy.is_some() {
            return;
        }
        let max_splits = self.taxa.as_ref().map_or(0, |t| t.len().saturating_sub(3));
        let mut selection = GreedySelection {
            splits: Vec::with_capacity(max_splits),
            positions: Vec::with_capacity(max_splits),
        };
        if let Some(ranked) = &self.ranked {
            for (i, (split, _)) in ranked.iter().enumerate() {
                if selection.splits.len() >= max_splits {
                    break;
                }
                if split.compatible_with_all(&selection.splits) {
                    selection.splits.push(split.clone());
                    selection.positions.push(i);
                }
            }
        }
        debug!("Greedy consensus accepted {} splits", selection.splits.len());
        self.greedy = Some(selection);
    }

    /// Distinct splits with their counts, most frequent first.
    pub fn ranked_splits(&mut self) -> &[(Split, usize)] {
        if self.ranked.is_none() {
            self.rerank();
        }
        self.ranked.as_deref().unwrap_or(&[])
    }

    /// Splits of the greedy consensus tree, in the order they were accepted.
    pub fn greedy_splits(&mut self) -> &[Split] {
        self.ensure_greedy();
        self.greedy
            .as_ref()
            .map(|g| g.splits.as_slice())
            .unwrap_or(&[])
    }

    /// Greedy consensus tree: walk the ranking and keep every split compatible
    /// with those already kept, up to `|taxa| - 3` splits.
    ///
    /// `reshuffle` draws a fresh tie-break from the RNG before selecting.
    pub fn greedy_consensus_tree(&mut self, reshuffle: bool) -> Result<TreeSnapshot> {
        let taxa = self.bound_taxa()?;
        if reshuffle {
            self.rerank();
        }
        let splits = self.greedy_splits().to_vec();
        Ok(TreeSnapshot::from_splits(taxa, splits))
    }

    /// For each greedy consensus split, that split followed by the later-ranked
    /// splits conflicting with it, each with its count.
    ///
    /// Earlier-ranked splits never conflict: the split would not have been accepted.
    pub fn conflicting_split_counts(&mut self, limit: ConflictLimit) -> Vec<Vec<(Split, usize)>> {
        self.ensure_greedy();
        let (Some(ranked), Some(greedy)) = (&self.ranked, &self.greedy) else {
            return Vec::new();
        };
        let below = |count: usize| matches!(limit, ConflictLimit::MinCount(t) if count < t);
        let full = |len: usize| matches!(limit, ConflictLimit::MaxLength(k) if len >= k);

        let mut groups = Vec::with_capacity(greedy.positions.len());
        for &pos in &greedy.positions {
            let (split, count) = &ranked[pos];
            if below(*count) {
                break;
            }
            let mut group = vec![(split.clone(), *count)];
            for (other, other_count) in &ranked[pos + 1..] {
                if below(*other_count) || full(group.len()) {
                    break;
                }
                if !split.compatible(other) {
                    group.push((other.clone(), *other_count));
                }
            }
            groups.push(group);
        }
        groups
    }

    /// Each greedy consensus split paired with its strongest competitor.
    pub fn internode_certainties(&mut self) -> Vec<PairWeightedSplits> {
        self.conflicting_split_counts(ConflictLimit::MaxLength(2))
            .into_iter()
            .map(|mut group| {
                let second = if group.len() > 1 { Some(group.swap_remove(1)) } else { None };
                let (split1, wt1) = group.swap_remove(0);
                match second {
                    Some((split2, wt2)) => {
                        PairWeightedSplits::new(split1, Some(split2), wt1 as f64, wt2 as f64)
                    }
                    None => PairWeightedSplits::new(split1, None, wt1 as f64, 0.0),
                }
            })
            .collect()
    }

    /// Internode certainty all of each greedy consensus split, counting every
    /// competitor seen at least `threshold` times.
    pub fn internode_certainties_all(&mut self, threshold: usize) -> Vec<(Split, f64)> {
        self.conflicting_split_counts(ConflictLimit::MinCount(threshold))
            .into_iter()
            .filter_map(|group| {
                let counts: Vec<usize> = group.iter().map(|&(_, c)| c).collect();
                let (split, _) = group.into_iter().next()?;
                Some((split, internode_certainty(&counts)))
            })
            .collect()
    }

    /// Sum of internode certainties over the greedy consensus tree.
    pub fn tree_certainty(&mut self) -> f64 {
        self.conflicting_split_counts(ConflictLimit::MaxLength(2))
            .iter()
            .map(|group| internode_certainty(&group.iter().map(|&(_, c)| c).collect::<Vec<_>>()))
            .sum()
    }

    /// Sum of internode certainty all over the greedy consensus tree.
    pub fn tree_certainty_all(&mut self, threshold: usize) -> f64 {
        self.internode_certainties_all(threshold)
            .iter()
            .map(|&(_, ica)| ica)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distances::rf_from_snapshots;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    const FIVE_TREES: [&str; 5] = [
        "((A,B),C,(D,E));",
        "((A,B),C,(D,E));",
        "((A,C),B,(D,E));",
        "((A,B),D,(C,E));",
        "((B,C),A,(D,E));",
    ];

    fn forest(newicks: &[&str]) -> Forest {
        Forest::from_newicks(newicks).unwrap()
    }

    fn split(indices: &[usize], n: usize) -> Split {
        Split::from_indices(indices, n).unwrap()
    }

    #[test]
    fn test_total_split_count_for_resolved_trees() {
        let f = forest(&FIVE_TREES);
        let tally = SplitTally::from_forest(&f).unwrap();
        assert_eq!(tally.num_trees(), 5);
        assert_eq!(tally.total_split_count(), 5 * (5 - 3));
        assert_eq!(tally.total_split_count(), tally.iter().map(|(_, c)| c).sum::<usize>());
        assert_eq!(tally.num_unique_splits(), 5);
        assert_eq!(tally.num_unique_cherries(), 5);
        assert_eq!(tally.count(&split(&[3, 4], 5)), 4);
        assert_eq!(tally.count(&split(&[0, 1], 5)), 3);
        assert_eq!(tally.count(&split(&[1, 3], 5)), 0);
    }

    #[test]
    fn test_taxon_mismatch() {
        let mut tally = SplitTally::new();
        tally.add_forest(&forest(&["((A,B),(C,D));"])).unwrap();
        let other = forest(&["((A,B),(C,E));"]);
        let err = tally.add_tree(other.get(0).unwrap()).unwrap_err();
        assert!(matches!(err, StatsError::TaxonMismatch(_)));
        assert_eq!(tally.num_trees(), 1);
    }

    #[test]
    fn test_split_system_blocks_majority_rule() {
        let f = forest(&FIVE_TREES);
        let mut tally = SplitTally::from_forest(&f).unwrap();
        let taxa = Arc::clone(f.taxa().unwrap());
        tally.add_split_system(&taxa, &[split(&[0, 1], 5)]).unwrap();
        assert_eq!(tally.num_trees(), 5);
        assert_eq!(tally.total_split_count(), 11);
        assert!(matches!(
            tally.majority_rule_consensus_tree(),
            Err(StatsError::SplitsNotFromTrees(_))
        ));
        assert!(matches!(
            tally.sum_rf_to_majority_rule(),
            Err(StatsError::SplitsNotFromTrees(_))
        ));
        // Frequency table now sized by the largest count
        assert_eq!(tally.count_by_frequency(), vec![3, 0, 0, 2]);
    }

    #[test]
    fn test_split_system_wrong_size_rejected() {
        let f = forest(&FIVE_TREES);
        let mut tally = SplitTally::new();
        let taxa = Arc::clone(f.taxa().unwrap());
        let err = tally
            .add_split_system(&taxa, &[split(&[0, 1], 6)])
            .unwrap_err();
        assert!(matches!(err, StatsError::TaxonMismatch(_)));
    }

    #[test]
    fn test_majority_rule_consensus() {
        let f = forest(&FIVE_TREES);
        let tally = SplitTally::from_forest(&f).unwrap();
        let majority = tally.majority_rule_splits().unwrap();
        assert_eq!(majority.len(), 2);
        for (i, a) in majority.iter().enumerate() {
            assert!(tally.count(a) >= 5 / 2 + 1);
            for b in &majority[i + 1..] {
                assert!(a.compatible(b));
            }
        }
        let tree = tally.majority_rule_consensus_tree().unwrap();
        assert_eq!(tree.topology_string(), "(A,B,(C,(D,E)));");
    }

    #[test]
    fn test_sum_rf_matches_brute_force() {
        let forests = [
            forest(&FIVE_TREES),
            forest(&[
                "(((A,B),C),(D,E));",
                "(((A,C),B),(D,E));",
                "(((A,D),C),(B,E));",
                "(((A,B),E),(D,C));",
                "(((C,B),A),(D,E));",
            ]),
            forest(&["((A,B),(C,D));", "((A,C),(B,D));"]),
        ];
        for f in &forests {
            let tally = SplitTally::from_forest(f).unwrap();
            let consensus = tally.majority_rule_consensus_tree().unwrap();
            let brute: usize = f.iter().map(|t| rf_from_snapshots(t, &consensus)).sum();
            assert_eq!(tally.sum_rf_to_majority_rule().unwrap(), brute);
        }
        let tally = SplitTally::from_forest(&forests[0]).unwrap();
        assert_eq!(tally.sum_rf_to_majority_rule().unwrap(), 6);
    }

    #[test]
    fn test_weighted_pairwise_split_incompatibility() {
        let tally = SplitTally::from_forest(&forest(&FIVE_TREES)).unwrap();
        assert_eq!(tally.weighted_pairwise_split_incompatibility(0), 13);
        assert_eq!(tally.weighted_pairwise_split_incompatibility(1), 0);

        let small = forest(&["((A,B),(C,D));", "((A,B),(C,D));", "((A,C),(B,D));"]);
        let tally = SplitTally::from_forest(&small).unwrap();
        assert_eq!(tally.weighted_pairwise_split_incompatibility(0), 2);
    }

    #[test]
    fn test_incompatibility_profile_matches_direct() {
        let f = forest(&[
            "(((A,B),C),(D,(E,F)));",
            "(((A,B),C),(D,(E,F)));",
            "(((A,B),C),(E,(D,F)));",
            "(((A,C),B),(D,(E,F)));",
            "(((B,C),A),(D,(E,F)));",
            "(((A,B),D),(C,(E,F)));",
            "(((A,B),C),(D,(E,F)));",
            "(((A,F),C),(D,(E,B)));",
        ]);
        let tally = SplitTally::from_forest(&f).unwrap();
        let profile = tally.incompatibility_profile(5);
        assert_eq!(profile.len(), 5);
        for (t, &si) in profile.iter().enumerate() {
            assert_eq!(si, tally.weighted_pairwise_split_incompatibility(t), "threshold {t}");
        }
        assert!(profile[0] > 0);
        assert!(tally.incompatibility_profile(0).is_empty());
    }

    #[test]
    fn test_count_by_frequency() {
        let tally = SplitTally::from_forest(&forest(&FIVE_TREES)).unwrap();
        let freq = tally.count_by_frequency();
        assert_eq!(freq, vec![3, 0, 1, 1, 0]);
        assert_eq!(freq.iter().sum::<usize>(), tally.num_unique_splits());
        assert!(SplitTally::new().count_by_frequency().is_empty());
    }

    #[test]
    fn test_greedy_consensus() {
        let f = forest(&FIVE_TREES);
        let mut tally = SplitTally::from_forest(&f).unwrap();
        let greedy = tally.greedy_splits().to_vec();
        assert_eq!(greedy, vec![split(&[3, 4], 5), split(&[0, 1], 5)]);
        let tree = tally.greedy_consensus_tree(false).unwrap();
        assert_eq!(tree.topology_string(), "(A,B,(C,(D,E)));");
        assert!(tally.greedy_consensus_tree(true).unwrap().is_fully_resolved());
    }

    #[test]
    fn test_greedy_bounded_and_compatible() {
        let f = forest(&[
            "(((A,B),C),(D,(E,F)));",
            "(((A,C),B),(E,(D,F)));",
            "(((A,D),C),(B,(E,F)));",
            "(((A,E),F),(D,(B,C)));",
        ]);
        for seed in 0..8 {
            let mut tally = SplitTally::with_seed(seed);
            tally.add_forest(&f).unwrap();
            let greedy = tally.greedy_splits().to_vec();
            assert!(greedy.len() <= 6 - 3);
            for (i, a) in greedy.iter().enumerate() {
                assert!(a.compatible_with_all(&greedy[i + 1..]));
            }
        }
    }

    #[test]
    fn test_reshuffle_rebuilds_greedy_tree() {
        // Three splits, one tree each: every ranking is a tie
        let f = forest(&["((A,B),(C,D));", "((A,C),(B,D));", "((A,D),(B,C));"]);
        let mut tally = SplitTally::from_forest(&f).unwrap();

        let cached = tally.greedy_consensus_tree(false).unwrap().topology_string();
        assert_eq!(tally.greedy_consensus_tree(false).unwrap().topology_string(), cached);

        let reshuffled: HashSet<String> = (0..20)
            .map(|_| tally.greedy_consensus_tree(true).unwrap().topology_string())
            .collect();
        assert!(reshuffled.len() > 1);

        let last = tally.greedy_consensus_tree(true).unwrap().topology_string();
        assert_eq!(tally.greedy_consensus_tree(false).unwrap().topology_string(), last);
        assert_eq!(tally.greedy_splits().len(), 1);
    }

    #[test]
    fn test_set_rng_matches_seeded_tally() {
        let f = forest(&["((A,B),(C,D));", "((A,C),(B,D));", "((A,D),(B,C));"]);
        let mut replaced = SplitTally::from_forest(&f).unwrap();
        replaced.greedy_consensus_tree(true).unwrap();
        replaced.set_rng(StdRng::seed_from_u64(9));
        let mut seeded = SplitTally::with_seed(9);
        seeded.add_forest(&f).unwrap();
        for _ in 0..5 {
            assert_eq!(
                replaced.greedy_consensus_tree(true).unwrap().topology_string(),
                seeded.greedy_consensus_tree(true).unwrap().topology_string()
            );
        }
    }

    #[test]
    fn test_same_seed_same_ranking() {
        let f = forest(&[
            "(((A,B),C),(D,(E,F)));",
            "(((A,C),B),(E,(D,F)));",
            "(((A,D),C),(B,(E,F)));",
        ]);
        let mut one = SplitTally::with_seed(11);
        let mut two = SplitTally::with_seed(11);
        one.add_forest(&f).unwrap();
        two.add_forest(&f).unwrap();
        assert_eq!(one.ranked_splits(), two.ranked_splits());
        let counts: Vec<usize> = one.ranked_splits().iter().map(|&(_, c)| c).collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_internode_certainties() {
        let mut tally = SplitTally::from_forest(&forest(&FIVE_TREES)).unwrap();
        let ics = tally.internode_certainties();
        assert_eq!(ics.len(), 2);
        assert_eq!(ics[0].split1, split(&[3, 4], 5));
        assert_eq!(ics[0].split2, Some(split(&[2, 4], 5)));
        assert_eq!((ics[0].wt1, ics[0].wt2), (4.0, 1.0));
        assert_eq!((ics[1].wt1, ics[1].wt2), (3.0, 1.0));

        let expected = internode_certainty(&[4, 1]) + internode_certainty(&[3, 1]);
        assert_relative_eq!(tally.tree_certainty(), expected, epsilon = 1e-12);
        let summed: f64 = ics.iter().map(|p| p.internode_certainty()).sum();
        assert_relative_eq!(summed, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_internode_certainty_all() {
        let mut tally = SplitTally::from_forest(&forest(&FIVE_TREES)).unwrap();
        let groups = tally.conflicting_split_counts(ConflictLimit::MinCount(0));
        let sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        assert_eq!(sizes, vec![2, 3]);

        let expected = internode_certainty(&[4, 1]) + internode_certainty(&[3, 1, 1]);
        assert_relative_eq!(tally.tree_certainty_all(0), expected, epsilon = 1e-12);

        // Threshold above every competitor: each split stands alone
        let icas = tally.internode_certainties_all(2);
        assert_eq!(icas.len(), 2);
        assert!(icas.iter().all(|&(_, ica)| ica == 1.0));
        // Threshold above the consensus splits themselves: nothing left
        assert!(tally.internode_certainties_all(5).is_empty());
    }

    #[test]
    fn test_certainty_without_conflict() {
        let f = forest(&["(((A,B),C),(D,(E,F)));"; 4]);
        let mut tally = SplitTally::from_forest(&f).unwrap();
        for pair in tally.internode_certainties() {
            assert_eq!(pair.split2, None);
            assert_eq!(pair.internode_certainty(), 1.0);
        }
        assert_relative_eq!(tally.tree_certainty(), 3.0);
        assert_eq!(tally.weighted_pairwise_split_incompatibility(0), 0);
        assert_eq!(tally.sum_rf_to_majority_rule().unwrap(), 0);
    }

    #[test]
    fn test_unbound_tally() {
        let mut tally = SplitTally::new();
        assert!(matches!(
            tally.greedy_consensus_tree(false),
            Err(StatsError::Unbound)
        ));
        assert!(tally.greedy_splits().is_empty());
        assert_eq!(tally.tree_certainty(), 0.0);
    }
}
