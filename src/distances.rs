//! Robinson-Foulds distances between split snapshots.
//!
//! RF counts the splits present in one tree but not the other:
//! RF = |A ∪ B| - |A ∩ B| = |A| + |B| - 2|A ∩ B|, where A and B are the
//! non-trivial split sets. Range: [0, 2n-6] for fully resolved trees on n taxa.

use rayon::prelude::*;

use crate::forest::Forest;
use crate::snapshot::TreeSnapshot;

/// Compute Robinson-Foulds distance from two snapshots over the same taxon set.
///
/// Snapshots keep their splits sorted, so the intersection is a linear merge.
///
/// # Example
/// ```text
/// Tree 1:  ((A,B),(C,D))     Splits: {A,B}|{C,D}
/// Tree 2:  ((A,C),(B,D))     Splits: {A,C}|{B,D}
///
/// Intersection: 0 splits match
/// RF = 1 + 1 - 2*0 = 2
/// ```
pub fn rf_from_snapshots(a: &TreeSnapshot, b: &TreeSnapshot) -> usize {
    let (xs, ys) = (a.splits(), b.splits());
    let (mut i, mut j, mut shared) = (0, 0, 0);
    while i < xs.len() && j < ys.len() {
        match xs[i].cmp(&ys[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    xs.len() + ys.len() - 2 * shared
}

/// Sum of RF distances from every tree of the forest to `reference`.
pub fn sum_rf_distance(forest: &Forest, reference: &TreeSnapshot) -> usize {
    forest
        .trees()
        .par_iter()
        .map(|tree| rf_from_snapshots(tree, reference))
        .sum()
}

/// All pairwise RF distances `(i, j, d)` with `i < j`, computed in parallel.
pub fn pairwise_rf_parallel(forest: &Forest) -> Vec<(usize, usize, usize)> {
    let snaps = forest.trees();
    let n = snaps.len();
    (0..n)
        .into_par_iter()
        .flat_map_iter(|i| (i + 1..n).map(move |j| (i, j)))
        .map(|(i, j)| (i, j, rf_from_snapshots(&snaps[i], &snaps[j])))
        .collect()
}

/// Symmetric RF matrix assembled from [`pairwise_rf_parallel`].
pub fn rf_matrix(forest: &Forest) -> Vec<Vec<usize>> {
    let n = forest.len();
    let mut mat = vec![vec![0usize; n]; n];
    for (i, j, d) in pairwise_rf_parallel(forest) {
        mat[i][j] = d;
        mat[j][i] = d;
    }
    mat
}
