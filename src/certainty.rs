//! Internode certainty (Salichos, Stamatakis & Rokas, MBE 31:1261, 2014).
//!
//! For a group of k mutually conflicting splits with counts c₁..c_k, the
//! internode certainty is `1 + Σ pᵢ ln pᵢ / ln k` with `pᵢ = cᵢ / Σc`. With
//! only two splits this is the classic IC; with more it is ICA.

use std::fmt;

use crate::split::Split;

/// Internode certainty of a group of conflicting split counts.
///
/// A group of one split (nothing conflicts with it) has certainty 1.
///
/// # Example
/// ```
/// # use hybrid_tree_stats::certainty::internode_certainty;
/// assert_eq!(internode_certainty(&[7]), 1.0);
/// assert!(internode_certainty(&[5, 5]).abs() < 1e-12);
/// ```
pub fn internode_certainty(counts: &[usize]) -> f64 {
    let n = counts.len();
    if n <= 1 {
        return 1.0;
    }
    let sum = counts.iter().sum::<usize>() as f64;
    let ln_n = (n as f64).ln();
    let mut ic = ln_n;
    for &c in counts {
        let p = c as f64 / sum;
        if p > 0.0 {
            ic += p * p.ln();
        }
    }
    ic / ln_n
}

/// A split of the consensus tree paired with its strongest competitor.
///
/// `split2` is `None` when no later split conflicts with `split1`; its weight
/// is then 0 and the certainty is exactly 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PairWeightedSplits {
    pub split1: Split,
    pub split2: Option<Split>,
    pub wt1: f64,
    pub wt2: f64,
}

impl PairWeightedSplits {
    pub fn new(split1: Split, split2: Option<Split>, wt1: f64, wt2: f64) -> Self {
        PairWeightedSplits {
            split1,
            split2,
            wt1,
            wt2,
        }
    }

    /// Two-split internode certainty, in log base 2.
    pub fn internode_certainty(&self) -> f64 {
        if self.wt2 == 0.0 {
            return 1.0;
        }
        let total = self.wt1 + self.wt2;
        let p1 = self.wt1 / total;
        let p2 = self.wt2 / total;
        1.0 + (p1 * p1.ln() + p2 * p2.ln()) / 2f64.ln()
    }
}

impl fmt::Display for PairWeightedSplits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.split2 {
            Some(other) => write!(
                f,
                "Split {} ({:.0}) vs {} ({:.0}) = {:.6}",
                self.split1,
                self.wt1,
                other,
                self.wt2,
                self.internode_certainty()
            ),
            None => write!(f, "Split {} ({:.0}) vs nothing = 1.0", self.split1, self.wt1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn split(indices: &[usize]) -> Split {
        Split::from_indices(indices, 5).unwrap()
    }

    #[test]
    fn test_no_competitor_is_certain() {
        let pair = PairWeightedSplits::new(split(&[1, 2]), None, 9.0, 0.0);
        assert_eq!(pair.internode_certainty(), 1.0);
        assert_eq!(pair.to_string(), "Split .**.. (9) vs nothing = 1.0");
    }

    #[test]
    fn test_even_split_has_zero_certainty() {
        let pair = PairWeightedSplits::new(split(&[1, 2]), Some(split(&[2, 3])), 4.0, 4.0);
        assert_relative_eq!(pair.internode_certainty(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pair_matches_general_formula() {
        let pair = PairWeightedSplits::new(split(&[1, 2]), Some(split(&[2, 3])), 8.0, 2.0);
        // p = (0.8, 0.2): 1 + (0.8 log2 0.8 + 0.2 log2 0.2) = 0.278071...
        assert_relative_eq!(pair.internode_certainty(), 0.2780719051126377, epsilon = 1e-12);
        assert_relative_eq!(
            pair.internode_certainty(),
            internode_certainty(&[8, 2]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_three_way_uniform_conflict() {
        assert_relative_eq!(internode_certainty(&[3, 3, 3]), 0.0, epsilon = 1e-12);
        assert!(internode_certainty(&[6, 2, 1]) > 0.0);
        assert!(internode_certainty(&[6, 2, 1]) < 1.0);
    }
}
