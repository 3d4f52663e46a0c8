//! Canonical bipartitions ("splits") of a taxon set.
//!
//! # What is a split?
//! Each internal edge of an unrooted tree divides the taxa into two groups:
//! ```text
//!   A \         / C
//!      o-------o        ← this edge creates the split {A,B} | {C,D}
//!   B /         \ D
//! ```
//!
//! # Canonicalization
//! A split {A,B}|{C,D} can be written from either side. We always store the side
//! that does NOT contain taxon 0, so identical bipartitions have identical bitsets
//! and can be hashed, compared and sorted structurally.
//!
//! | Side given | Has taxon 0? | Stored      |
//! |------------|--------------|-------------|
//! | {A, B}     | yes          | {C, D}      |
//! | {C, D}     | no           | {C, D}      |

use std::fmt;

use crate::bitset::Bitset;

/// A non-trivial bipartition of the taxon index set, stored canonically.
///
/// Both sides always hold at least two taxa: single-taxon (pendant edge) splits
/// carry no topological information and are never constructed.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Split {
    side: Bitset,
    n_taxa: usize,
}

impl Split {
    /// Builds a split from either of its sides.
    ///
    /// Returns `None` for trivial bipartitions (a side with fewer than 2 taxa).
    pub fn from_side(side: Bitset, n_taxa: usize) -> Option<Split> {
        let size = side.count_ones();
        if size < 2 || n_taxa - size < 2 {
            return None;
        }
        let side = if side.get(0) { side.complement(n_taxa) } else { side };
        Some(Split { side, n_taxa })
    }

    /// Builds a split from the taxon indices on one of its sides.
    ///
    /// # Example
    /// ```
    /// # use hybrid_tree_stats::split::Split;
    /// let ab = Split::from_indices(&[0, 1], 4).unwrap();
    /// let cd = Split::from_indices(&[2, 3], 4).unwrap();
    /// assert_eq!(ab, cd);
    /// assert!(Split::from_indices(&[3], 4).is_none());
    /// ```
    pub fn from_indices(indices: &[usize], n_taxa: usize) -> Option<Split> {
        Self::from_side(Bitset::from_indices(n_taxa, indices), n_taxa)
    }

    /// The side of the split that excludes taxon 0.
    pub fn side(&self) -> &Bitset {
        &self.side
    }

    pub fn n_taxa(&self) -> usize {
        self.n_taxa
    }

    pub fn size_of_smaller(&self) -> usize {
        let size = self.side.count_ones();
        size.min(self.n_taxa - size)
    }

    /// A cherry: the smaller side holds exactly two taxa.
    pub fn is_cherry(&self) -> bool {
        self.size_of_smaller() == 2
    }

    /// True if taxa `i` and `j` lie on opposite sides.
    #[inline]
    pub fn separates(&self, i: usize, j: usize) -> bool {
        self.side.get(i) != self.side.get(j)
    }

    /// Whether both splits can be edges of the same tree.
    ///
    /// With sides `P|P'` and `Q|Q'`, compatibility means one of `P∩Q`, `P∩Q'`,
    /// `P'∩Q`, `P'∩Q'` is empty. Both stored sides exclude taxon 0, so `P'∩Q'`
    /// always holds taxon 0 and the test reduces to: the stored sides are nested
    /// or disjoint.
    #[inline]
    pub fn compatible(&self, other: &Split) -> bool {
        self.side.is_disjoint(&other.side)
            || self.side.is_subset_of(&other.side)
            || other.side.is_subset_of(&self.side)
    }

    /// Pairwise compatible with every split in `others`.
    pub fn compatible_with_all<'a, I>(&self, others: I) -> bool
    where
        I: IntoIterator<Item = &'a Split>,
    {
        others.into_iter().all(|other| self.compatible(other))
    }

    /// Canonical hexadecimal key of the stored side.
    pub fn key(&self) -> String {
        self.side.to_hex()
    }
}

/// One character per taxon: `.` for the side holding taxon 0, `*` for the other.
impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.n_taxa {
            f.write_str(if self.side.get(i) { "*" } else { "." })?;
        }
        Ok(())
    }
}
