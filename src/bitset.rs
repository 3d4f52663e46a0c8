//! Compact bitset representation for taxon subsets.
//!
//! # Overview
//! A bitset records which taxa belong to one side of a split.
//! Each bit position corresponds to a taxon index in the shared [`TaxonSet`].
//!
//! # Example
//! For taxa [A, B, C, D] mapped to indices [0, 1, 2, 3]:
//! - Side {A, C} → bitset `0b0101` (bits 0 and 2 set)
//! - Side {B, C, D} → bitset `0b1110` (bits 1, 2, 3 set)
//!
//! [`TaxonSet`]: crate::taxa::TaxonSet

use std::fmt::Write as _;

/// A compact bitset for representing which taxa belong to a split side.
///
/// Internally stores bits in `Vec<u64>` words to support arbitrarily large taxon sets.
/// Each u64 word holds 64 taxon indices. Bits beyond the taxon count are always 0,
/// so two bitsets over the same taxon set compare equal exactly when they hold the
/// same taxa.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Creates a new bitset with all bits set to 0.
    ///
    /// # Parameters
    /// - `words`: Number of u64 words needed. Calculate with [`Bitset::words_for`].
    ///
    /// # Example
    /// ```
    /// # use hybrid_tree_stats::bitset::Bitset;
    /// // For 100 taxa, need 2 words (128 bits)
    /// let bs = Bitset::zeros(Bitset::words_for(100));
    /// assert_eq!(bs.0.len(), 2);
    /// ```
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    /// Number of words needed to hold `n_bits` bits.
    #[inline]
    pub fn words_for(n_bits: usize) -> usize {
        n_bits.div_ceil(64)
    }

    /// Builds a bitset of `n_bits` capacity with the given indices set.
    pub fn from_indices(n_bits: usize, indices: &[usize]) -> Self {
        let mut bs = Bitset::zeros(Self::words_for(n_bits));
        for &idx in indices {
            bs.set(idx);
        }
        bs
    }

    /// Sets the bit at the given index to 1.
    ///
    /// # Example
    /// ```
    /// # use hybrid_tree_stats::bitset::Bitset;
    /// let mut bs = Bitset::zeros(1);
    /// bs.set(0);
    /// bs.set(5);
    /// assert_eq!(bs.0[0], 0b00100001);
    /// ```
    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6; // Equivalent to idx / 64
        let bit = idx & 63; // Equivalent to idx % 64
        self.0[word] |= 1u64 << bit;
    }

    /// Returns whether the bit at `idx` is set.
    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        (self.0[idx >> 6] >> (idx & 63)) & 1 == 1
    }

    /// Performs bitwise OR with another bitset (union operation).
    ///
    /// # Example
    /// ```
    /// # use hybrid_tree_stats::bitset::Bitset;
    /// let mut left = Bitset::zeros(1);
    /// left.set(0);
    /// let mut right = Bitset::zeros(1);
    /// right.set(1);
    /// left.or_assign(&right);
    /// assert_eq!(left.0[0], 0b11);
    /// ```
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    /// Counts the number of set bits (population count).
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if every bit set in `self` is also set in `other`.
    #[inline]
    pub fn is_subset_of(&self, other: &Bitset) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a & !b == 0)
    }

    /// True if `self` and `other` share no set bit.
    #[inline]
    pub fn is_disjoint(&self, other: &Bitset) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a & b == 0)
    }

    /// Bitwise complement restricted to the first `n_bits` bits.
    ///
    /// Trailing bits of the last word stay 0.
    ///
    /// # Example
    /// Input:  0b0011 (4 bits) → Output: 0b1100
    pub fn complement(&self, n_bits: usize) -> Bitset {
        let mut out = Bitset(self.0.iter().map(|w| !w).collect());
        let tail = n_bits & 63;
        if tail != 0 {
            if let Some(last) = out.0.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
        out
    }

    /// Iterates over the indices of set bits, in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some((w << 6) + tz)
            })
        })
    }

    /// Index of the lowest set bit, if any.
    pub fn first_one(&self) -> Option<usize> {
        self.iter_ones().next()
    }

    /// Hexadecimal key, most significant word first.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 16);
        for word in self.0.iter().rev() {
            let _ = write!(out, "{word:016x}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basic() {
        let mut bs = Bitset::zeros(1);
        bs.set(0);
        bs.set(2);
        assert_eq!(bs.0[0], 0b0101);
        assert!(bs.get(2));
        assert!(!bs.get(1));
    }

    #[test]
    fn test_bitset_or() {
        let mut bs1 = Bitset::from_indices(4, &[0, 1]);
        let bs2 = Bitset::from_indices(4, &[2, 3]);
        bs1.or_assign(&bs2);
        assert_eq!(bs1.0[0], 0b1111);
    }

    #[test]
    fn test_subset_and_disjoint() {
        let bc = Bitset::from_indices(5, &[1, 2]);
        let bcd = Bitset::from_indices(5, &[1, 2, 3]);
        let e = Bitset::from_indices(5, &[4]);
        assert!(bc.is_subset_of(&bcd));
        assert!(!bcd.is_subset_of(&bc));
        assert!(bc.is_disjoint(&e));
        assert!(!bc.is_disjoint(&bcd));
    }

    #[test]
    fn test_complement_masks_tail() {
        let ab = Bitset::from_indices(4, &[0, 1]);
        assert_eq!(ab.complement(4).0[0], 0b1100);

        // Exactly one full word: nothing to mask
        let first = Bitset::from_indices(64, &[0]);
        assert_eq!(first.complement(64).count_ones(), 63);
    }

    #[test]
    fn test_large_bitset() {
        let bs = Bitset::from_indices(130, &[0, 63, 64, 127]);
        assert_eq!(bs.count_ones(), 4);
        assert_eq!(bs.0[0], 1u64 | (1u64 << 63));
        assert_eq!(bs.0[1], 1u64 | (1u64 << 63));
        assert_eq!(bs.iter_ones().collect::<Vec<_>>(), vec![0, 63, 64, 127]);
        assert_eq!(bs.complement(130).count_ones(), 126);
    }

    #[test]
    fn test_hex_key() {
        let bs = Bitset::from_indices(70, &[0, 65]);
        assert_eq!(bs.to_hex(), "00000000000000020000000000000001");
    }
}
