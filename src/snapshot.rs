//! Extract split snapshots from phylogenetic trees, and build trees back from splits.
//!
//! # Overview
//! A TreeSnapshot captures the taxon set and all non-trivial splits of one tree.
//! This is everything the statistics need to know about a tree: split tallies
//! fold its splits, topology tallies use its canonical topology string, and the
//! quartet engine uses its leaf-to-leaf path lengths. Snapshots are immutable
//! and can be read from many threads at once.
//!
//! # CRITICAL: Why we use taxon NAMES not node IDs
//! Node IDs are assigned during tree parsing and differ across trees.
//! Taxon names are consistent. Leaves are indexed through the sorted
//! [`TaxonSet`], so identical taxa always map to the same bit positions.

use std::collections::HashMap;
use std::sync::Arc;

use phylotree::tree::{Node, Tree as PhyloTree};

use crate::bitset::Bitset;
use crate::error::{Result, StatsError};
use crate::split::Split;
use crate::taxa::TaxonSet;

/// An immutable snapshot of all non-trivial splits in a phylogenetic tree.
///
/// # Fields
/// - `taxa`: The taxon set the split bitsets are indexed by
/// - `splits`: All non-trivial splits, canonical, sorted and free of duplicates
///
/// Rooted input is treated as unrooted: the two edges below a bifurcating root
/// produce the same split and collapse into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSnapshot {
    taxa: Arc<TaxonSet>,
    splits: Vec<Split>,
}

impl TreeSnapshot {
    /// Extract a snapshot from a phylogenetic tree, deriving the taxon set from its leaves.
    ///
    /// # Errors
    /// Returns an error if the tree is empty, has unnamed leaves or repeated leaf names.
    pub fn from_tree(tree: &PhyloTree) -> Result<Self> {
        let names = leaf_names(tree)?;
        let taxa = Arc::new(TaxonSet::new(names.into_iter().map(|(_, name)| name))?);
        Self::from_tree_with_taxa(tree, &taxa)
    }

    /// Extract a snapshot whose splits are indexed by an existing taxon set.
    ///
    /// # Errors
    /// [`StatsError::TaxonMismatch`] if the leaves are not exactly `taxa`.
    pub fn from_tree_with_taxa(tree: &PhyloTree, taxa: &Arc<TaxonSet>) -> Result<Self> {
        let names = leaf_names(tree)?;
        if names.len() != taxa.len() {
            return Err(StatsError::TaxonMismatch("tree"));
        }

        // node_id → bit index (through the sorted taxon labels)
        let mut node_id_to_taxon: HashMap<usize, usize> = HashMap::with_capacity(names.len());
        for (node_id, name) in names {
            let idx = taxa
                .index_of(&name)
                .ok_or(StatsError::TaxonMismatch("tree"))?;
            if node_id_to_taxon.insert(node_id, idx).is_some() {
                return Err(StatsError::DuplicateTaxon(name));
            }
        }

        // DFS from the root, building one bitset per node bottom-up
        let root_id = tree.get_root()?;
        let mut cache: HashMap<usize, Bitset> = HashMap::new();
        compute_bitsets(root_id, tree, &node_id_to_taxon, taxa.words(), &mut cache)?;

        // Every edge above a non-root node is a candidate split; trivial ones drop out
        let splits = cache
            .into_iter()
            .filter(|(node_id, _)| *node_id != root_id)
            .filter_map(|(_, bits)| Split::from_side(bits, taxa.len()));

        Ok(Self::from_splits(Arc::clone(taxa), splits))
    }

    /// Parse a newick string and extract its snapshot.
    pub fn from_newick(newick: &str) -> Result<Self> {
        let tree = PhyloTree::from_newick(newick.trim())
            .map_err(|e| StatsError::Newick(format!("{e} in '{newick}'")))?;
        Self::from_tree(&tree)
    }

    /// Build a snapshot from an explicit collection of mutually compatible splits.
    ///
    /// This is the tree realizing exactly those internal edges; duplicates collapse.
    pub fn from_splits<I>(taxa: Arc<TaxonSet>, splits: I) -> Self
    where
        I: IntoIterator<Item = Split>,
    {
        let mut splits: Vec<Split> = splits.into_iter().collect();
        splits.sort_unstable();
        splits.dedup();
        TreeSnapshot { taxa, splits }
    }

    pub fn taxa(&self) -> &Arc<TaxonSet> {
        &self.taxa
    }

    pub fn n_taxa(&self) -> usize {
        self.taxa.len()
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn contains(&self, split: &Split) -> bool {
        self.splits.binary_search(split).is_ok()
    }

    /// A fully resolved unrooted tree on n taxa has n-3 non-trivial splits.
    pub fn is_fully_resolved(&self) -> bool {
        self.splits.len() + 3 == self.n_taxa()
    }

    /// Re-point the snapshot at an equal, shared taxon set.
    pub(crate) fn rebind(&mut self, taxa: &Arc<TaxonSet>) {
        self.taxa = Arc::clone(taxa);
    }

    /// Canonical branch-length-free topology string.
    ///
    /// The tree is rooted at taxon 0 and children are ordered by their smallest
    /// taxon index, so two snapshots share a string exactly when they share a
    /// split set.
    ///
    /// # Example
    /// ```
    /// # use hybrid_tree_stats::snapshot::TreeSnapshot;
    /// let a = TreeSnapshot::from_newick("((D,C),(B,A));").unwrap();
    /// let b = TreeSnapshot::from_newick("(A,B,(C,D));").unwrap();
    /// assert_eq!(a.topology_string(), "(A,B,(C,D));");
    /// assert_eq!(a.topology_string(), b.topology_string());
    /// ```
    pub fn topology_string(&self) -> String {
        let hierarchy = ClusterHierarchy::new(self);
        let mut out = String::from("(");
        out.push_str(self.taxa.label(0));
        for &child in &hierarchy.roots {
            out.push(',');
            hierarchy.write_newick(child, &self.taxa, &mut out);
        }
        out.push_str(");");
        out
    }

    /// Build a `phylotree` tree realizing exactly this snapshot's splits.
    ///
    /// The root is a virtual node joining taxon 0 with the top-level clusters.
    pub fn to_tree(&self) -> Result<PhyloTree> {
        let hierarchy = ClusterHierarchy::new(self);
        let mut tree = PhyloTree::new();
        let root = tree.add(Node::new());
        tree.add_child(Node::new_named(self.taxa.label(0)), root, None)?;

        let mut stack: Vec<(usize, usize)> = hierarchy.roots.iter().map(|&c| (c, root)).collect();
        while let Some((cluster, parent)) = stack.pop() {
            let node = match hierarchy.leaf_of(cluster) {
                Some(taxon) => Node::new_named(self.taxa.label(taxon)),
                None => Node::new(),
            };
            let id = tree.add_child(node, parent, None)?;
            stack.extend(hierarchy.children[cluster].iter().map(|&c| (c, id)));
        }
        Ok(tree)
    }

    /// Topological leaf-to-leaf path lengths (number of edges).
    ///
    /// Two distinct leaves are always separated by their two pendant edges plus
    /// every non-trivial split that puts them on opposite sides.
    pub fn leaf_distances(&self) -> LeafDistances {
        let n = self.n_taxa();
        let mut dist = vec![0usize; n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    dist[i * n + j] = 2;
                }
            }
        }
        for split in &self.splits {
            let inside: Vec<usize> = split.side().iter_ones().collect();
            let outside: Vec<usize> = split.side().complement(n).iter_ones().collect();
            for &i in &inside {
                for &j in &outside {
                    dist[i * n + j] += 1;
                    dist[j * n + i] += 1;
                }
            }
        }
        LeafDistances { n, dist }
    }
}

/// Dense symmetric matrix of leaf path lengths, indexed by taxon.
#[derive(Debug, Clone)]
pub struct LeafDistances {
    n: usize,
    dist: Vec<usize>,
}

impl LeafDistances {
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> usize {
        self.dist[i * self.n + j]
    }

    pub fn n_taxa(&self) -> usize {
        self.n
    }
}

/// Collect (node id, leaf name) for all leaves; every leaf must be named.
fn leaf_names(tree: &PhyloTree) -> Result<Vec<(usize, String)>> {
    let leaves = tree.get_leaves();
    if leaves.is_empty() {
        return Err(StatsError::Newick("tree has no leaves".to_string()));
    }
    leaves
        .into_iter()
        .map(|leaf_id| -> Result<(usize, String)> {
            let name = tree.get(&leaf_id)?.name.clone().ok_or(StatsError::UnnamedLeaf)?;
            Ok((leaf_id, name))
        })
        .collect()
}

/// Recursively compute bitsets for all nodes via DFS.
///
/// # Algorithm
/// - **Leaf node**: Create bitset with single bit set
/// - **Internal node**: OR together all child bitsets
///
/// Results are cached per node id.
fn compute_bitsets(
    node_id: usize,
    tree: &PhyloTree,
    node_id_to_taxon: &HashMap<usize, usize>,
    words: usize,
    cache: &mut HashMap<usize, Bitset>,
) -> Result<Bitset> {
    if let Some(bitset) = cache.get(&node_id) {
        return Ok(bitset.clone());
    }

    let node = tree.get(&node_id)?;
    let mut bitset = Bitset::zeros(words);

    if node.children.is_empty() {
        let taxon = node_id_to_taxon
            .get(&node_id)
            .ok_or(StatsError::UnnamedLeaf)?;
        bitset.set(*taxon);
    } else {
        for &child_id in &node.children {
            let child = compute_bitsets(child_id, tree, node_id_to_taxon, words, cache)?;
            bitset.or_assign(&child);
        }
    }

    cache.insert(node_id, bitset.clone());
    Ok(bitset)
}

/// The split sides (plus singletons) arranged as a rooted containment forest.
///
/// Rooting at taxon 0 turns every stored split side into a cluster; compatible
/// sides are nested or disjoint, so each cluster has a unique smallest parent.
struct ClusterHierarchy {
    clusters: Vec<Bitset>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl ClusterHierarchy {
    fn new(snapshot: &TreeSnapshot) -> Self {
        let n = snapshot.n_taxa();
        let mut clusters: Vec<Bitset> = snapshot.splits.iter().map(|s| s.side().clone()).collect();
        clusters.extend((1..n).map(|taxon| Bitset::from_indices(n, &[taxon])));
        // Larger clusters first: a parent always precedes its children
        clusters.sort_by_key(|c| std::cmp::Reverse(c.count_ones()));

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); clusters.len()];
        let mut roots = Vec::new();
        for i in 0..clusters.len() {
            let size = clusters[i].count_ones();
            // Scanning backwards meets the smallest enclosing cluster first
            let parent = (0..i)
                .rev()
                .find(|&j| clusters[j].count_ones() > size && clusters[i].is_subset_of(&clusters[j]));
            match parent {
                Some(j) => children[j].push(i),
                None => roots.push(i),
            }
        }

        let min_taxon = |c: &usize| clusters[*c].first_one();
        for list in children.iter_mut() {
            list.sort_by_key(min_taxon);
        }
        roots.sort_by_key(min_taxon);

        ClusterHierarchy { clusters, children, roots }
    }

    fn leaf_of(&self, cluster: usize) -> Option<usize> {
        if self.children[cluster].is_empty() {
            self.clusters[cluster].first_one()
        } else {
            None
        }
    }

    fn write_newick(&self, cluster: usize, taxa: &TaxonSet, out: &mut String) {
        if let Some(taxon) = self.leaf_of(cluster) {
            out.push_str(taxa.label(taxon));
            return;
        }
        out.push('(');
        for (k, &child) in self.children[cluster].iter().enumerate() {
            if k > 0 {
                out.push(',');
            }
            self.write_newick(child, taxa, out);
        }
        out.push(')');
    }
}
