//! An ordered collection of trees sharing one taxon set.

use std::sync::Arc;

use phylotree::tree::Tree as PhyloTree;

use crate::error::{Result, StatsError};
use crate::snapshot::TreeSnapshot;
use crate::taxa::TaxonSet;

/// A forest of tree snapshots.
///
/// The first tree binds the taxon set; every later tree must carry the same
/// labels and is re-pointed at the shared `Arc<TaxonSet>`.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    taxa: Option<Arc<TaxonSet>>,
    trees: Vec<TreeSnapshot>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every tree, then assemble the forest in order.
    pub fn from_trees(trees: &[PhyloTree]) -> Result<Self> {
        let snapshots = trees
            .iter()
            .map(TreeSnapshot::from_tree)
            .collect::<Result<Vec<_>>>()?;
        let mut forest = Forest::new();
        for snapshot in snapshots {
            forest.push(snapshot)?;
        }
        Ok(forest)
    }

    /// Parse one newick string per item.
    pub fn from_newicks<I, S>(newicks: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut forest = Forest::new();
        for newick in newicks {
            forest.push(TreeSnapshot::from_newick(newick.as_ref())?)?;
        }
        Ok(forest)
    }

    /// Append a tree.
    ///
    /// # Errors
    /// [`StatsError::TaxonMismatch`] if its taxa differ from the forest's.
    pub fn push(&mut self, mut tree: TreeSnapshot) -> Result<()> {
        match &self.taxa {
            None => self.taxa = Some(Arc::clone(tree.taxa())),
            Some(taxa) if **taxa == **tree.taxa() => tree.rebind(taxa),
            Some(_) => return Err(StatsError::TaxonMismatch("tree to forest")),
        }
        self.trees.push(tree);
        Ok(())
    }

    pub fn push_tree(&mut self, tree: &PhyloTree) -> Result<()> {
        let snapshot = match &self.taxa {
            Some(taxa) => TreeSnapshot::from_tree_with_taxa(tree, taxa)?,
            None => TreeSnapshot::from_tree(tree)?,
        };
        self.push(snapshot)
    }

    pub fn taxa(&self) -> Option<&Arc<TaxonSet>> {
        self.taxa.as_ref()
    }

    pub fn n_taxa(&self) -> usize {
        self.taxa.as_ref().map_or(0, |t| t.len())
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&TreeSnapshot> {
        self.trees.get(idx)
    }

    pub fn trees(&self) -> &[TreeSnapshot] {
        &self.trees
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TreeSnapshot> {
        self.trees.iter()
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a TreeSnapshot;
    type IntoIter = std::slice::Iter<'a, TreeSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.trees.iter()
    }
}
