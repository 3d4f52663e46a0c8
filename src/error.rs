//! Error type shared by every module of the crate.

use phylotree::tree::TreeError;
use thiserror::Error;

/// Everything that can go wrong while building tallies or computing statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A tree or split system was added on a taxon set other than the bound one.
    #[error("Tried to add {0} on a different taxon set")]
    TaxonMismatch(&'static str),

    /// A tree-count dependent statistic was requested after a raw split-system addition.
    #[error("Can't determine {0} unless splits were added only via trees")]
    SplitsNotFromTrees(&'static str),

    #[error("No taxon set bound yet: add a tree or split system first")]
    Unbound,

    #[error("The forest contains no trees")]
    EmptyForest,

    #[error("At least 4 taxa are needed, found {0}")]
    TooFewTaxa(usize),

    #[error("The split tally already holds {0} trees")]
    TallyInUse(usize),

    /// Quartet entropy is undefined when some tree leaves a quartet unresolved.
    #[error(
        "Quartet {taxa:?} is unresolved in {count} tree(s); quartet entropy is not defined for unresolved quartets"
    )]
    UnresolvedQuartet { taxa: [String; 4], count: usize },

    #[error("All leaves must be named")]
    UnnamedLeaf,

    #[error("Duplicate taxon label '{0}'")]
    DuplicateTaxon(String),

    #[error("Cannot choose a TREES block: {0}")]
    TreesBlock(String),

    #[error("Could not parse newick tree: {0}")]
    Newick(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Could not parse compound coefficient '{0}'")]
    BadCoefficient(String),

    #[error("Could not parse compound stat specifier '{0}'")]
    BadCompoundStat(String),

    #[error("Could not parse threshold values from '{0}'")]
    BadThresholds(String),

    #[error("Unrecognized stat name '{0}'")]
    UnknownStat(String),

    #[error("Stat '{name}' is out of range ({len} values available)")]
    StatOutOfRange { name: String, len: usize },

    #[error("{kind} threshold of {threshold} is too large for {n_trees} trees")]
    ThresholdTooLarge {
        kind: &'static str,
        threshold: usize,
        n_trees: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StatsError>;
