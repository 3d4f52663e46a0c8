//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `bitset`, `taxa`, `split`: compact taxon subsets and canonical bipartitions.
//! - `snapshot`, `forest`: split view of each tree and the forest sharing one taxon set.
//! - `split_tally`: split counts, consensus trees, incompatibility and internode certainty.
//! - `topology`, `quartet`: topology counts / entropy and quartet entropy.
//! - `stats`, `compound`, `params`, `report`: the summary statistics and their reporting.
//! - `distances`: Robinson-Foulds distances between trees.
//! - `io`: reading newick/NEXUS tree files, writing TSV.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod bitset;
pub mod certainty;
pub mod compound;
pub mod distances;
pub mod error;
pub mod forest;
pub mod io;
pub mod params;
pub mod quartet;
pub mod report;
pub mod snapshot;
pub mod split;
pub mod split_tally;
pub mod stats;
pub mod taxa;
pub mod topology;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use error::{Result, StatsError};
pub use forest::Forest;
pub use io::{read_forest, write_matrix_tsv};
pub use snapshot::TreeSnapshot;
pub use split::Split;
pub use split_tally::SplitTally;
pub use stats::{HybridStats, StatLookup};
pub use taxa::TaxonSet;
pub use topology::TopologyTally;
