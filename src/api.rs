//! Python binding layer for forest summary statistics.
//!
//! Provides Python functions computing the summary statistics and the
//! pairwise RF matrix of a newick or NEXUS tree file.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::distances::rf_matrix;
use crate::error::StatsError;
use crate::io::{TreeSource, parse_forest_from, read_forest, read_tree_file};
use crate::params::StatParameters;
use crate::split_tally::DEFAULT_SEED;
use crate::stats::{HybridStats, StatLookup};

fn to_py_err(e: StatsError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Compute the summary statistics of all trees in a file.
///
/// Args:
///     path: Tree file, one newick per line or NEXUS (optionally gzipped)
///     burnin: Number of trees to skip at the beginning of the file (default: 0)
///     seed: Seed for breaking ties between equally frequent splits (default: 4)
///     si_thresholds: Thresholds reported as SI-<t> (default: [1, 2])
///     rs_thresholds: Thresholds reported as RS<k> (default: [1])
///     lineage: Use the lineage trees block of a NEXUS file instead of the coalescent one
///
/// Returns:
///     A dict from statistic name (TE, SI, DC, UC, US, QE, TC, TCA, RS<k>, SI-<t>) to value.
///     QE is left out for fewer than 4 taxa.
///
/// Raises:
///     ValueError: If no trees are found, trees have different taxa, or a threshold is too large
#[pyfunction]
#[pyo3(signature = (path, burnin=0, seed=DEFAULT_SEED, si_thresholds=None, rs_thresholds=None, lineage=false))]
fn summary_stats(
    path: String,
    burnin: usize,
    seed: u64,
    si_thresholds: Option<Vec<usize>>,
    rs_thresholds: Option<Vec<usize>>,
    lineage: bool,
) -> PyResult<HashMap<String, f64>> {
    let source = if lineage {
        TreeSource::Lineage
    } else {
        TreeSource::Coalescent
    };
    let content = read_tree_file(&path).map_err(to_py_err)?;
    let (_names, forest) = parse_forest_from(&content, burnin, source).map_err(to_py_err)?;
    if forest.is_empty() {
        return Err(PyValueError::new_err(format!(
            "No trees found in file '{}' after burnin removal",
            path
        )));
    }

    let mut params = StatParameters::default();
    if let Some(si) = si_thresholds {
        params.si_thresholds = si;
    }
    if let Some(rs) = rs_thresholds {
        params.rs_thresholds = rs;
    }
    params.range_check(forest.len()).map_err(to_py_err)?;

    let stats = HybridStats::with_seed(&forest, seed).map_err(to_py_err)?;

    let mut names: Vec<String> = ["TE", "SI", "DC", "UC", "US", "QE", "TC", "TCA"]
        .iter()
        .filter(|&&s| s != "QE" || stats.quartet_entropy().is_some())
        .map(|s| s.to_string())
        .collect();
    names.extend(params.rs_thresholds.iter().map(|k| format!("RS{k}")));
    names.extend(params.si_thresholds.iter().map(|t| format!("SI-{t}")));

    names
        .into_iter()
        .map(|name| {
            let value = stats.stat_by_name(&name).map_err(to_py_err)?;
            Ok((name, value))
        })
        .collect()
}

/// Compute pairwise Robinson-Foulds distances between all trees in a file.
///
/// Returns:
///     A tuple of (tree_names, distance_matrix)
#[pyfunction]
#[pyo3(signature = (path, burnin=0))]
fn pairwise_rf(path: String, burnin: usize) -> PyResult<(Vec<String>, Vec<Vec<usize>>)> {
    let (names, forest) = read_forest(&path, burnin).map_err(to_py_err)?;
    if forest.len() < 2 {
        return Err(PyValueError::new_err(
            "Need at least 2 trees to compute pairwise distances",
        ));
    }
    Ok((names, rf_matrix(&forest)))
}

/// Python module definition
#[pymodule]
fn hybrid_tree_stats(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(summary_stats, m)?)?;
    m.add_function(wrap_pyfunction!(pairwise_rf, m)?)?;
    Ok(())
}
