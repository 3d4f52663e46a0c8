//! Text renderings of [`HybridStats`]: a human-readable summary and a
//! tab-delimited table row suitable for R.

use std::io::Write;

use crate::error::{Result, StatsError};
use crate::forest::Forest;
use crate::params::StatParameters;
use crate::quartet::quartet_entropy;
use crate::split_tally::SplitTally;
use crate::stats::HybridStats;

/// Column headings of the tab-delimited table, matching [`write_r_friendly`].
pub fn r_friendly_headings(params: &StatParameters) -> Vec<String> {
    let mut headings: Vec<String> = ["TE", "SI", "DC", "UC", "US", "QE", "TC", "TCA"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    headings.extend(params.rs_thresholds.iter().map(|t| format!("RS{t}")));
    headings.extend(params.si_thresholds.iter().map(|t| format!("SI-{t}")));
    headings.extend(params.compound_stats.iter().map(|c| c.name().to_string()));
    headings
}

/// One tab-delimited row of statistics, preceded by the heading line if `headings`.
pub fn write_r_friendly<W: Write>(
    out: &mut W,
    stats: &HybridStats,
    params: &StatParameters,
    headings: bool,
) -> Result<()> {
    if headings {
        writeln!(out, "{}", r_friendly_headings(params).join("\t"))?;
    }
    let mut row = vec![
        format!("{:7.3}", stats.topology_entropy()),
        stats.split_incompatibility().to_string(),
        stats.consensus_distance().to_string(),
        stats.unique_cherries().to_string(),
        stats.unique_splits().to_string(),
        stats
            .quartet_entropy()
            .map_or_else(|| "NA".to_string(), |qe| format!("{qe:5.3}")),
        format!("{:5.3}", stats.tree_certainty()),
        format!("{:5.3}", stats.tree_certainty_all()),
    ];
    for &t in &params.rs_thresholds {
        row.push(stats.cumulative_split_count(t)?.to_string());
    }
    for &t in &params.si_thresholds {
        row.push(stats.reduced_split_incompatibility(t)?.to_string());
    }
    for compound in &params.compound_stats {
        row.push(format!("{:.6}", compound.evaluate(stats)?));
    }
    writeln!(out, "{}", row.join("\t"))?;
    Ok(())
}

/// Multi-line report of every statistic with its largest possible value.
pub fn write_human_friendly<W: Write>(out: &mut W, stats: &HybridStats) -> Result<()> {
    let n_trees = stats.n_trees();
    let n_taxa = stats.n_taxa();
    let resolved = n_taxa.saturating_sub(3);

    let max_entropy = n_trees as f64 * (n_trees as f64).ln();
    writeln!(
        out,
        "(S1) Topology entropy = {:.6} (max possible={:.6})",
        stats.topology_entropy(),
        max_entropy
    )?;

    // Cumulative topology counts, collapsing the tail of singleton topologies
    let cumulative = stats.cumulative_topology_counts();
    write!(out, "(S2, S3) Cumulative counts of topologies: [")?;
    if let Some(first) = cumulative.first() {
        write!(out, "{first}")?;
        let mut i = 1;
        while i < cumulative.len() && cumulative[i] - cumulative[i - 1] > 1 {
            write!(out, " {}", cumulative[i])?;
            i += 1;
        }
        if i != cumulative.len() {
            write!(out, "... counts increase by one up to {}", cumulative.len())?;
        }
    }
    writeln!(out, "]")?;

    writeln!(
        out,
        "(S4) Total pairwise split incompatibility = {}",
        stats.split_incompatibility()
    )?;
    writeln!(
        out,
        "(S5) Sum diff Robinson Foulds distance to majority rule tree = {} (max possible = {})",
        stats.consensus_distance(),
        resolved * n_trees
    )?;
    writeln!(
        out,
        "(S9) Number of unique cherries = {} (max possible = {})",
        stats.unique_cherries(),
        n_taxa * n_taxa.saturating_sub(1) / 2
    )?;
    let all_splits = 2f64.powi(n_taxa as i32 - 1) - n_taxa as f64 - 1.0;
    writeln!(
        out,
        "(S10) Number of unique non-trivial splits observed = {} (c.f. {} for a single fully resolved tree, max {:.0})",
        stats.unique_splits(),
        resolved,
        ((resolved * n_trees) as f64).min(all_splits)
    )?;
    match stats.quartet_entropy() {
        Some(qe) => writeln!(out, "(S11) Quartet entropy = {qe:.6}")?,
        None => writeln!(out, "(S11) Quartet entropy = NA (fewer than 4 taxa)")?,
    }
    writeln!(
        out,
        "(S12) Cumulative number of splits with a given frequency = {:?}",
        stats.cumulative_split_counts()
    )?;
    writeln!(out, "Tree certainty = {:.6}", stats.tree_certainty())?;
    writeln!(out, "Tree certainty all = {:.6}", stats.tree_certainty_all())?;

    // Stops after the first threshold with no incompatibility left
    let n_splits = stats.total_splits();
    let n_pairs = n_splits * n_splits.saturating_sub(1) / 2;
    writeln!(out, "(S7) Split incompatibilities beyond threshold:")?;
    writeln!(out, "Thresh.   Pairwise incompat.")?;
    for (threshold, &reduced) in stats.reduced_split_incompatibilities().iter().enumerate() {
        writeln!(
            out,
            "{}/{} ({:2.0}%)      {}/{}",
            threshold,
            n_trees,
            100.0 * threshold as f64 / n_trees as f64,
            reduced,
            n_pairs
        )?;
        if reduced == 0 {
            break;
        }
    }
    Ok(())
}

/// L4, L5 and L11: split incompatibility, RF distance to the majority-rule
/// tree and quartet entropy of the lineage trees.
pub fn write_lineage_stats<W: Write>(out: &mut W, lineage: &Forest) -> Result<()> {
    let tally = SplitTally::from_forest(lineage)?;
    writeln!(
        out,
        "(L4) Lineage total pairwise split incompatibility = {}",
        tally.weighted_pairwise_split_incompatibility(0)
    )?;
    writeln!(
        out,
        "(L5) Lineage sum diff Robinson Foulds distance to majority rule tree = {}",
        tally.sum_rf_to_majority_rule()?
    )?;
    match quartet_entropy(lineage) {
        Ok(qe) => writeln!(out, "(L11) Lineage quartet entropy = {qe:.6}")?,
        Err(StatsError::TooFewTaxa(_)) => {
            writeln!(out, "(L11) Lineage quartet entropy = NA (fewer than 4 taxa)")?
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
