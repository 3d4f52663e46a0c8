use clap::Parser;
use hybrid_tree_stats::distances::rf_matrix;
use hybrid_tree_stats::io::{
    TreeSource, has_trees_block, open_output, parse_forest_from, read_tree_file, write_matrix_tsv,
};
use hybrid_tree_stats::params::StatParameters;
use hybrid_tree_stats::report::{write_human_friendly, write_lineage_stats, write_r_friendly};
use hybrid_tree_stats::split_tally::DEFAULT_SEED;
use hybrid_tree_stats::stats::HybridStats;
use hybrid_tree_stats::topology::TopologyTally;
use hybrid_tree_stats::{Forest, StatsError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compute hybridization summary statistics (topology entropy, split
/// incompatibility, quartet entropy, tree certainty, ...) for a forest of
/// trees read from a newick or NEXUS file.
#[derive(Parser, Debug)]
#[command(name = "hybrid-tree-stats", version, about = "Summary statistics for a forest of gene trees")]
struct Args {
    /// Path to the tree file (one newick per line, or NEXUS; .gz accepted)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Analyse the lineage trees block instead of the coalescent trees block
    #[arg(short = 'l', long = "lineage", default_value_t = false)]
    lineage: bool,

    /// Burn-in by number of trees (drop first N trees)
    #[arg(short = 't', long = "burnin", default_value_t = 0)]
    burnin: usize,

    /// Output path for the tab-delimited statistics table (`-` for stdout, .gz compresses)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Parameter file with thresholds and compound statistics
    #[arg(short = 'p', long = "params")]
    params: Option<PathBuf>,

    /// Split incompatibility thresholds reported as SI-<t> (overrides the parameter file)
    #[arg(long = "si-thresholds", value_delimiter = ',')]
    si_thresholds: Option<Vec<usize>>,

    /// Rare split thresholds reported as RS<k> (overrides the parameter file)
    #[arg(long = "rs-thresholds", value_delimiter = ',')]
    rs_thresholds: Option<Vec<usize>>,

    /// Seed for breaking ties between equally frequent splits
    #[arg(long = "seed", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Also write the pairwise Robinson-Foulds matrix of the forest as TSV
    #[arg(long = "rf-matrix")]
    rf_matrix: Option<PathBuf>,

    /// Print split and topology counts, consensus trees and internode certainties
    #[arg(long = "dump", default_value_t = false)]
    dump: bool,

    /// Quiet mode: suppresses progress messages and the readable report on stdout
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    let show = !args.quiet;

    // Read trees with names
    let t0 = Instant::now();
    let source = if args.lineage {
        TreeSource::Lineage
    } else {
        TreeSource::Coalescent
    };
    let content = match read_tree_file(&args.input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", args.input);
            std::process::exit(2);
        }
    };
    let (names, forest) = match parse_forest_from(&content, args.burnin, source) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", args.input);
            std::process::exit(2);
        }
    };
    if forest.is_empty() {
        eprintln!("No trees parsed from {:?}.", args.input);
        std::process::exit(2);
    }
    let read_s = t0.elapsed().as_secs_f64();
    log_if(show, format!("Reading trees {read_s:.3}s"));
    log_if(
        show,
        format!(
            "{} {source} trees on {} taxa read from {:?}",
            forest.len(),
            forest.n_taxa(),
            args.input
        ),
    );

    let params = match load_params(&args, forest.len()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid parameters: {e}");
            std::process::exit(3);
        }
    };

    // Compute every statistic once
    let t1 = Instant::now();
    let mut stats = match HybridStats::with_seed(&forest, args.seed) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to compute statistics: {e}");
            std::process::exit(3);
        }
    };
    let stats_s = t1.elapsed().as_secs_f64();
    log_if(show, format!("Computing summary statistics {stats_s:.3}s"));

    if show {
        let mut stdout = std::io::stdout().lock();
        let shown = writeln!(stdout)
            .map_err(StatsError::from)
            .and_then(|_| write_human_friendly(&mut stdout, &stats))
            .and_then(|_| {
                for (name, value) in params.compound_values(&stats)? {
                    writeln!(stdout, "Compound stat {name} = {value:.6}")?;
                }
                Ok(())
            })
            .and_then(|_| {
                if args.lineage || !has_trees_block(&content, TreeSource::Lineage) {
                    return Ok(());
                }
                let (_, lineage) = parse_forest_from(&content, args.burnin, TreeSource::Lineage)?;
                if lineage.is_empty() {
                    return Ok(());
                }
                write_lineage_stats(&mut stdout, &lineage)
            });
        if let Err(e) = shown {
            eprintln!("Failed to print report: {e}");
            std::process::exit(4);
        }
    }

    if args.dump {
        if let Err(e) = dump(&forest, &mut stats) {
            eprintln!("Failed to dump tallies: {e}");
            std::process::exit(4);
        }
    }

    if let Some(output) = &args.output {
        let t2 = Instant::now();
        let written = open_output(output)
            .map_err(StatsError::from)
            .and_then(|mut out| {
                write_r_friendly(&mut out, &stats, &params, true)?;
                out.flush()?;
                Ok(())
            });
        if let Err(e) = written {
            eprintln!("Failed to write output {:?}: {e}", output);
            std::process::exit(4);
        }
        log_write_done(show, output, t2.elapsed().as_secs_f64());
    }

    if let Some(path) = &args.rf_matrix {
        let t3 = Instant::now();
        log_if(
            show,
            format!("Determining RF distances for {} combinations", names.len() * (names.len() - 1) / 2),
        );
        let mat = rf_matrix(&forest);
        if let Err(e) = write_matrix_tsv(path, &names, &mat) {
            eprintln!("Failed to write output {:?}: {e}", path);
            std::process::exit(4);
        }
        log_write_done(show, path, t3.elapsed().as_secs_f64());
    }
}

/// Parameter file (or defaults), then thresholds given on the command line, then a range check.
fn load_params(args: &Args, n_trees: usize) -> Result<StatParameters, StatsError> {
    let mut params = match &args.params {
        Some(path) => StatParameters::from_file(path)?,
        None => StatParameters::default(),
    };
    if let Some(si) = &args.si_thresholds {
        params.si_thresholds = si.clone();
    }
    if let Some(rs) = &args.rs_thresholds {
        params.rs_thresholds = rs.clone();
    }
    params.range_check(n_trees)?;
    Ok(params)
}

fn dump(forest: &Forest, stats: &mut HybridStats) -> Result<(), StatsError> {
    let mut out = std::io::stdout().lock();
    let tally = stats.split_tally_mut();
    let Some(taxa) = tally.taxa().cloned() else {
        return Err(StatsError::Unbound);
    };

    writeln!(out, "\nTaxa: {}", taxa.labels().join(" "))?;
    writeln!(out, "\nCounts of splits:")?;
    for (split, count) in tally.ranked_splits() {
        writeln!(out, "{split} {}: {count}", taxa.format_subset(split.side()))?;
    }

    writeln!(out, "\nCounts of tree topologies:")?;
    let topologies = TopologyTally::from_forest(forest)?;
    let mut rows: Vec<(&str, usize)> = topologies.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (topology, count) in rows {
        writeln!(out, "{topology}: {count}")?;
    }

    let majority = tally.majority_rule_consensus_tree()?;
    writeln!(out, "\nMajority rule consensus tree: {}", majority.topology_string())?;
    let greedy = tally.greedy_consensus_tree(false)?;
    writeln!(out, "\nGreedy consensus tree: {}", greedy.topology_string())?;

    writeln!(out)?;
    for pair in tally.internode_certainties() {
        writeln!(out, "{pair}")?;
    }
    Ok(())
}

fn log_if(show: bool, msg: String) {
    if show {
        println!("{}", msg);
    }
}

fn log_write_done(show: bool, output: &Path, secs: f64) {
    if !show {
        return;
    }
    let is_stdout = output.as_os_str() == "-";
    if is_stdout {
        println!("Writing to stdout {secs:.3}s");
    } else {
        println!("Writing to output {secs:.3}s");
    }
}
