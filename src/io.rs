//! Reading tree files into a [`Forest`] and writing tab-separated output.
//!
//! Two input layouts are accepted:
//! - plain newick, one tree per line (blank lines and `#` lines ignored);
//! - NEXUS with one or more `TREES` blocks, each with an optional
//!   `TRANSLATE` table and `tree NAME = ...` lines, including BEAST-style
//!   `[&...]` annotations.
//!
//! Simulator output carries a `[Randomly selected coalescent ...]` and a
//! `[Randomly selected lineage ...]` block; [`TreeSource`] picks one by that
//! leading comment. A file with a single TREES block uses it whatever its
//! comment says.
//!
//! Files ending in `.gz` are read and written gzip-compressed.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, warn};
use phylotree::tree::Tree;

use crate::error::{Result, StatsError};
use crate::forest::Forest;

fn is_gz(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".gz")
}

/// Strip BEAST annotations from Newick strings.
///
/// BEAST format includes annotations like :[&rate=0.123]2.45 where 2.45 is the actual branch length.
/// This function removes the [&...] annotations while preserving the branch lengths.
fn strip_beast_annotations(newick: &str) -> String {
    let mut result = String::with_capacity(newick.len());
    let mut in_annotation = false;
    let mut chars = newick.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '[' && chars.peek() == Some(&'&') {
            in_annotation = true;
        } else if ch == ']' && in_annotation {
            in_annotation = false;
        } else if !in_annotation {
            result.push(ch);
        }
    }

    result
}

/// Which TREES block of a NEXUS file to analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeSource {
    #[default]
    Coalescent,
    Lineage,
}

impl TreeSource {
    fn comment_prefix(self) -> &'static str {
        match self {
            TreeSource::Coalescent => "Randomly selected coalescent",
            TreeSource::Lineage => "Randomly selected lineage",
        }
    }
}

impl fmt::Display for TreeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeSource::Coalescent => write!(f, "coalescent"),
            TreeSource::Lineage => write!(f, "lineage"),
        }
    }
}

/// Read a whole tree file into memory, decompressing `.gz` files.
pub fn read_tree_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if is_gz(path) {
        let mut content = String::new();
        GzDecoder::new(File::open(path)?).read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

/// Read the coalescent trees of a tree file, dropping the first `burnin` trees.
///
/// Returns the tree names (NEXUS tree labels, or `tree_<index>` for plain
/// newick) alongside the forest, in file order.
pub fn read_forest<P: AsRef<Path>>(path: P, burnin: usize) -> Result<(Vec<String>, Forest)> {
    parse_forest(&read_tree_file(path)?, burnin)
}

/// Parse tree file content; see [`read_forest`].
pub fn parse_forest(content: &str, burnin: usize) -> Result<(Vec<String>, Forest)> {
    parse_forest_from(content, burnin, TreeSource::Coalescent)
}

/// Parse the trees of the `source` block, or of the only TREES block there is.
///
/// # Errors
/// [`StatsError::TreesBlock`] when several TREES blocks exist and none, or
/// more than one, is marked as `source`.
pub fn parse_forest_from(
    content: &str,
    burnin: usize,
    source: TreeSource,
) -> Result<(Vec<String>, Forest)> {
    let (translate, entries) = if is_nexus(content) {
        match select_trees_block(split_trees_blocks(content), source)? {
            Some(block) => (parse_translate_block(&block.text), collect_tree_lines(&block.text)),
            None => (HashMap::new(), Vec::new()),
        }
    } else {
        (HashMap::new(), collect_newick_lines(content))
    };
    debug!(
        "Found {} trees ({} translated taxa), skipping {burnin}",
        entries.len(),
        translate.len()
    );

    let (names, trees): (Vec<String>, Vec<Tree>) = entries
        .into_iter()
        .enumerate()
        .skip(burnin)
        .filter_map(|(idx, entry)| {
            let newick = strip_beast_annotations(&entry.body);
            let mut tree = match Tree::from_newick(newick.trim()) {
                Ok(t) => t,
                Err(e) => {
                    warn!("Skipping tree '{}' at index {idx}: {e}", entry.name);
                    return None;
                }
            };
            if !translate.is_empty() {
                rename_leaf_nodes(&mut tree, &translate);
            }
            Some((entry.name, tree))
        })
        .unzip();

    let forest = Forest::from_trees(&trees)?;
    Ok((names, forest))
}

/// Whether `content` is NEXUS with a TREES block marked as `source`.
pub fn has_trees_block(content: &str, source: TreeSource) -> bool {
    is_nexus(content)
        && split_trees_blocks(content)
            .iter()
            .any(|block| block.is_from(source))
}

fn is_nexus(content: &str) -> bool {
    content
        .trim_start()
        .to_ascii_uppercase()
        .starts_with("#NEXUS")
}

/// Lines of one TREES block and its leading `[...]` comment.
struct TreesBlock {
    comment: Option<String>,
    text: String,
}

impl TreesBlock {
    fn from_lines(lines: &[&str]) -> Self {
        let comment = lines
            .iter()
            .map(|line| line.trim())
            .find(|line| line.starts_with('['))
            .map(|line| {
                let inner = line.trim_start_matches('[');
                inner.split(']').next().unwrap_or(inner).trim().to_string()
            });
        TreesBlock {
            comment,
            text: lines.join("\n"),
        }
    }

    fn is_from(&self, source: TreeSource) -> bool {
        self.comment
            .as_deref()
            .is_some_and(|c| c.starts_with(source.comment_prefix()))
    }
}

fn split_trees_blocks(content: &str) -> Vec<TreesBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in content.lines() {
        let upper = line.trim().to_ascii_uppercase();
        if let Some(mut lines) = current.take() {
            if upper.starts_with("END;") || upper.starts_with("ENDBLOCK;") {
                blocks.push(TreesBlock::from_lines(&lines));
            } else {
                lines.push(line);
                current = Some(lines);
            }
        } else if upper.starts_with("BEGIN TREES") {
            current = Some(Vec::new());
        }
    }
    if let Some(lines) = current {
        blocks.push(TreesBlock::from_lines(&lines));
    }
    blocks
}

fn select_trees_block(blocks: Vec<TreesBlock>, source: TreeSource) -> Result<Option<TreesBlock>> {
    let n_blocks = blocks.len();
    let (mut marked, mut others): (Vec<_>, Vec<_>) =
        blocks.into_iter().partition(|block| block.is_from(source));
    match marked.len() {
        1 => Ok(marked.pop()),
        0 if n_blocks <= 1 => {
            if n_blocks == 1 {
                warn!("Only one trees block found, so using that one");
            }
            Ok(others.pop())
        }
        0 => Err(StatsError::TreesBlock(format!(
            "none of the {n_blocks} TREES blocks holds {source} trees"
        ))),
        n => Err(StatsError::TreesBlock(format!("{n} TREES blocks hold {source} trees"))),
    }
}

/// One `tree NAME = newick` entry, or one line of a plain newick file.
struct TreeEntry {
    name: String,
    body: String,
}

fn collect_tree_lines(content: &str) -> Vec<TreeEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.to_ascii_uppercase().starts_with("TREE "))
        .filter_map(|line| {
            let (header, body) = line.split_once('=')?;
            let name = header
                .get(5..)?
                .trim()
                .trim_start_matches('*')
                .trim()
                .to_string();
            Some(TreeEntry {
                name,
                body: body.trim().to_string(),
            })
        })
        .collect()
}

fn collect_newick_lines(content: &str) -> Vec<TreeEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(idx, line)| TreeEntry {
            name: format!("tree_{idx}"),
            body: line.to_string(),
        })
        .collect()
}

fn parse_translate_block(content: &str) -> HashMap<String, String> {
    let mut done = false;
    content
        .lines()
        .skip_while(|line| !line.trim().to_ascii_uppercase().starts_with("TRANSLATE"))
        .skip(1)
        // STRUCTURE:
        // 1 '1959.M.CD.59.ZR59',
        // 2 '1960.DRC60A';
        .take_while(|line| {
            let go = !done && !line.trim().starts_with(';');
            done = line.trim_end().ends_with(';');
            go
        })
        .filter_map(|line| {
            let line = line.trim().trim_end_matches([',', ';']);
            let (id, label) = line.split_once(char::is_whitespace)?;
            let label = label.trim().trim_matches('\'');
            Some((id.to_string(), label.to_string()))
        })
        .collect()
}

/// Replace leaf names found in `translate`; other names are left as they are.
pub fn rename_leaf_nodes(phylo_tree: &mut Tree, translate: &HashMap<String, String>) {
    for leaf_id in phylo_tree.get_leaves() {
        if let Ok(node) = phylo_tree.get_mut(&leaf_id) {
            if let Some(label) = node.name.as_ref().and_then(|n| translate.get(n)) {
                node.name = Some(label.clone());
            }
        }
    }
}

/// Open `path` for writing: stdout for `-`, gzip for `.gz`, a plain file otherwise.
pub fn open_output<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Write>> {
    let p = path.as_ref();
    if p.as_os_str() == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let f = File::create(p)?;
    if is_gz(p) {
        Ok(Box::new(BufWriter::new(GzEncoder::new(f, Compression::default()))))
    } else {
        Ok(Box::new(BufWriter::new(f)))
    }
}

/// Write a labeled square matrix as TSV to a file or stdout.
/// If `path` ends with `.gz`, the output is gzip-compressed.
/// If `path` equals `-`, the matrix is written to stdout (uncompressed).
pub fn write_matrix_tsv<P: AsRef<Path>, T: std::fmt::Display>(
    path: P,
    names: &[String],
    mat: &[Vec<T>],
) -> io::Result<()> {
    let mut out = open_output(path)?;

    // Header row
    write!(&mut out, "\t")?;
    for (k, name) in names.iter().enumerate() {
        if k > 0 {
            write!(&mut out, "\t")?;
        }
        write!(&mut out, "{}", name)?;
    }
    writeln!(&mut out)?;

    // Rows
    for (row, name) in mat.iter().zip(names) {
        write!(&mut out, "{}", name)?;
        for val in row {
            write!(&mut out, "\t{}", val)?;
        }
        writeln!(&mut out)?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXUS: &str = "#NEXUS

Begin taxa;
    Dimensions ntax=4;
End;

Begin trees;
    Translate
        1 'Homo',
        2 'Pan',
        3 'Gorilla',
        4 'Pongo'
    ;
tree STATE_0 = [&R] ((1:[&rate=0.5]1.0,2:1.0):0.5,(3:1.0,4:1.0):0.5);
tree STATE_1000 = [&R] ((1:1.0,3:1.0):0.5,(2:1.0,4:1.0):0.5);
tree STATE_2000 = [&R] ((1:1.0,2:1.0):0.5,(3:1.0,4:1.0):0.5);
End;
";

    const SIMULATED: &str = "#NEXUS
Begin trees;
[Randomly selected lineage trees]
    Translate
        1 A,
        2 B,
        3 C,
        4 D
    ;
tree L0 = ((1,2),(3,4));
tree L1 = ((1,3),(2,4));
End;

Begin trees;
[Randomly selected coalescent trees]
tree C0 = ((A,B),(C,D));
tree C1 = ((A,D),(B,C));
tree C2 = ((A,B),(C,D));
End;
";

    #[test]
    fn test_select_block_by_comment() {
        let (names, forest) = parse_forest(SIMULATED, 0).unwrap();
        assert_eq!(names, vec!["C0", "C1", "C2"]);
        assert_eq!(forest.len(), 3);

        let (names, forest) = parse_forest_from(SIMULATED, 1, TreeSource::Lineage).unwrap();
        assert_eq!(names, vec!["L1"]);
        assert_eq!(forest.get(0).unwrap().topology_string(), "(A,(B,D),C);");

        assert!(has_trees_block(SIMULATED, TreeSource::Lineage));
        assert!(!has_trees_block(NEXUS, TreeSource::Lineage));
    }

    #[test]
    fn test_single_block_fallback() {
        let (names, _) = parse_forest_from(NEXUS, 0, TreeSource::Lineage).unwrap();
        assert_eq!(names, vec!["STATE_0", "STATE_1000", "STATE_2000"]);
    }

    #[test]
    fn test_unmarked_blocks_rejected() {
        let unmarked = SIMULATED.replace("[Randomly selected coalescent trees]", "");
        assert!(matches!(
            parse_forest(&unmarked, 0),
            Err(StatsError::TreesBlock(_))
        ));
        let doubled = SIMULATED.replace("lineage", "coalescent");
        assert!(matches!(
            parse_forest(&doubled, 0),
            Err(StatsError::TreesBlock(_))
        ));
    }

    #[test]
    fn test_strip_annotations() {
        assert_eq!(
            strip_beast_annotations("(A:[&rate=0.1]1.0,B:[&rate=2]2.0)[&R];"),
            "(A:1.0,B:2.0);"
        );
    }

    #[test]
    fn test_parse_nexus() {
        let (names, forest) = parse_forest(NEXUS, 0).unwrap();
        assert_eq!(names, vec!["STATE_0", "STATE_1000", "STATE_2000"]);
        assert_eq!(forest.len(), 3);
        let taxa = forest.taxa().unwrap();
        assert_eq!(taxa.labels(), &["Gorilla", "Homo", "Pan", "Pongo"]);
        assert_eq!(
            forest.get(0).unwrap().topology_string(),
            "(Gorilla,(Homo,Pan),Pongo);"
        );
    }

    #[test]
    fn test_burnin() {
        let (names, forest) = parse_forest(NEXUS, 2).unwrap();
        assert_eq!(names, vec!["STATE_2000"]);
        assert_eq!(forest.len(), 1);
        let (_, empty) = parse_forest(NEXUS, 5).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_translate_with_trailing_semicolon() {
        let map = parse_translate_block("translate\n 1 A,\n 2 'B C';\ntree t = (1,2);\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map["2"], "B C");
    }

    #[test]
    fn test_parse_newick_lines() {
        let content = "# sampled trees\n((A,B),(C,D));\n\n  ((A,C),(B,D));  \n";
        let (names, forest) = parse_forest(content, 0).unwrap();
        assert_eq!(names, vec!["tree_0", "tree_1"]);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest.get(1).unwrap().topology_string(), "(A,(B,D),C);");
    }

    #[test]
    fn test_write_matrix_tsv_gz_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("hybrid_tree_stats_{}.tsv.gz", std::process::id()));
        let names = vec!["t0".to_string(), "t1".to_string()];
        write_matrix_tsv(&path, &names, &[vec![0, 2], vec![2, 0]]).unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(text, "\tt0\tt1\nt0\t0\t2\nt1\t2\t0\n");
    }
}
