//! Which optional statistics to report: split incompatibility thresholds,
//! rare split thresholds and compound statistics.
//!
//! # Parameter file
//! ```text
//! # comment
//! split incompatibility thresholds = {1|2|4}
//! rare splits thresholds = (1:5:2)
//! compound = fit(1.25) 0.81 : 1.5e-3*TE : -4.4e-4*DC
//! ```
//! Threshold lists are either `{a|b|c}` or a range `(start:stop[:step])`,
//! stop inclusive. `compound` may be repeated.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use log::warn;

use crate::compound::CompoundStat;
use crate::error::{Result, StatsError};
use crate::stats::StatLookup;

const SI_THRESHOLDS: &str = "split incompatibility thresholds";
const RS_THRESHOLDS: &str = "rare splits thresholds";
const COMPOUND: &str = "compound";

#[derive(Debug, Clone, PartialEq)]
pub struct StatParameters {
    /// Thresholds `t` reported as `SI-t`.
    pub si_thresholds: Vec<usize>,
    /// Frequencies `k` reported as `RS<k>`.
    pub rs_thresholds: Vec<usize>,
    pub compound_stats: Vec<CompoundStat>,
}

impl Default for StatParameters {
    /// `RS1`, `SI-1` and `SI-2`, no compound statistics.
    fn default() -> Self {
        StatParameters {
            si_thresholds: vec![1, 2],
            rs_thresholds: vec![1],
            compound_stats: Vec::new(),
        }
    }
}

impl StatParameters {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::read_to_string(path)?.parse()
    }

    pub fn add_compound_stat(&mut self, stat: CompoundStat) {
        self.compound_stats.push(stat);
    }

    /// Reject thresholds the forest is too small for.
    ///
    /// SI thresholds must stay below half the tree count; RS thresholds below the tree count.
    pub fn range_check(&self, n_trees: usize) -> Result<()> {
        if let Some(&max) = self.si_thresholds.iter().max() {
            if 2 * max >= n_trees {
                return Err(StatsError::ThresholdTooLarge {
                    kind: "Split incompatibility",
                    threshold: max,
                    n_trees,
                });
            }
        }
        if let Some(&max) = self.rs_thresholds.iter().max() {
            if max >= n_trees {
                return Err(StatsError::ThresholdTooLarge {
                    kind: "Rare split",
                    threshold: max,
                    n_trees,
                });
            }
        }
        Ok(())
    }

    /// Value of each compound statistic, keyed by name.
    pub fn compound_values<S: StatLookup + ?Sized>(&self, stats: &S) -> Result<BTreeMap<String, f64>> {
        self.compound_stats
            .iter()
            .map(|c| -> Result<(String, f64)> { Ok((c.name().to_string(), c.evaluate(stats)?)) })
            .collect()
    }
}

impl FromStr for StatParameters {
    type Err = StatsError;

    /// Parse a parameter file; keys not given keep their defaults.
    fn from_str(s: &str) -> Result<Self> {
        let mut params = StatParameters::default();
        for line in s.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!("Ignoring parameter line without '=': {line}");
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();
            match key.as_str() {
                SI_THRESHOLDS => params.si_thresholds = parse_int_specification(value)?,
                RS_THRESHOLDS => params.rs_thresholds = parse_int_specification(value)?,
                COMPOUND => params.add_compound_stat(value.parse()?),
                _ => warn!("Ignoring unknown parameter '{key}'"),
            }
        }
        Ok(params)
    }
}

/// Parse `{a|b|c}` or `(start:stop[:step])` into a list of thresholds.
///
/// # Example
/// ```
/// # use hybrid_tree_stats::params::parse_int_specification;
/// assert_eq!(parse_int_specification("{1|2|5}").unwrap(), vec![1, 2, 5]);
/// assert_eq!(parse_int_specification("(1:7:3)").unwrap(), vec![1, 4, 7]);
/// assert_eq!(parse_int_specification("(3:1:-1)").unwrap(), vec![3, 2, 1]);
/// ```
pub fn parse_int_specification(spec: &str) -> Result<Vec<usize>> {
    let bad = || StatsError::BadThresholds(spec.to_string());
    let parse = |token: &str| token.trim().parse::<i64>().map_err(|_| bad());

    let values: Vec<i64> = if let Some(inner) = between(spec, '{', '}') {
        inner.split('|').map(parse).collect::<Result<_>>()?
    } else if let Some(inner) = between(spec, '(', ')') {
        let tokens: Vec<&str> = inner.split(':').collect();
        if tokens.len() != 2 && tokens.len() != 3 {
            return Err(bad());
        }
        let start = parse(tokens[0])?;
        let stop = parse(tokens[1])?;
        let step = if tokens.len() == 3 { parse(tokens[2])? } else { 1 };
        if step == 0 || (stop - start) / step < 0 {
            return Err(bad());
        }
        let n = (stop - start) / step + 1;
        (0..n).map(|i| start + i * step).collect()
    } else {
        return Err(bad());
    };

    values
        .into_iter()
        .map(|v| usize::try_from(v).map_err(|_| bad()))
        .collect()
}

fn between(s: &str, open: char, close: char) -> Option<&str> {
    let start = s.find(open)?;
    let end = s.find(close)?;
    (end > start).then(|| &s[start + open.len_utf8()..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = StatParameters::default();
        assert_eq!(params.si_thresholds, vec![1, 2]);
        assert_eq!(params.rs_thresholds, vec![1]);
        assert!(params.compound_stats.is_empty());
    }

    #[test]
    fn test_int_specifications() {
        assert_eq!(parse_int_specification("{3}").unwrap(), vec![3]);
        assert_eq!(parse_int_specification(" { 1 | 4 } ").unwrap(), vec![1, 4]);
        assert_eq!(parse_int_specification("(2:4)").unwrap(), vec![2, 3, 4]);
        assert_eq!(parse_int_specification("(0:9:4)").unwrap(), vec![0, 4, 8]);
        for bad in ["1,2", "{a|2}", "(1:2:0)", "(5:1)", "{-1}", "(1)", ""] {
            assert!(
                matches!(parse_int_specification(bad), Err(StatsError::BadThresholds(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_file() {
        let text = "\
# thresholds for the ABC run
split incompatibility thresholds = {1|3}
Rare Splits Thresholds = (1:3)
compound = fit(0.5) 1 : 2*TE   # trailing comment
compound = other(1) 3*SI
unknown key = 7
";
        let params: StatParameters = text.parse().unwrap();
        assert_eq!(params.si_thresholds, vec![1, 3]);
        assert_eq!(params.rs_thresholds, vec![1, 2, 3]);
        let names: Vec<&str> = params.compound_stats.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["fit", "other"]);
    }

    struct Lookup;

    impl StatLookup for Lookup {
        fn stat_by_name(&self, name: &str) -> Result<f64> {
            match name {
                "1" => Ok(1.0),
                "TE" => Ok(2.5),
                "SI" => Ok(10.0),
                _ => Err(StatsError::UnknownStat(name.to_string())),
            }
        }
    }

    #[test]
    fn test_compound_values() {
        let mut params: StatParameters = "compound = fit(0.5) 1 : 2*TE".parse().unwrap();
        params.add_compound_stat("other(1) 0.5*SI*TE".parse().unwrap());
        let values = params.compound_values(&Lookup).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["fit"], 6.0);
        assert_eq!(values["other"], 12.5);

        params.add_compound_stat("broken(1) 1*QE".parse().unwrap());
        assert!(matches!(
            params.compound_values(&Lookup),
            Err(StatsError::UnknownStat(ref n)) if n == "QE"
        ));
    }

    #[test]
    fn test_parse_file_errors() {
        assert!("rare splits thresholds = 1".parse::<StatParameters>().is_err());
        assert!("compound = fit 1*TE".parse::<StatParameters>().is_err());
    }

    #[test]
    fn test_range_check() {
        let params = StatParameters::default();
        assert!(params.range_check(5).is_ok());
        assert!(matches!(
            params.range_check(4),
            Err(StatsError::ThresholdTooLarge { threshold: 2, n_trees: 4, .. })
        ));
        let rare = StatParameters {
            si_thresholds: vec![],
            rs_thresholds: vec![1, 6],
            compound_stats: vec![],
        };
        assert!(rare.range_check(7).is_ok());
        assert!(matches!(
            rare.range_check(6),
            Err(StatsError::ThresholdTooLarge { threshold: 6, .. })
        ));
    }
}
