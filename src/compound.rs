//! Compound statistics: named linear combinations of products of base statistics.
//!
//! Text form of one compound statistic:
//! ```text
//! fitCoal(1.25) 8.138e-01 : 1.491e-03*TE : 2.012e-07*SI*SI : -4.405e-04*DC
//! ```
//! The name is followed by the standard deviation in parentheses, then the
//! terms separated by `:`. Each term is a coefficient optionally multiplied by
//! base statistic names; `1` is also accepted as a name and evaluates to 1.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StatsError};
use crate::stats::StatLookup;

/// One term: a coefficient times zero or more named statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundCoefficient {
    pub coefficient: f64,
    pub variables: Vec<String>,
}

impl CompoundCoefficient {
    pub fn new(coefficient: f64, variables: Vec<String>) -> Self {
        CompoundCoefficient {
            coefficient,
            variables,
        }
    }

    pub fn evaluate<S: StatLookup + ?Sized>(&self, stats: &S) -> Result<f64> {
        let mut result = self.coefficient;
        for var in &self.variables {
            result *= stats.stat_by_name(var)?;
        }
        Ok(result)
    }
}

impl FromStr for CompoundCoefficient {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || StatsError::BadCoefficient(s.to_string());
        let mut parts = s.split('*').map(str::trim);
        let coefficient = parts
            .next()
            .and_then(|c| c.parse::<f64>().ok())
            .ok_or_else(bad)?;
        let variables: Vec<String> = parts.map(String::from).collect();
        if variables.iter().any(|v| v.is_empty()) {
            return Err(bad());
        }
        Ok(CompoundCoefficient::new(coefficient, variables))
    }
}

impl fmt::Display for CompoundCoefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coefficient)?;
        for var in &self.variables {
            write!(f, "*{var}")?;
        }
        Ok(())
    }
}

/// A named sum of [`CompoundCoefficient`] terms with a fixed standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStat {
    name: String,
    std_dev: f64,
    coefficients: Vec<CompoundCoefficient>,
}

impl CompoundStat {
    /// A compound statistic with no terms yet.
    pub fn new(name: impl Into<String>, std_dev: f64) -> Self {
        CompoundStat {
            name: name.into(),
            std_dev,
            coefficients: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn coefficients(&self) -> &[CompoundCoefficient] {
        &self.coefficients
    }

    /// Parse and append one term.
    pub fn add_coefficient(&mut self, term: &str) -> Result<()> {
        self.coefficients.push(term.parse()?);
        Ok(())
    }

    pub fn evaluate<S: StatLookup + ?Sized>(&self, stats: &S) -> Result<f64> {
        self.coefficients
            .iter()
            .map(|c| c.evaluate(stats))
            .sum()
    }

    /// `(value − scale·σ, value + scale·σ)`.
    pub fn evaluate_range<S: StatLookup + ?Sized>(&self, stats: &S, scale: f64) -> Result<(f64, f64)> {
        let value = self.evaluate(stats)?;
        let half = scale * self.std_dev;
        Ok((value - half, value + half))
    }
}

impl FromStr for CompoundStat {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || StatsError::BadCompoundStat(s.to_string());
        let (name, rest) = s.split_once('(').ok_or_else(bad)?;
        let (std_dev, terms) = rest.split_once(')').ok_or_else(bad)?;
        if terms.contains(['(', ')']) {
            return Err(bad());
        }
        let name = name.trim();
        let terms = terms.trim();
        if name.is_empty() || terms.is_empty() {
            return Err(bad());
        }
        let std_dev = std_dev.trim().parse::<f64>().map_err(|_| bad())?;

        let mut stat = CompoundStat::new(name, std_dev);
        for term in terms.split(':') {
            stat.add_coefficient(term)?;
        }
        Ok(stat)
    }
}

impl fmt::Display for CompoundStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.std_dev)?;
        let mut separator = " ";
        for coef in &self.coefficients {
            write!(f, "{separator}{coef}")?;
            separator = " : ";
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    struct FixedStats(HashMap<&'static str, f64>);

    impl StatLookup for FixedStats {
        fn stat_by_name(&self, name: &str) -> Result<f64> {
            if name == "1" {
                return Ok(1.0);
            }
            self.0
                .get(name)
                .copied()
                .ok_or_else(|| StatsError::UnknownStat(name.to_string()))
        }
    }

    fn stats() -> FixedStats {
        FixedStats(HashMap::from([("TE", 2.0), ("SI", 10.0), ("QE", 0.5)]))
    }

    #[test]
    fn test_coefficient_round_trip() {
        let coef: CompoundCoefficient = "1.491e-03*QE*QE*TE".parse().unwrap();
        assert_relative_eq!(coef.coefficient, 1.491e-3);
        assert_eq!(coef.variables, vec!["QE", "QE", "TE"]);

        let again: CompoundCoefficient = coef.to_string().parse().unwrap();
        assert_relative_eq!(again.coefficient, coef.coefficient);
        assert_eq!(again.variables, coef.variables);
    }

    #[test]
    fn test_coefficient_evaluate() {
        let coef: CompoundCoefficient = "3 * TE * SI".parse().unwrap();
        assert_relative_eq!(coef.evaluate(&stats()).unwrap(), 60.0);
        let intercept: CompoundCoefficient = "-0.25".parse().unwrap();
        assert!(intercept.variables.is_empty());
        assert_relative_eq!(intercept.evaluate(&stats()).unwrap(), -0.25);
    }

    #[test]
    fn test_bad_coefficient() {
        for input in ["TE*2", "x", "2*TE**SI", ""] {
            match input.parse::<CompoundCoefficient>() {
                Err(StatsError::BadCoefficient(literal)) => assert_eq!(literal, input),
                other => panic!("'{input}' parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn test_compound_stat_parse_and_evaluate() {
        let stat: CompoundStat = "fit(1.5) 0.5 : 2*TE : 0.1*SI*QE : 4*1".parse().unwrap();
        assert_eq!(stat.name(), "fit");
        assert_relative_eq!(stat.std_dev(), 1.5);
        assert_eq!(stat.coefficients().len(), 4);
        // 0.5 + 4 + 0.5 + 4
        assert_relative_eq!(stat.evaluate(&stats()).unwrap(), 9.0);
        let (lo, hi) = stat.evaluate_range(&stats(), 2.0).unwrap();
        assert_relative_eq!(lo, 6.0);
        assert_relative_eq!(hi, 12.0);
    }

    #[test]
    fn test_compound_stat_round_trip() {
        let stat: CompoundStat = "fit(1.25) 0.8138 : 0.001491*TE : -7.387e-3*US".parse().unwrap();
        assert_eq!(stat.to_string(), "fit(1.25) 0.8138 : 0.001491*TE : -0.007387*US");
        assert_eq!(stat.to_string().parse::<CompoundStat>().unwrap(), stat);
    }

    #[test]
    fn test_built_compound_stat_keeps_std_dev() {
        let mut stat = CompoundStat::new("lin", 0.75);
        stat.add_coefficient("1*TE").unwrap();
        assert_relative_eq!(stat.std_dev(), 0.75);
        let (lo, hi) = stat.evaluate_range(&stats(), 1.0).unwrap();
        assert_relative_eq!(lo, 1.25);
        assert_relative_eq!(hi, 2.75);
        assert!(stat.add_coefficient("one*TE").is_err());
    }

    #[test]
    fn test_bad_compound_stat() {
        for input in ["fit 1*TE", "fit(x) 1*TE", "(1) 1*TE", "fit(1)", "fit(1) 1*TE (2)"] {
            assert!(
                matches!(input.parse::<CompoundStat>(), Err(StatsError::BadCompoundStat(_))),
                "{input}"
            );
        }
        assert!(matches!(
            "fit(1) 1*TE : oops".parse::<CompoundStat>(),
            Err(StatsError::BadCoefficient(_))
        ));
    }

    #[test]
    fn test_unknown_stat_propagates() {
        let stat: CompoundStat = "f(1) 1*XX".parse().unwrap();
        assert!(matches!(
            stat.evaluate(&stats()),
            Err(StatsError::UnknownStat(name)) if name == "XX"
        ));
    }
}
