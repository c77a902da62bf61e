//! Coverage data types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::DEFAULT_THRESHOLD;

/// Identifies one branch: source line, basic block and branch number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchId {
    pub line: u32,
    pub block: u32,
    pub branch: u32,
}

impl BranchId {
    pub fn new(line: u32, block: u32, branch: u32) -> Self {
        Self { line, block, branch }
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.line, self.block, self.branch)
    }
}

/// How often a branch was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCoverage {
    pub taken: u64,
    pub total: u64,
}

/// Execution record of one function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCoverage {
    /// Declaration line, 0 when unknown.
    pub line: u32,
    pub executed: bool,
    pub hits: u64,
}

impl FunctionCoverage {
    pub fn with_hits(line: u32, hits: u64) -> Self {
        Self {
            line,
            executed: hits > 0,
            hits,
        }
    }
}

/// Coverage of one source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCoverage {
    pub path: String,
    /// Line number to hit count.
    pub lines: BTreeMap<u32, u64>,
    pub branches: BTreeMap<BranchId, BranchCoverage>,
    /// Function name to execution record.
    pub functions: BTreeMap<String, FunctionCoverage>,
}

impl FileCoverage {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_line(mut self, line: u32, hits: u64) -> Self {
        self.lines.insert(line, hits);
        self
    }

    pub fn with_branch(mut self, id: BranchId, taken: u64, total: u64) -> Self {
        self.branches.insert(id, BranchCoverage { taken, total });
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, line: u32, hits: u64) -> Self {
        self.functions
            .insert(name.into(), FunctionCoverage::with_hits(line, hits));
        self
    }

    pub fn covered_lines(&self) -> usize {
        self.lines.values().filter(|&&hits| hits > 0).count()
    }

    pub fn covered_branches(&self) -> usize {
        self.branches.values().filter(|b| b.taken > 0).count()
    }

    pub fn covered_functions(&self) -> usize {
        self.functions.values().filter(|f| f.executed).count()
    }

    /// Fold another record for the same unit into this one.
    ///
    /// Hit counts add up; a function is executed if either side executed it.
    pub fn merge(&mut self, other: &FileCoverage) {
        for (line, hits) in &other.lines {
            *self.lines.entry(*line).or_default() += hits;
        }
        for (id, branch) in &other.branches {
            let entry = self.branches.entry(*id).or_default();
            entry.taken += branch.taken;
            entry.total = entry.total.max(branch.total);
        }
        for (name, func) in &other.functions {
            let entry = self.functions.entry(name.clone()).or_default();
            if entry.line == 0 {
                entry.line = func.line;
            }
            entry.hits += func.hits;
            entry.executed |= func.executed;
        }
    }
}

/// Totals for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetric {
    pub total: usize,
    pub covered: usize,
    pub skipped: usize,
    pub percentage: f64,
}

impl CoverageMetric {
    pub fn new(total: usize, covered: usize) -> Self {
        Self {
            total,
            covered,
            skipped: 0,
            percentage: percentage(covered, total),
        }
    }
}

/// `covered / total * 100`, rounded to two decimals; 0 when nothing is measured.
pub fn percentage(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = covered as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Totals over every file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub lines: CoverageMetric,
    pub branches: CoverageMetric,
    pub functions: CoverageMetric,
    /// Same numbers as `lines`; no separate statement data is collected.
    pub statements: CoverageMetric,
}

impl CoverageSummary {
    pub fn metric(&self, metric: Metric) -> &CoverageMetric {
        match metric {
            Metric::Lines => &self.lines,
            Metric::Branches => &self.branches,
            Metric::Functions => &self.functions,
            Metric::Statements => &self.statements,
        }
    }
}

/// The four tracked metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Lines,
    Branches,
    Functions,
    Statements,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Lines,
        Metric::Branches,
        Metric::Functions,
        Metric::Statements,
    ];

    /// Key used in configuration files.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Lines => "lines",
            Metric::Branches => "branches",
            Metric::Functions => "functions",
            Metric::Statements => "statements",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Metric::Lines => "Line",
            Metric::Branches => "Branch",
            Metric::Functions => "Function",
            Metric::Statements => "Statement",
        }
    }
}

/// Minimum percentages. An unset metric uses [`DEFAULT_THRESHOLD`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<f64>,
}

impl Thresholds {
    /// The same minimum for every metric.
    pub fn uniform(value: f64) -> Self {
        Self {
            lines: Some(value),
            branches: Some(value),
            functions: Some(value),
            statements: Some(value),
        }
    }

    fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Lines => self.lines,
            Metric::Branches => self.branches,
            Metric::Functions => self.functions,
            Metric::Statements => self.statements,
        }
    }

    /// Threshold in force for `metric`.
    pub fn effective(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(DEFAULT_THRESHOLD)
    }

    /// Explicitly configured thresholds with their keys.
    pub fn configured(&self) -> Vec<(&'static str, f64)> {
        Metric::ALL
            .iter()
            .filter_map(|&m| self.get(m).map(|v| (m.key(), v)))
            .collect()
    }
}

/// Outcome of a threshold check.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdReport {
    pub passed: bool,
    /// One message per violated metric.
    pub failures: Vec<String>,
}

impl ThresholdReport {
    pub(crate) fn evaluate(summary: &CoverageSummary, thresholds: &Thresholds) -> Self {
        let failures: Vec<String> = Metric::ALL
            .iter()
            .filter_map(|&metric| {
                let actual = summary.metric(metric).percentage;
                let minimum = thresholds.effective(metric);
                (actual < minimum).then(|| {
                    format!(
                        "{} coverage {}% is below threshold {}%",
                        metric.label(),
                        actual,
                        minimum
                    )
                })
            })
            .collect();

        Self {
            passed: failures.is_empty(),
            failures,
        }
    }
}
