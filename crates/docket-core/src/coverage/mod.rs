//! Coverage aggregation and threshold checks.
//!
//! The aggregator keeps one [`FileCoverage`] per source path and recomputes
//! its [`CoverageSummary`] after every mutation, so reads never see a stale
//! total. Threshold checks return data; they never fail.

mod lcov;
mod model;

pub use lcov::{parse_lcov, write_lcov};
pub use model::{
    percentage, BranchCoverage, BranchId, CoverageMetric, CoverageSummary, FileCoverage,
    FunctionCoverage, Metric, ThresholdReport, Thresholds,
};

use serde_json::json;
use std::collections::BTreeMap;

/// Per-file coverage plus the running summary.
#[derive(Debug, Clone, Default)]
pub struct CoverageAggregator {
    files: BTreeMap<String, FileCoverage>,
    summary: CoverageSummary,
    thresholds: Thresholds,
}

impl CoverageAggregator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            ..Default::default()
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    /// Store coverage for `path`, replacing whatever was there.
    pub fn add_file_coverage(&mut self, path: impl Into<String>, coverage: FileCoverage) {
        self.files.insert(path.into(), coverage);
        self.update_summary();
    }

    /// Fold coverage for `path` into the existing record, if any.
    pub fn merge_file_coverage(&mut self, path: impl Into<String>, coverage: &FileCoverage) {
        let path = path.into();
        self.files
            .entry(path.clone())
            .or_insert_with(|| FileCoverage::new(path))
            .merge(coverage);
        self.update_summary();
    }

    /// Read an LCOV tracefile; each file it names replaces the stored record.
    pub fn ingest_lcov(&mut self, content: &str) {
        let parsed = parse_lcov(content);
        tracing::debug!(files = parsed.len(), "ingested lcov data");
        self.files.extend(parsed);
        self.update_summary();
    }

    pub fn file_coverage(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileCoverage> {
        self.files.values()
    }

    pub fn summary(&self) -> &CoverageSummary {
        &self.summary
    }

    /// Compare the summary against the configured thresholds.
    pub fn check_thresholds(&self) -> ThresholdReport {
        let report = ThresholdReport::evaluate(&self.summary, &self.thresholds);
        for failure in &report.failures {
            tracing::warn!("{}", failure);
        }
        report
    }

    /// Drop every record. Thresholds are kept.
    pub fn reset(&mut self) {
        self.files.clear();
        self.summary = CoverageSummary::default();
    }

    pub fn to_lcov(&self) -> String {
        write_lcov(self.files.values())
    }

    /// Summary plus per-file entries as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let files: Vec<serde_json::Value> = self
            .files
            .iter()
            .map(|(path, file)| {
                let branches: Vec<serde_json::Value> = file
                    .branches
                    .iter()
                    .map(|(id, b)| json!({ "id": id.to_string(), "taken": b.taken, "total": b.total }))
                    .collect();
                json!({
                    "path": path,
                    "lines": file.lines,
                    "branches": branches,
                    "functions": file.functions,
                })
            })
            .collect();

        json!({
            "summary": self.summary,
            "files": files,
        })
    }

    fn update_summary(&mut self) {
        let (mut lines, mut covered_lines) = (0, 0);
        let (mut branches, mut covered_branches) = (0, 0);
        let (mut functions, mut covered_functions) = (0, 0);

        for file in self.files.values() {
            lines += file.lines.len();
            covered_lines += file.covered_lines();
            branches += file.branches.len();
            covered_branches += file.covered_branches();
            functions += file.functions.len();
            covered_functions += file.covered_functions();
        }

        let line_metric = CoverageMetric::new(lines, covered_lines);
        self.summary = CoverageSummary {
            lines: line_metric,
            branches: CoverageMetric::new(branches, covered_branches),
            functions: CoverageMetric::new(functions, covered_functions),
            statements: line_metric,
        };
    }
}
