//! JSON run summary.

use serde::Serialize;

use super::RunSummary;
use crate::coverage::CoverageSummary;
use crate::suite::TestStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Milliseconds.
    pub duration: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub id: String,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// `{summary, tests, coverage?}` as written by `docket run --json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: SummaryReport,
    pub tests: Vec<TestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageSummary>,
}

impl RunReport {
    pub fn new(summary: &RunSummary, coverage: Option<CoverageSummary>) -> Self {
        let tests = summary
            .results
            .iter()
            .map(|(id, result)| TestReport {
                id: id.clone(),
                status: result.status,
                output: result.output.clone(),
                error: result.error.clone(),
                duration: result.duration.map(|d| d.as_millis() as u64),
            })
            .collect();

        Self {
            summary: SummaryReport {
                total_tests: summary.total_tests,
                passed: summary.passed,
                failed: summary.failed,
                skipped: summary.skipped,
                errors: summary.errors,
                duration: summary.duration.as_millis() as u64,
            },
            tests,
            coverage,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
