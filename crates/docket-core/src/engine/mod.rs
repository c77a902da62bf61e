//! Test execution over a [`TestTree`].
//!
//! ## Modes
//!
//! - **Sequential** - leaves in depth-first pre-order, each awaited before
//!   the next starts
//! - **Parallel** - every selected leaf is started, then all are joined
//!
//! In both modes a leaf rejected by the [`TestFilter`] is marked skipped
//! without reaching the backend, and the result map holds exactly one entry
//! per reachable leaf test.

mod backend;
mod command;
mod export;
mod filter;

pub use backend::{execute_with_deadline, BackendError, ExecutionBackend, ExecutionRequest};
pub use command::{render_program, CommandBackend};
pub use export::{RunReport, SummaryReport, TestReport};
pub use filter::{FilterError, TestFilter};

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::suite::{NodeId, NodeKind, ResultMap, TestError, TestResult, TestStatus, TestTree};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: RunMode,
    pub filter: TestFilter,
}

impl RunOptions {
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.mode = if parallel {
            RunMode::Parallel
        } else {
            RunMode::Sequential
        };
        self
    }

    pub fn with_filter(mut self, filter: TestFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Totals of a whole-tree run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub duration: Duration,
    pub results: ResultMap,
}

impl RunSummary {
    pub fn from_results(results: ResultMap, duration: Duration) -> Self {
        let count = |status| results.values().filter(|r| r.status == status).count();
        Self {
            total_tests: results.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Skipped),
            errors: count(TestStatus::Error),
            duration,
            results,
        }
    }

    /// No failures and no errors.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Result of running a single node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeResult {
    /// A leaf's test result.
    Test(TestResult),
    /// Merged results of a suite or a group.
    Many(ResultMap),
    /// A group with no children.
    Empty,
}

/// Drives tests through an [`ExecutionBackend`].
#[derive(Clone)]
pub struct Engine {
    backend: Arc<dyn ExecutionBackend>,
}

impl Engine {
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn ExecutionBackend {
        self.backend.as_ref()
    }

    /// Run every leaf reachable from the root.
    ///
    /// Tests are reset to pending first, so a tree can be run repeatedly.
    pub async fn run(
        &self,
        tree: &mut TestTree,
        options: &RunOptions,
    ) -> Result<RunSummary, TestError> {
        let started = Instant::now();
        let targets = unique_targets(tree, tree.root());
        for (suite, id) in &targets {
            if let Some(test) = tree.test_at_mut(*suite, id) {
                test.reset();
            }
        }

        let mut results = ResultMap::new();
        let mut selected = Vec::new();

        // Filtered-out tests are settled up front in both modes.
        for target in &targets {
            let Some(test) = tree.test_at_mut(target.0, &target.1) else {
                continue;
            };
            if options.filter.matches(test) {
                selected.push(target.clone());
            } else {
                let result = test.skip()?;
                tracing::debug!(test = %test.id, "skipped by filter");
                results.insert(test.id.clone(), result);
            }
        }

        match options.mode {
            RunMode::Sequential => {
                for (suite, id) in &selected {
                    let Some(test) = tree.test_at_mut(*suite, id) else {
                        continue;
                    };
                    let result = test.run(self.backend()).await?;
                    results.insert(test.id.clone(), result);
                }
            }
            RunMode::Parallel => {
                let wanted: HashSet<_> = selected.into_iter().collect();
                let backend = self.backend();
                let runs = tree.tests_mut_at(&wanted).into_iter().map(|test| async move {
                    let result = test.run(backend).await?;
                    Ok::<_, TestError>((test.id.clone(), result))
                });
                for outcome in join_all(runs).await {
                    let (id, result) = outcome?;
                    results.insert(id, result);
                }
            }
        }

        let summary = RunSummary::from_results(results, started.elapsed());
        tracing::info!(
            total = summary.total_tests,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            errors = summary.errors,
            duration_ms = summary.duration.as_millis() as u64,
            "run complete"
        );
        Ok(summary)
    }

    /// Run one node without filtering.
    ///
    /// A leaf runs its test, a suite runs its whole case in order, and a
    /// group runs the leaves below it. Suites met below a group are not run
    /// again, since their tests are already reached through the leaves.
    pub async fn run_node(&self, tree: &mut TestTree, node: NodeId) -> Result<NodeResult, TestError> {
        let Some(current) = tree.node(node) else {
            return Ok(NodeResult::Empty);
        };

        match &current.kind {
            NodeKind::Leaf { .. } => {
                let Some(test) = tree.leaf_test_mut(node) else {
                    return Ok(NodeResult::Empty);
                };
                test.reset();
                Ok(NodeResult::Test(test.run(self.backend()).await?))
            }
            NodeKind::Suite(_) => {
                let Some(case) = tree.suite_mut(node) else {
                    return Ok(NodeResult::Empty);
                };
                case.reset();
                Ok(NodeResult::Many(case.run(self.backend()).await?))
            }
            NodeKind::Group if current.children().is_empty() => Ok(NodeResult::Empty),
            NodeKind::Group => {
                let mut results = ResultMap::new();
                for (suite, id) in unique_targets(tree, node) {
                    let Some(test) = tree.test_at_mut(suite, &id) else {
                        continue;
                    };
                    test.reset();
                    let result = test.run(self.backend()).await?;
                    results.insert(test.id.clone(), result);
                }
                Ok(NodeResult::Many(results))
            }
        }
    }
}

/// Leaf targets under `start` in pre-order, each test once.
fn unique_targets(tree: &TestTree, start: NodeId) -> Vec<(NodeId, String)> {
    let mut seen = HashSet::new();
    tree.leaves(start)
        .into_iter()
        .filter_map(|leaf| tree.leaf_target(leaf))
        .filter(|target| seen.insert(target.clone()))
        .collect()
}
