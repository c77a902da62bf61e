//! Docket: run the examples in C/C++ doc comments as tests.
//!
//! A comment block like
//!
//! ```text
//! /// >>> add(1, 2)
//! /// 3
//! int add(int a, int b);
//! ```
//!
//! becomes a test: its code is compiled and run, and its output compared
//! against the lines that follow. The pipeline is
//! [`scan`] (declarations and examples) → [`suite`] (tests and the tree) →
//! [`engine`] (execution) → [`coverage`] (aggregation and thresholds),
//! tied together by a [`Session`].

pub mod config;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod models;
pub mod project;
pub mod scan;
pub mod session;
pub mod suite;

pub use config::Config;
pub use coverage::{CoverageAggregator, CoverageSummary, FileCoverage, Thresholds};
pub use engine::{
    CommandBackend, Engine, ExecutionBackend, RunMode, RunOptions, RunReport, RunSummary,
    TestFilter,
};
pub use error::SessionError;
pub use models::{Declaration, DeclarationKind, Example, SourceLocation};
pub use project::BuildProject;
pub use scan::{scan_source, DeclarationProvider, HeuristicScanner, ScanResult};
pub use session::{Session, Verification};
pub use suite::{Test, TestCase, TestResult, TestStatus, TestTree};
