//! One load-run cycle over a set of source units.
//!
//! A [`Session`] owns everything a load produces: the scans, the test tree
//! and the coverage aggregator. Loading again clears all of it first.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::coverage::{CoverageAggregator, FileCoverage, FunctionCoverage, ThresholdReport};
use crate::engine::{CommandBackend, Engine, ExecutionBackend, RunOptions, RunSummary, TestFilter};
use crate::error::SessionError;
use crate::project::BuildProject;
use crate::scan::{scan_source, DeclarationProvider, HeuristicScanner, ScanResult};
use crate::suite::{Test, TestCase, TestStatus, TestTree};

/// Outcome of [`Session::run_verify`].
#[derive(Debug, Clone)]
pub struct Verification {
    pub summary: RunSummary,
    pub thresholds: ThresholdReport,
}

impl Verification {
    /// No failed tests, no errors, every threshold met.
    pub fn passed(&self) -> bool {
        self.summary.is_success() && self.thresholds.passed
    }
}

pub struct Session {
    config: Config,
    provider: Box<dyn DeclarationProvider>,
    engine: Engine,
    exclude: Vec<Regex>,
    scans: BTreeMap<String, ScanResult>,
    tree: TestTree,
    coverage: CoverageAggregator,
}

impl Session {
    /// Session running tests through `backend`.
    pub fn new(config: Config, backend: Arc<dyn ExecutionBackend>) -> Result<Self, SessionError> {
        let exclude = config
            .source
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| SessionError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let coverage = CoverageAggregator::new(config.coverage.thresholds);

        Ok(Self {
            config,
            provider: Box::new(HeuristicScanner::new()),
            engine: Engine::new(backend),
            exclude,
            scans: BTreeMap::new(),
            tree: TestTree::new(),
            coverage,
        })
    }

    /// Session using the compiler backend described by `config`.
    ///
    /// The build project comes from `backend.project_file` when set, else
    /// from a description file found in the build directory, if any.
    pub fn from_config(config: Config) -> Result<Self, SessionError> {
        let mut backend = CommandBackend::from_config(&config.backend);

        let project_file = match &config.backend.project_file {
            Some(file) => Some(PathBuf::from(file)),
            None => BuildProject::find_in(config.source.build_dir_or_default()),
        };
        if let Some(file) = project_file {
            tracing::debug!(path = %file.display(), "using build project");
            backend = backend.with_project(BuildProject::from_file(&file)?);
        }

        Self::new(config, Arc::new(backend))
    }

    pub fn with_provider(mut self, provider: Box<dyn DeclarationProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &TestTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TestTree {
        &mut self.tree
    }

    pub fn scans(&self) -> &BTreeMap<String, ScanResult> {
        &self.scans
    }

    pub fn scan(&self, path: &str) -> Option<&ScanResult> {
        self.scans.get(path)
    }

    pub fn coverage(&self) -> &CoverageAggregator {
        &self.coverage
    }

    pub fn coverage_mut(&mut self) -> &mut CoverageAggregator {
        &mut self.coverage
    }

    pub fn file_count(&self) -> usize {
        self.scans.len()
    }

    pub fn test_count(&self) -> usize {
        self.tree.test_count()
    }

    pub fn declaration_count(&self) -> usize {
        self.scans.values().map(|s| s.declarations.len()).sum()
    }

    pub fn test(&self, id: &str) -> Option<&Test> {
        self.tree.test(id)
    }

    pub fn tests(&self) -> Vec<&Test> {
        self.tree.tests()
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(path))
    }

    /// Source files under `source.dir` with a configured extension.
    ///
    /// Honors `.gitignore` and skips hidden entries.
    pub fn discover_sources(&self) -> Result<Vec<PathBuf>, SessionError> {
        let root = Path::new(&self.config.source.dir);
        if !root.exists() {
            return Err(SessionError::NotFound(root.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in ignore::WalkBuilder::new(root).build() {
            let entry = entry?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let has_extension = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| self.config.source.extensions.iter().any(|e| e == ext));
            if !has_extension {
                continue;
            }

            let normalized = normalize(path);
            if self.is_excluded(&normalized) {
                continue;
            }
            files.push(PathBuf::from(normalized));
        }

        files.sort();
        Ok(files)
    }

    /// Scan `files` (or discovered sources) and rebuild the test tree.
    ///
    /// Every file is read before anything is replaced, so a missing file
    /// leaves the previous state untouched. Returns the number of tests.
    pub fn load(&mut self, files: Option<&[PathBuf]>) -> Result<usize, SessionError> {
        let files = match files {
            Some(files) => files.to_vec(),
            None => self.discover_sources()?,
        };

        let mut sources = BTreeMap::new();
        for file in files {
            let key = normalize(&file);
            if self.is_excluded(&key) {
                tracing::debug!(file = %key, "excluded");
                continue;
            }
            if !file.exists() {
                return Err(SessionError::NotFound(file));
            }
            let content = std::fs::read_to_string(&file).map_err(|source| SessionError::Io {
                path: file.clone(),
                source,
            })?;
            sources.insert(key, content);
        }

        self.load_sources(&sources)
    }

    /// Load in-memory sources keyed by path.
    pub fn load_sources(&mut self, sources: &BTreeMap<String, String>) -> Result<usize, SessionError> {
        self.scans.clear();
        self.tree.clear();
        self.coverage.reset();

        for (path, content) in sources {
            let scan = scan_source(path, content, self.provider.as_ref());
            self.add_to_tree(&scan)?;
            self.scans.insert(path.clone(), scan);
        }

        tracing::info!(
            files = self.scans.len(),
            declarations = self.declaration_count(),
            tests = self.test_count(),
            "loaded sources"
        );
        Ok(self.test_count())
    }

    /// One group per unit; a suite and one leaf per test when it has examples.
    fn add_to_tree(&mut self, scan: &ScanResult) -> Result<(), SessionError> {
        let path = &scan.source_file;
        let base = file_name(path);
        let group = self.tree.create_group(path.clone(), base.clone());

        if !scan.examples.is_empty() {
            let timeout = self.config.run.timeout();
            let mut case = TestCase::for_file(path);
            for (index, example) in scan.examples.iter().enumerate() {
                case.add_test(Test::from_example(
                    example,
                    scan.parent_of(example),
                    index,
                    timeout,
                ));
            }
            let ids: Vec<String> = case.tests().iter().map(|t| t.id.clone()).collect();

            let suite = self.tree.create_suite(format!("Test Suite: {}", base), case);
            for id in ids {
                let leaf = self.tree.create_leaf(suite, &id)?;
                self.tree.add_child(group, leaf)?;
            }
            self.tree.add_child(group, suite)?;
        }

        let root = self.tree.root();
        self.tree.add_child(root, group)?;
        Ok(())
    }

    /// Tests whose name, id or description matches `pattern`.
    pub fn filter_tests(&self, pattern: &str) -> Result<Vec<&Test>, SessionError> {
        let filter = TestFilter::new().with_pattern(pattern)?;
        Ok(self
            .tree
            .tests()
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect())
    }

    /// Run the loaded tests in the configured mode, then refresh coverage.
    pub async fn run(&mut self, filter: TestFilter) -> Result<RunSummary, SessionError> {
        let options = RunOptions::default()
            .parallel(self.config.run.parallel)
            .with_filter(filter);
        self.run_with(&options).await
    }

    pub async fn run_with(&mut self, options: &RunOptions) -> Result<RunSummary, SessionError> {
        let summary = self.engine.run(&mut self.tree, options).await?;
        if self.config.run.verbose {
            for (id, result) in &summary.results {
                tracing::info!(test = %id, status = %result.status, "{}", result.status.symbol());
            }
        }
        self.update_coverage()?;
        Ok(summary)
    }

    /// Run everything and check thresholds.
    pub async fn run_verify(&mut self) -> Result<Verification, SessionError> {
        let summary = self.run(TestFilter::new()).await?;
        let thresholds = self.coverage.check_thresholds();
        Ok(Verification {
            summary,
            thresholds,
        })
    }

    /// Refresh coverage from the configured LCOV file and the test results.
    ///
    /// Each callable declaration gets a function record whose hit count is
    /// the number of passed tests attached to it.
    pub fn update_coverage(&mut self) -> Result<(), SessionError> {
        if let Some(lcov) = &self.config.coverage.lcov {
            let path = Path::new(lcov);
            if path.exists() {
                let content = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                self.coverage.ingest_lcov(&content);
            } else {
                tracing::warn!(path = %lcov, "lcov file not found, skipping");
            }
        }

        let mut passed: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        for test in self.tree.tests() {
            if test.status() != TestStatus::Passed {
                continue;
            }
            if let Some(decl) = &test.declaration {
                *passed.entry((test.source_file.as_str(), decl.as_str())).or_default() += 1;
            }
        }

        let mut updates = Vec::new();
        for (path, scan) in &self.scans {
            let functions = scan.functions();
            if functions.is_empty() {
                continue;
            }
            let mut file = self
                .coverage
                .file_coverage(path)
                .cloned()
                .unwrap_or_else(|| FileCoverage::new(path.clone()));
            for decl in functions {
                let hits = passed
                    .get(&(path.as_str(), decl.name.as_str()))
                    .copied()
                    .unwrap_or_default();
                file.functions
                    .insert(decl.name.clone(), FunctionCoverage::with_hits(decl.line(), hits));
            }
            updates.push((path.clone(), file));
        }

        for (path, file) in updates {
            self.coverage.add_file_coverage(path, file);
        }
        Ok(())
    }

    /// Tests back to pending, coverage emptied. Scans and tree are kept.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.coverage.reset();
    }
}

fn normalize(path: &Path) -> String {
    let text = path.to_string_lossy();
    text.strip_prefix("./").unwrap_or(&text).to_string()
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}
