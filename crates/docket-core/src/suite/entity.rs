//! A single runnable example and its state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::DEFAULT_TEST_TIMEOUT_MS;
use crate::engine::{execute_with_deadline, BackendError, ExecutionBackend, ExecutionRequest};
use crate::models::{Declaration, Example};

/// Lifecycle state of a [`Test`].
///
/// `Pending -> Running -> {Passed, Failed, Error}` and `Pending -> Skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Pending,
    Running,
    Passed,
    Failed,
    Error,
    Skipped,
}

impl TestStatus {
    /// No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TestStatus::Passed | TestStatus::Failed | TestStatus::Error | TestStatus::Skipped
        )
    }

    /// One-character marker for listings.
    pub fn symbol(self) -> &'static str {
        match self {
            TestStatus::Pending => "·",
            TestStatus::Running => "…",
            TestStatus::Passed => "✓",
            TestStatus::Failed => "✗",
            TestStatus::Error => "!",
            TestStatus::Skipped => "-",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestStatus::Pending => "pending",
            TestStatus::Running => "running",
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Error => "error",
            TestStatus::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Outcome of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub status: TestStatus,
    pub output: Option<String>,
    /// Mismatch diagnostic or backend message.
    pub error: Option<String>,
    /// Wall-clock time spent running; absent for skipped tests.
    pub duration: Option<Duration>,
}

impl TestResult {
    pub fn skipped() -> Self {
        Self {
            status: TestStatus::Skipped,
            output: None,
            error: None,
            duration: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TestError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: TestStatus, to: TestStatus },
}

/// One example wrapped as a runnable unit.
#[derive(Debug, Clone)]
pub struct Test {
    /// `<file>:<line>:<index>`
    pub id: String,
    pub name: String,
    pub code: String,
    pub expected_output: Option<String>,
    pub description: String,
    pub timeout: Duration,
    pub source_file: String,
    /// Name of the declaration the example documents.
    pub declaration: Option<String>,
    status: TestStatus,
    result: Option<TestResult>,
}

impl Test {
    pub fn new(id: impl Into<String>, name: impl Into<String>, code: impl Into<String>) -> Self {
        let id = id.into();
        let source_file = file_of_id(&id).to_string();
        Self {
            id,
            name: name.into(),
            code: code.into(),
            expected_output: None,
            description: String::new(),
            timeout: Duration::from_millis(DEFAULT_TEST_TIMEOUT_MS),
            source_file,
            declaration: None,
            status: TestStatus::Pending,
            result: None,
        }
    }

    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the test for the `index`-th example of a source unit.
    pub fn from_example(
        example: &Example,
        parent: Option<&Declaration>,
        index: usize,
        timeout: Duration,
    ) -> Self {
        let file = &example.location.file;
        let line = example.line();
        let name = match parent {
            Some(decl) => format!("{} - Test {}", decl.name, index + 1),
            None => format!("DocTest {}", index + 1),
        };

        let mut test = Test::new(format!("{}:{}:{}", file, line, index), name, &example.code)
            .with_description(format!("Test at {}:{}", file, line))
            .with_timeout(timeout);
        test.expected_output = example.expected_output.clone();
        test.declaration = parent.map(|d| d.name.clone());
        test
    }

    pub fn status(&self) -> TestStatus {
        self.status
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    /// `Pending -> Running`.
    pub fn start(&mut self) -> Result<(), TestError> {
        self.transition(TestStatus::Pending, TestStatus::Running)
    }

    /// `Pending -> Skipped`.
    pub fn skip(&mut self) -> Result<TestResult, TestError> {
        self.transition(TestStatus::Pending, TestStatus::Skipped)?;
        let result = TestResult::skipped();
        self.result = Some(result.clone());
        Ok(result)
    }

    /// `Running -> {Passed, Failed, Error}` from a backend outcome.
    pub fn finish(
        &mut self,
        outcome: Result<String, BackendError>,
        duration: Duration,
    ) -> Result<TestResult, TestError> {
        let result = match outcome {
            Ok(output) => match &self.expected_output {
                Some(expected) if *expected != output => TestResult {
                    status: TestStatus::Failed,
                    error: Some(format!("Expected: {}, Got: {}", expected, output)),
                    output: Some(output),
                    duration: Some(duration),
                },
                _ => TestResult {
                    status: TestStatus::Passed,
                    output: Some(output),
                    error: None,
                    duration: Some(duration),
                },
            },
            Err(e) => TestResult {
                status: TestStatus::Error,
                output: None,
                error: Some(e.to_string()),
                duration: Some(duration),
            },
        };

        self.transition(TestStatus::Running, result.status)?;
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Back to `Pending` with no result, ready for another run.
    pub fn reset(&mut self) {
        self.status = TestStatus::Pending;
        self.result = None;
    }

    pub fn request(&self) -> ExecutionRequest {
        ExecutionRequest {
            test_id: self.id.clone(),
            code: self.code.clone(),
            source_file: self.source_file.clone(),
            timeout: self.timeout,
        }
    }

    /// Execute through `backend`. Backend failures become an `Error` result.
    pub async fn run(&mut self, backend: &dyn ExecutionBackend) -> Result<TestResult, TestError> {
        self.start()?;
        let request = self.request();
        let started = Instant::now();
        let outcome = execute_with_deadline(backend, &request).await;
        if let Err(e) = &outcome {
            tracing::debug!(test = %self.id, backend = backend.name(), error = %e, "backend failure");
        }
        let result = self.finish(outcome, started.elapsed())?;
        tracing::debug!(test = %self.id, status = %result.status, "test finished");
        Ok(result)
    }

    fn transition(&mut self, from: TestStatus, to: TestStatus) -> Result<(), TestError> {
        if self.status != from {
            return Err(TestError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// File portion of a `<file>:<line>:<index>` id.
///
/// Split from the right so paths containing `:` survive.
pub fn file_of_id(id: &str) -> &str {
    let mut parts = id.rsplitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), Some(file)) => file,
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeclarationKind, SourceLocation};

    fn example(code: &str, expected: Option<&str>) -> Example {
        Example {
            code: code.to_string(),
            expected_output: expected.map(str::to_string),
            location: SourceLocation::new("src/math.cpp", 12, 5),
            parent: None,
        }
    }

    #[test]
    fn test_from_example_naming() {
        let decl = Declaration::new(
            "add",
            DeclarationKind::Function,
            SourceLocation::new("src/math.cpp", 10, 5),
        );
        let test = Test::from_example(
            &example("add(1, 2)", Some("3")),
            Some(&decl),
            0,
            Duration::from_secs(10),
        );
        assert_eq!(test.id, "src/math.cpp:12:0");
        assert_eq!(test.name, "add - Test 1");
        assert_eq!(test.description, "Test at src/math.cpp:12");
        assert_eq!(test.declaration.as_deref(), Some("add"));
        assert_eq!(test.source_file, "src/math.cpp");

        let bare = Test::from_example(&example("1", None), None, 2, Duration::from_secs(10));
        assert_eq!(bare.name, "DocTest 3");
    }

    #[test]
    fn test_default_timeout() {
        let test = Test::new("a.cpp:1:0", "t", "1");
        assert_eq!(test.timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn test_pass_without_expected() {
        let mut test = Test::new("a.cpp:1:0", "t", "f()");
        test.start().unwrap();
        let result = test.finish(Ok("anything".into()), Duration::from_millis(3)).unwrap();
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(test.status(), TestStatus::Passed);
    }

    #[test]
    fn test_mismatch_fails() {
        let mut test = Test::new("a.cpp:1:0", "t", "add(2, 2)").with_expected_output("5");
        test.start().unwrap();
        let result = test.finish(Ok("4".into()), Duration::from_millis(1)).unwrap();
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("Expected: 5, Got: 4"));
        assert!(result.duration.is_some());
    }

    #[test]
    fn test_backend_error() {
        let mut test = Test::new("a.cpp:1:0", "t", "x");
        test.start().unwrap();
        let result = test
            .finish(Err(BackendError::Compile("bad".into())), Duration::ZERO)
            .unwrap();
        assert_eq!(result.status, TestStatus::Error);
        assert_eq!(result.error.as_deref(), Some("Compilation failed: bad"));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut test = Test::new("a.cpp:1:0", "t", "x");
        assert_eq!(
            test.finish(Ok(String::new()), Duration::ZERO),
            Err(TestError::InvalidTransition {
                from: TestStatus::Pending,
                to: TestStatus::Passed
            })
        );

        test.skip().unwrap();
        assert!(test.status().is_terminal());
        assert!(test.start().is_err());

        test.reset();
        assert_eq!(test.status(), TestStatus::Pending);
        assert!(test.result().is_none());
    }

    #[test]
    fn test_file_of_id() {
        assert_eq!(file_of_id("src/a.cpp:10:0"), "src/a.cpp");
        assert_eq!(file_of_id("C:/x/a.cpp:3:1"), "C:/x/a.cpp");
        assert_eq!(file_of_id("plain"), "plain");
    }
}
