//! Ordered collection of tests from one source unit.

use futures::future::join_all;

use super::{ResultMap, Test, TestError, TestStatus};
use crate::engine::ExecutionBackend;

/// The tests of one source unit, in example order. Owns its tests.
#[derive(Debug, Clone, Default)]
pub struct TestCase {
    /// Path of the source unit.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    tests: Vec<Test>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tests: Vec::new(),
        }
    }

    /// Case for a source unit, named after its file name.
    pub fn for_file(path: &str) -> Self {
        let base = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);
        Self::new(path, format!("Tests for {}", base))
    }

    pub fn add_test(&mut self, test: Test) {
        self.tests.push(test);
    }

    /// Remove by id. Returns the removed test, if it was present.
    pub fn remove_test(&mut self, id: &str) -> Option<Test> {
        let index = self.tests.iter().position(|t| t.id == id)?;
        Some(self.tests.remove(index))
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn tests_mut(&mut self) -> &mut [Test] {
        &mut self.tests
    }

    pub fn get(&self, index: usize) -> Option<&Test> {
        self.tests.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Test> {
        self.tests.get_mut(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tests.iter().position(|t| t.id == id)
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn count(&self, status: TestStatus) -> usize {
        self.tests.iter().filter(|t| t.status() == status).count()
    }

    pub fn passed_count(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    pub fn failed_count(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    /// Run every test in order, awaiting each before the next.
    pub async fn run(&mut self, backend: &dyn ExecutionBackend) -> Result<ResultMap, TestError> {
        let mut results = ResultMap::new();
        for test in &mut self.tests {
            let result = test.run(backend).await?;
            results.insert(test.id.clone(), result);
        }
        Ok(results)
    }

    /// Start every test, then await them together.
    pub async fn run_parallel(
        &mut self,
        backend: &dyn ExecutionBackend,
    ) -> Result<ResultMap, TestError> {
        let runs = self.tests.iter_mut().map(|test| async move {
            let result = test.run(backend).await?;
            Ok::<_, TestError>((test.id.clone(), result))
        });

        join_all(runs).await.into_iter().collect()
    }

    pub fn reset(&mut self) {
        self.tests.iter_mut().for_each(Test::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BackendError, ExecutionRequest};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ExecutionBackend for Echo {
        async fn execute(&self, request: &ExecutionRequest) -> Result<String, BackendError> {
            Ok(request.code.clone())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn sample() -> TestCase {
        let mut case = TestCase::new("a.cpp", "a");
        case.add_test(Test::new("a.cpp:1:0", "one", "1").with_expected_output("1"));
        case.add_test(Test::new("a.cpp:2:1", "two", "2").with_expected_output("3"));
        case
    }

    #[test]
    fn test_for_file_name() {
        let case = TestCase::for_file("src/util/math.cpp");
        assert_eq!(case.id, "src/util/math.cpp");
        assert_eq!(case.name, "Tests for math.cpp");
    }

    #[test]
    fn test_add_remove() {
        let mut case = TestCase::new("a.cpp", "a");
        case.add_test(Test::new("a.cpp:1:0", "one", "1"));
        case.add_test(Test::new("a.cpp:2:1", "two", "2"));
        assert_eq!(case.test_count(), 2);

        let removed = case.remove_test("a.cpp:1:0").unwrap();
        assert_eq!(removed.name, "one");
        assert!(case.remove_test("a.cpp:1:0").is_none());
        assert_eq!(case.position("a.cpp:2:1"), Some(0));
        assert_eq!(case.count(TestStatus::Pending), 1);
    }

    #[tokio::test]
    async fn test_run_merges_results() {
        let mut case = sample();
        let results = case.run(&Echo).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results["a.cpp:1:0"].status, TestStatus::Passed);
        assert_eq!(results["a.cpp:2:1"].status, TestStatus::Failed);
        assert_eq!(case.passed_count(), 1);
        assert_eq!(case.failed_count(), 1);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let mut sequential = sample();
        let mut parallel = sample();
        let a = sequential.run(&Echo).await.unwrap();
        let b = parallel.run_parallel(&Echo).await.unwrap();

        let statuses = |m: &ResultMap| {
            m.iter()
                .map(|(k, r)| (k.clone(), r.status))
                .collect::<Vec<_>>()
        };
        assert_eq!(statuses(&a), statuses(&b));

        parallel.reset();
        assert_eq!(parallel.count(TestStatus::Pending), 2);
    }
}
