mod common;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use common::{ScriptedBackend, MATH_CPP, UTIL_CPP};
use docket_core::coverage::Thresholds;
use docket_core::{Config, Session, SessionError, TestFilter, TestStatus};

fn sources() -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    files.insert("src/math.cpp".to_string(), MATH_CPP.to_string());
    files.insert("src/util.cpp".to_string(), UTIL_CPP.to_string());
    files
}

fn backend() -> ScriptedBackend {
    ScriptedBackend::new()
        .output("add(2, 3)", "5")
        .output("sub(5, 3)", "2")
        .output("sub(1, 1)", "0")
        .output("twice(4)", "8")
}

fn session_with(backend: ScriptedBackend) -> Session {
    Session::new(Config::default(), Arc::new(backend)).unwrap()
}

#[test]
fn test_load_builds_tests_and_tree() {
    let mut session = session_with(backend());
    let count = session.load_sources(&sources()).unwrap();
    assert_eq!(count, 4);
    assert_eq!(session.file_count(), 2);

    let test = session.test("src/math.cpp:8:1").unwrap();
    assert_eq!(test.name, "sub - Test 2");
    assert_eq!(test.description, "Test at src/math.cpp:8");
    assert_eq!(test.expected_output.as_deref(), Some("2"));
    assert_eq!(test.timeout.as_millis(), 10_000);

    let tree = session.tree();
    let root = tree.node(tree.root()).unwrap();
    assert_eq!(root.children().len(), 2);

    let math_group = root.children()[0];
    let children = tree.node(math_group).unwrap().children().to_vec();
    // Three leaves, then the suite.
    assert_eq!(children.len(), 4);
    assert_eq!(
        tree.path(children[3]),
        vec!["Test Root", "math.cpp", "Test Suite: math.cpp"]
    );
    assert_eq!(tree.path(children[0]), vec!["Test Root", "math.cpp", "add - Test 1"]);
}

#[test]
fn test_reload_clears_previous_state() {
    let mut session = session_with(backend());
    session.load_sources(&sources()).unwrap();

    let mut only_util = BTreeMap::new();
    only_util.insert("src/util.cpp".to_string(), UTIL_CPP.to_string());
    session.load_sources(&only_util).unwrap();

    assert_eq!(session.test_count(), 1);
    assert!(session.test("src/math.cpp:4:0").is_none());
    assert!(session.scan("src/math.cpp").is_none());
}

#[test]
fn test_filter_tests_by_pattern() {
    let mut session = session_with(backend());
    session.load_sources(&sources()).unwrap();

    let names: Vec<&str> = session
        .filter_tests("^sub")
        .unwrap()
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["sub - Test 2", "sub - Test 3"]);

    assert_eq!(session.filter_tests("util.cpp:4").unwrap().len(), 1);
    assert!(matches!(
        session.filter_tests("["),
        Err(SessionError::Filter(_))
    ));
}

#[tokio::test]
async fn test_run_updates_function_coverage() {
    let mut session = session_with(backend());
    session.load_sources(&sources()).unwrap();

    let summary = session.run(TestFilter::new()).await.unwrap();
    assert_eq!(summary.passed, 4);

    let math = session.coverage().file_coverage("src/math.cpp").unwrap();
    assert_eq!(math.functions["add"].hits, 1);
    assert_eq!(math.functions["sub"].hits, 2);
    assert!(!math.functions["mul"].executed);
    assert_eq!(math.functions["mul"].line, 13);

    let functions = session.coverage().summary().functions;
    assert_eq!(functions.total, 4);
    assert_eq!(functions.covered, 3);
    assert_eq!(functions.percentage, 75.0);

    // A second run recomputes rather than accumulates.
    session.run(TestFilter::new()).await.unwrap();
    let math = session.coverage().file_coverage("src/math.cpp").unwrap();
    assert_eq!(math.functions["sub"].hits, 2);
}

#[tokio::test]
async fn test_failed_tests_do_not_count_as_coverage() {
    let mut session = session_with(backend().output("twice(4)", "9"));
    session.load_sources(&sources()).unwrap();

    let summary = session.run(TestFilter::new()).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(
        session.test("src/util.cpp:4:0").unwrap().status(),
        TestStatus::Failed
    );

    let util = session.coverage().file_coverage("src/util.cpp").unwrap();
    assert_eq!(util.functions["twice"].hits, 0);
}

#[tokio::test]
async fn test_run_verify_checks_thresholds() {
    let mut config = Config::default();
    config.coverage.thresholds = Thresholds {
        lines: Some(0.0),
        branches: Some(0.0),
        statements: Some(0.0),
        functions: Some(80.0),
    };
    let mut session = Session::new(config, Arc::new(backend())).unwrap();
    session.load_sources(&sources()).unwrap();

    let verification = session.run_verify().await.unwrap();
    assert!(verification.summary.is_success());
    assert!(!verification.thresholds.passed);
    assert_eq!(
        verification.thresholds.failures,
        vec!["Function coverage 75% is below threshold 80%"]
    );
    assert!(!verification.passed());

    session.coverage_mut().set_thresholds(Thresholds::uniform(0.0));
    let verification = session.run_verify().await.unwrap();
    assert!(verification.passed());
}

#[tokio::test]
async fn test_reset_returns_tests_to_pending() {
    let mut session = session_with(backend());
    session.load_sources(&sources()).unwrap();
    session.run(TestFilter::new()).await.unwrap();

    session.reset();
    assert!(session
        .tests()
        .iter()
        .all(|t| t.status() == TestStatus::Pending && t.result().is_none()));
    assert_eq!(session.coverage().summary().functions.total, 0);
    assert_eq!(session.test_count(), 4);
}

#[test]
fn test_load_missing_file_fails_fast() {
    let mut session = session_with(backend());
    session.load_sources(&sources()).unwrap();

    let missing = [PathBuf::from("does/not/exist.cpp")];
    let err = session.load(Some(&missing)).unwrap_err();
    assert!(matches!(err, SessionError::NotFound(p) if p == PathBuf::from("does/not/exist.cpp")));
    // The previous load survives.
    assert_eq!(session.test_count(), 4);
}

#[test]
fn test_discover_and_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::create_dir_all(dir.path().join("build")).unwrap();
    std::fs::write(src.join("math.cpp"), MATH_CPP).unwrap();
    std::fs::write(src.join("util.hpp"), UTIL_CPP).unwrap();
    std::fs::write(src.join("notes.txt"), "/// >>> nope").unwrap();
    std::fs::write(dir.path().join("build").join("gen.cpp"), MATH_CPP).unwrap();

    let mut config = Config::default();
    config.source.dir = dir.path().to_string_lossy().into_owned();
    let mut session = Session::new(config, Arc::new(backend())).unwrap();

    let found = session.discover_sources().unwrap();
    let names: Vec<String> = found
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names, vec!["math.cpp", "util.hpp"]);

    assert_eq!(session.load(None).unwrap(), 4);
}

#[test]
fn test_invalid_exclude_pattern() {
    let mut config = Config::default();
    config.source.exclude_patterns = vec!["(".to_string()];
    let err = Session::new(config, Arc::new(backend())).err().unwrap();
    assert!(matches!(err, SessionError::InvalidPattern { .. }));
}

#[test]
fn test_from_config_reads_project_from_build_dir() {
    let dir = tempfile::tempdir().unwrap();
    let build = dir.path().join("out");
    std::fs::create_dir_all(&build).unwrap();

    let mut config = Config::default();
    config.source.dir = dir.path().to_string_lossy().into_owned();
    config.source.build_dir = Some(build.to_string_lossy().into_owned());
    assert!(Session::from_config(config.clone()).is_ok());

    std::fs::write(build.join("docket-project.json"), "{ not json").unwrap();
    let err = Session::from_config(config.clone()).err().unwrap();
    assert!(matches!(err, SessionError::Project(_)));

    std::fs::write(
        build.join("docket-project.json"),
        r#"{"name": "calc", "configurations": []}"#,
    )
    .unwrap();
    assert!(Session::from_config(config).is_ok());
}

#[test]
fn test_explicit_project_file_wins_over_build_dir() {
    let dir = tempfile::tempdir().unwrap();
    let build = dir.path().join("build");
    std::fs::create_dir_all(&build).unwrap();
    std::fs::write(build.join("docket-project.json"), "{ not json").unwrap();
    let explicit = dir.path().join("project.yaml");
    std::fs::write(&explicit, "name: calc\n").unwrap();

    let mut config = Config::default();
    config.source.dir = dir.path().to_string_lossy().into_owned();
    config.backend.project_file = Some(explicit.to_string_lossy().into_owned());
    assert!(Session::from_config(config).is_ok());
}
