use docket_core::suite::{NodeKind, Test, TestCase, TestTree, TreeError, ROOT_NAME};

fn case(path: &str, n: usize) -> TestCase {
    let mut case = TestCase::for_file(path);
    for i in 0..n {
        case.add_test(Test::new(
            format!("{}:{}:{}", path, i + 1, i),
            format!("DocTest {}", i + 1),
            "0",
        ));
    }
    case
}

/// Group for `path` with one leaf per test followed by the suite.
fn attach_file(tree: &mut TestTree, path: &str, n: usize) -> docket_core::suite::NodeId {
    let group = tree.create_group(path, path);
    let case = case(path, n);
    let ids: Vec<String> = case.tests().iter().map(|t| t.id.clone()).collect();
    let suite = tree.create_suite(format!("Test Suite: {}", path), case);
    for id in ids {
        let leaf = tree.create_leaf(suite, &id).unwrap();
        tree.add_child(group, leaf).unwrap();
    }
    tree.add_child(group, suite).unwrap();
    let root = tree.root();
    tree.add_child(root, group).unwrap();
    group
}

#[test]
fn test_leaves_in_preorder() {
    let mut tree = TestTree::new();
    attach_file(&mut tree, "a.cpp", 2);
    attach_file(&mut tree, "b.cpp", 1);

    let ids: Vec<String> = tree
        .leaves(tree.root())
        .into_iter()
        .filter_map(|leaf| tree.leaf_test(leaf).map(|t| t.id.clone()))
        .collect();
    assert_eq!(ids, vec!["a.cpp:1:0", "a.cpp:2:1", "b.cpp:1:0"]);
    assert_eq!(tree.test_count(), 3);
    assert_eq!(tree.tests().len(), 3);
}

#[test]
fn test_node_has_single_parent() {
    let mut tree = TestTree::new();
    let a = attach_file(&mut tree, "a.cpp", 1);
    let other = tree.create_group("other", "other");
    let root = tree.root();
    tree.add_child(root, other).unwrap();

    assert_eq!(tree.add_child(other, a), Err(TreeError::AlreadyAttached(a)));

    tree.remove_child(root, a).unwrap();
    assert_eq!(tree.test_count(), 0);
    assert!(tree.node(a).unwrap().parent().is_none());

    tree.add_child(other, a).unwrap();
    assert_eq!(tree.node(a).unwrap().parent(), Some(other));
    assert_eq!(tree.test_count(), 1);
    assert_eq!(tree.path(a), vec![ROOT_NAME, "other", "a.cpp"]);
}

#[test]
fn test_remove_requires_child() {
    let mut tree = TestTree::new();
    let a = attach_file(&mut tree, "a.cpp", 1);
    let b = attach_file(&mut tree, "b.cpp", 1);
    assert_eq!(
        tree.remove_child(a, b),
        Err(TreeError::NotAChild { parent: a, child: b })
    );
}

#[test]
fn test_duplicate_ids_rejected() {
    let mut tree = TestTree::new();
    attach_file(&mut tree, "a.cpp", 1);

    let group = tree.create_group("dup", "dup");
    let suite = tree.create_suite("dup", case("a.cpp", 1));
    tree.add_child(group, suite).unwrap();
    let root = tree.root();
    assert_eq!(
        tree.add_child(root, group),
        Err(TreeError::DuplicateTest("a.cpp:1:0".to_string()))
    );
    assert!(tree.node(group).unwrap().parent().is_none());
}

#[test]
fn test_suite_node_owns_case() {
    let mut tree = TestTree::new();
    let a = attach_file(&mut tree, "a.cpp", 2);
    let suite = *tree.node(a).unwrap().children().last().unwrap();
    match &tree.node(suite).unwrap().kind {
        NodeKind::Suite(case) => assert_eq!(case.test_count(), 2),
        other => panic!("expected a suite, got {:?}", other),
    }
    assert_eq!(tree.node(suite).unwrap().key, "suite-a.cpp");

    tree.test_mut("a.cpp:2:1").unwrap().skip().unwrap();
    assert_eq!(tree.suite_mut(suite).unwrap().count(docket_core::TestStatus::Skipped), 1);
    tree.reset();
    assert_eq!(tree.suite_mut(suite).unwrap().count(docket_core::TestStatus::Skipped), 0);
}

#[test]
fn test_clear() {
    let mut tree = TestTree::new();
    attach_file(&mut tree, "a.cpp", 2);
    tree.clear();
    assert_eq!(tree.test_count(), 0);
    assert!(tree.node(tree.root()).unwrap().children().is_empty());
}
