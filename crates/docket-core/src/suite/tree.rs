//! Arena-backed hierarchy of groups, suites and leaves.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. A suite node
//! owns its [`TestCase`]; a leaf node names one test of a suite by id. Links
//! change only through [`TestTree::add_child`] and [`TestTree::remove_child`],
//! which keep the tree acyclic and every node under at most one parent.

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::{Test, TestCase};

/// Name of the root group.
pub const ROOT_NAME: &str = "Test Root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node {0:?} already has a parent")]
    AlreadyAttached(NodeId),

    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Node {0:?} is not a group")]
    NotAGroup(NodeId),

    #[error("Node {0:?} is not a suite")]
    NotASuite(NodeId),

    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("Duplicate test id: {0}")]
    DuplicateTest(String),

    #[error("Unknown test: {0}")]
    UnknownTest(String),
}

/// What a node holds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Suite(TestCase),
    /// A test owned by the case of `suite`.
    Leaf { suite: NodeId, test_id: String },
}

#[derive(Debug, Clone)]
pub struct TestNode {
    pub id: NodeId,
    /// Stable string key: `root`, the file path, `suite-<path>` or a test id.
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TestNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    pub fn test_case(&self) -> Option<&TestCase> {
        match &self.kind {
            NodeKind::Suite(case) => Some(case),
            _ => None,
        }
    }
}

/// The test hierarchy of one session.
#[derive(Debug, Clone)]
pub struct TestTree {
    nodes: Vec<TestNode>,
    root: NodeId,
    /// Test id to the suite owning it, for suites reachable from the root.
    index: HashMap<String, NodeId>,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![TestNode {
                id: root,
                key: "root".to_string(),
                name: ROOT_NAME.to_string(),
                kind: NodeKind::Group,
                parent: None,
                children: Vec::new(),
            }],
            root,
            index: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TestNode> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TestNode, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn push(&mut self, key: String, name: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TestNode {
            id,
            key,
            name,
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// New detached group.
    pub fn create_group(&mut self, key: impl Into<String>, name: impl Into<String>) -> NodeId {
        self.push(key.into(), name.into(), NodeKind::Group)
    }

    /// New detached suite owning `case`.
    pub fn create_suite(&mut self, name: impl Into<String>, case: TestCase) -> NodeId {
        let key = format!("suite-{}", case.id);
        self.push(key, name.into(), NodeKind::Suite(case))
    }

    /// New detached leaf for the test `test_id` of `suite`.
    pub fn create_leaf(&mut self, suite: NodeId, test_id: &str) -> Result<NodeId, TreeError> {
        let case = self
            .node(suite)
            .ok_or(TreeError::UnknownNode(suite))?
            .test_case()
            .ok_or(TreeError::NotASuite(suite))?;
        let test = case
            .position(test_id)
            .and_then(|i| case.get(i))
            .ok_or_else(|| TreeError::UnknownTest(test_id.to_string()))?;
        let name = test.name.clone();

        Ok(self.push(
            test_id.to_string(),
            name,
            NodeKind::Leaf {
                suite,
                test_id: test_id.to_string(),
            },
        ))
    }

    /// Attach a detached node as the last child of a group.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_node = self.node(parent).ok_or(TreeError::UnknownNode(parent))?;
        if !parent_node.is_group() {
            return Err(TreeError::NotAGroup(parent));
        }
        let child_node = self.node(child).ok_or(TreeError::UnknownNode(child))?;
        if child == self.root || child_node.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::Cycle { parent, child });
        }

        if self.is_reachable(parent) {
            self.register_subtree(child)?;
        }

        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Detach `child` from `parent`. The subtree stays in the arena, unreachable.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let child_node = self.node(child).ok_or(TreeError::UnknownNode(child))?;
        if child_node.parent != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }

        if self.is_reachable(parent) {
            for suite in self.suites_in(child) {
                self.index.retain(|_, owner| *owner != suite);
            }
        }

        self.node_mut(parent)?.children.retain(|&c| c != child);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Drop every node except an empty root.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Names from the root down to `id`, inclusive.
    pub fn path(&self, id: NodeId) -> Vec<String> {
        let mut path: Vec<String> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|n| self.node(n).map(|node| node.name.clone()))
            .collect();
        path.reverse();
        path
    }

    /// Nodes reachable from `start`, depth-first pre-order.
    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Leaf nodes under `start`, in pre-order.
    pub fn leaves(&self, start: NodeId) -> Vec<NodeId> {
        self.preorder(start)
            .into_iter()
            .filter(|&id| matches!(self.node(id).map(|n| &n.kind), Some(NodeKind::Leaf { .. })))
            .collect()
    }

    /// Test behind a leaf node.
    pub fn leaf_test(&self, leaf: NodeId) -> Option<&Test> {
        match &self.node(leaf)?.kind {
            NodeKind::Leaf { suite, test_id } => self.test_in(*suite, test_id),
            _ => None,
        }
    }

    pub fn leaf_test_mut(&mut self, leaf: NodeId) -> Option<&mut Test> {
        let (suite, test_id) = self.leaf_target(leaf)?;
        self.test_at_mut(suite, &test_id)
    }

    /// Owning suite and test id behind a leaf node.
    pub fn leaf_target(&self, leaf: NodeId) -> Option<(NodeId, String)> {
        match &self.node(leaf)?.kind {
            NodeKind::Leaf { suite, test_id } => Some((*suite, test_id.clone())),
            _ => None,
        }
    }

    /// Mutable handles to several tests at once.
    pub fn tests_mut_at(&mut self, targets: &HashSet<(NodeId, String)>) -> Vec<&mut Test> {
        self.nodes
            .iter_mut()
            .filter_map(|node| {
                let id = node.id;
                match &mut node.kind {
                    NodeKind::Suite(case) => Some((id, case)),
                    _ => None,
                }
            })
            .flat_map(move |(suite, case)| {
                case.tests_mut()
                    .iter_mut()
                    .filter(move |t| targets.contains(&(suite, t.id.clone())))
            })
            .collect()
    }

    pub fn suite_mut(&mut self, id: NodeId) -> Option<&mut TestCase> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Suite(case) => Some(case),
            _ => None,
        }
    }

    /// Registered test by id.
    pub fn test(&self, id: &str) -> Option<&Test> {
        let suite = *self.index.get(id)?;
        self.test_in(suite, id)
    }

    pub fn test_mut(&mut self, id: &str) -> Option<&mut Test> {
        let suite = *self.index.get(id)?;
        self.test_at_mut(suite, id)
    }

    /// Every registered test, suites in pre-order, tests in case order.
    pub fn tests(&self) -> Vec<&Test> {
        self.suites_in(self.root)
            .into_iter()
            .filter_map(|id| self.node(id).and_then(TestNode::test_case))
            .flat_map(|case| case.tests().iter())
            .collect()
    }

    /// Number of distinct tests reachable from the root.
    pub fn test_count(&self) -> usize {
        self.index.len()
    }

    /// Back every reachable test to `Pending`.
    pub fn reset(&mut self) {
        for suite in self.suites_in(self.root) {
            if let Some(case) = self.suite_mut(suite) {
                case.reset();
            }
        }
    }

    fn test_in(&self, suite: NodeId, test_id: &str) -> Option<&Test> {
        let case = self.node(suite)?.test_case()?;
        case.get(case.position(test_id)?)
    }

    /// Test `test_id` owned by `suite`.
    pub fn test_at_mut(&mut self, suite: NodeId, test_id: &str) -> Option<&mut Test> {
        let case = self.suite_mut(suite)?;
        let index = case.position(test_id)?;
        case.get_mut(index)
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).and_then(|n| n.parent), move |&p| {
            self.node(p).and_then(|n| n.parent)
        })
    }

    fn is_reachable(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    fn suites_in(&self, start: NodeId) -> Vec<NodeId> {
        self.preorder(start)
            .into_iter()
            .filter(|&id| matches!(self.node(id).map(|n| &n.kind), Some(NodeKind::Suite(_))))
            .collect()
    }

    fn register_subtree(&mut self, start: NodeId) -> Result<(), TreeError> {
        let mut added = Vec::new();
        for suite in self.suites_in(start) {
            let Some(case) = self.node(suite).and_then(TestNode::test_case) else {
                continue;
            };
            for test in case.tests() {
                if self.index.contains_key(&test.id) || added.iter().any(|(id, _)| id == &test.id)
                {
                    return Err(TreeError::DuplicateTest(test.id.clone()));
                }
                added.push((test.id.clone(), suite));
            }
        }
        self.index.extend(added);
        Ok(())
    }
}
