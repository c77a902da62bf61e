//! Runnable tests and the hierarchy that holds them.
//!
//! - [`Test`] - one example with its pending/running/terminal state machine
//! - [`TestCase`] - the tests of one source unit
//! - [`TestTree`] - root group, one group per source unit, suites and leaves

mod case;
mod entity;
mod tree;

pub use case::TestCase;
pub use entity::{file_of_id, Test, TestError, TestResult, TestStatus};
pub use tree::{NodeId, NodeKind, TestNode, TestTree, TreeError, ROOT_NAME};

use std::collections::BTreeMap;

/// Results keyed by test id.
pub type ResultMap = BTreeMap<String, TestResult>;
